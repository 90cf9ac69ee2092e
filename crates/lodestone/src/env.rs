//! Environments and bindings (analysis time) plus runtime frames
//! (evaluation time).
//!
//! Spec.md §3 Lifecycles distinguishes the two: "intrinsics environment is
//! built once at process start; modules and lexical frames are created per
//! compilation unit / per nested block and released when their containing
//! analysis completes" (analysis-time [`Env`]) versus "argument frames are
//! created per call" (evaluation-time [`Frame`]). The semantic tree produced
//! by the analyzer is fully resolved, so the evaluator never needs `Env` —
//! only `Frame`, which closures capture by shared reference (spec.md §3:
//! "Closures capture their defining environment by shared reference").

use std::rc::Rc;

use ahash::AHashMap;
use std::cell::RefCell;

use crate::{cst::Cst, intern::Symbol, source::SourcePosition, types::Type, value::Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    Empty,
    Intrinsics,
    Module,
    Namespace,
    Lexical,
}

/// A symbol's binding, as spec.md §3 names them, plus `Local` — the one
/// addition this implementation needs to realize the evaluator's explicit
/// alloca/load/store semantics (§4.4) for `|x|`-style pattern-bound locals;
/// see DESIGN.md for the full rationale.
#[derive(Debug, Clone)]
pub enum Binding {
    /// A constant binding: lookup inlines the stored value as a literal.
    Value(Value),
    /// A parameter: lookup yields a plain (un-boxed) identifier reference
    /// typed `ty`.
    Argument { ty: Type, position: SourcePosition },
    /// A self-reference in scope for a recursive definition's body; its
    /// type is obtained by analyzing `type_expression` in the *enclosing*
    /// environment at the point of lookup.
    Fixpoint { type_expression: Rc<Cst> },
    /// A pattern-bound local (`|x|`): lookup yields an identifier reference
    /// automatically wrapped in `Load`, since the runtime value behind the
    /// name is a mutable box.
    Local { ty: Type, position: SourcePosition },
}

/// One frame of the analysis-time environment chain.
#[derive(Debug)]
pub struct Env {
    pub kind: EnvKind,
    pub parent: Option<Rc<Env>>,
    bindings: RefCell<AHashMap<Symbol, Binding>>,
}

impl Env {
    pub fn root() -> Rc<Self> {
        Rc::new(Self { kind: EnvKind::Empty, parent: None, bindings: RefCell::new(AHashMap::new()) })
    }

    pub fn child(self: &Rc<Self>, kind: EnvKind) -> Rc<Self> {
        Rc::new(Self { kind, parent: Some(self.clone()), bindings: RefCell::new(AHashMap::new()) })
    }

    pub fn define(&self, name: Symbol, binding: Binding) {
        self.bindings.borrow_mut().insert(name, binding);
    }

    /// Local-then-parent lookup (spec.md §3: "lookup is local-then-parent").
    pub fn lookup(self: &Rc<Self>, name: Symbol) -> Option<Binding> {
        let mut current = self.clone();
        loop {
            if let Some(binding) = current.bindings.borrow().get(&name) {
                return Some(binding.clone());
            }
            match current.parent.clone() {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    pub fn intrinsics_ancestor(self: &Rc<Self>) -> Rc<Self> {
        let mut current = self.clone();
        loop {
            if current.kind == EnvKind::Intrinsics {
                return current;
            }
            match current.parent.clone() {
                Some(parent) => current = parent,
                None => crate::bug!("no Intrinsics frame found in environment chain"),
            }
        }
    }
}

/// One frame of the evaluation-time runtime chain: name -> current value.
/// Created per call (arguments) and per lexical block entry (locals);
/// closures hold their defining frame by shared reference.
#[derive(Debug)]
pub struct Frame {
    pub parent: Option<Rc<Frame>>,
    values: RefCell<AHashMap<Symbol, Value>>,
}

impl Frame {
    pub fn root() -> Rc<Self> {
        Rc::new(Self { parent: None, values: RefCell::new(AHashMap::new()) })
    }

    pub fn child(parent: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self { parent: Some(parent.clone()), values: RefCell::new(AHashMap::new()) })
    }

    pub fn define(&self, name: Symbol, value: Value) {
        self.values.borrow_mut().insert(name, value);
    }

    pub fn get(self: &Rc<Self>, name: Symbol) -> Option<Value> {
        let mut current = self.clone();
        loop {
            if let Some(value) = current.values.borrow().get(&name) {
                return Some(value.clone());
            }
            match current.parent.clone() {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// Overwrites an already-defined binding in whichever frame owns it.
    /// Returns `false` if `name` is unbound anywhere in the chain.
    pub fn set(self: &Rc<Self>, name: Symbol, value: Value) -> bool {
        let mut current = self.clone();
        loop {
            if current.values.borrow().contains_key(&name) {
                current.values.borrow_mut().insert(name, value);
                return true;
            }
            match current.parent.clone() {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_local_then_parent() {
        let root = Env::root();
        root.define(Symbol::intern("x"), Binding::Value(Value::nil()));
        let child = root.child(EnvKind::Lexical);
        assert!(matches!(child.lookup(Symbol::intern("x")), Some(Binding::Value(_))));
        assert!(child.lookup(Symbol::intern("missing")).is_none());
    }

    #[test]
    fn frame_set_finds_the_owning_frame_in_the_chain() {
        let root = Frame::root();
        root.define(Symbol::intern("y"), Value::Integer(crate::numeric::Integer::from_i64(1)));
        let child = Frame::child(&root);
        assert!(child.set(Symbol::intern("y"), Value::Integer(crate::numeric::Integer::from_i64(2))));
        assert_eq!(root.get(Symbol::intern("y")).unwrap().print_string(), "2");
    }
}
