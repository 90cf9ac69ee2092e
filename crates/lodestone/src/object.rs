//! Classes, metaclasses, method dictionaries, and message dispatch by class.
//!
//! Spec.md §3: "a class has a name, an optional superclass (which may be
//! `UndefinedObject` to terminate the lattice), a method dictionary (symbol
//! -> method), and a factory for `basicNew`. Each class has exactly one
//! metaclass whose instance is the class; metaclasses form a parallel
//! lattice." We represent both classes and metaclasses with the same
//! [`ClassObj`] struct (a metaclass is simply a `ClassObj` whose `kind` is
//! `Metaclass` and whose `this_class` weakly back-references the class it is
//! the metaclass of) — grounded in the design note in spec.md §9: "keep
//! strong ownership from the class to the metaclass and a weak back-pointer
//! from metaclass to class."

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
    sync::atomic::{AtomicU64, Ordering},
};

use indexmap::IndexMap;

use crate::{intern::Symbol, source::SourcePosition, value::Value};

static NEXT_IDENTITY_HASH: AtomicU64 = AtomicU64::new(1);

/// Assigns a fresh process-wide identity hash, used by `ProtoObject>>identityHash`
/// and by class/metaclass allocation during bootstrap.
pub fn next_identity_hash() -> u64 {
    NEXT_IDENTITY_HASH.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Ordinary,
    Metaclass,
}

/// A primitive method's already-evaluated-argument implementation. Argument
/// 0 is always the receiver, matching spec.md §4.5: "The closure receives a
/// vector of already-evaluated arguments (argument 0 is the receiver)".
pub type PrimitiveFn = Rc<dyn Fn(&[Value], &SourcePosition) -> Result<Value, crate::diagnostics::Fault>>;

#[derive(Clone)]
pub enum Method {
    Primitive { selector: Symbol, implementation: PrimitiveFn },
    Closure(Value),
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primitive { selector, .. } => write!(f, "Method::Primitive({selector})"),
            Self::Closure(_) => write!(f, "Method::Closure"),
        }
    }
}

/// Symbol-keyed method table. `IndexMap` keeps insertion order, matching how
/// the original bootstrap registers primitives in a fixed, readable order
/// and how `Behavior>>withSelector:addMethod:` appends new entries.
#[derive(Debug, Default)]
pub struct MethodDict(IndexMap<Symbol, Method>);

impl MethodDict {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn insert(&mut self, selector: Symbol, method: Method) {
        self.0.insert(selector, method);
    }

    pub fn get(&self, selector: Symbol) -> Option<&Method> {
        self.0.get(&selector)
    }
}

/// A class or a metaclass. See module docs for why both share this struct.
pub struct ClassObj {
    pub name: Symbol,
    pub superclass: RefCell<Option<Rc<ClassObj>>>,
    /// The class of this class/metaclass: for an ordinary class, its
    /// metaclass; for a metaclass, the `Metaclass` class itself (the
    /// bootstrap invariant "every metaclass's class pointer is `Metaclass`"
    /// makes `Metaclass class`'s own `class_pointer` point back to
    /// `Metaclass`, not to itself).
    pub class_pointer: RefCell<Option<Rc<ClassObj>>>,
    pub method_dict: RefCell<MethodDict>,
    /// Weak: subclasses don't own their superclass's bookkeeping entry for
    /// them (the strong edge already runs subclass -> superclass).
    pub subclasses: RefCell<Vec<Weak<ClassObj>>>,
    /// Set only when `kind == Metaclass`: the weak back-reference to the
    /// class this is the metaclass of.
    pub this_class: RefCell<Option<Weak<ClassObj>>>,
    pub kind: ClassKind,
    /// Instance slot count ("format" in spec.md §3/§4.5).
    pub format: usize,
    pub identity_hash: u64,
}

impl ClassObj {
    pub fn new_ordinary(name: Symbol, format: usize) -> Rc<Self> {
        Rc::new(Self {
            name,
            superclass: RefCell::new(None),
            class_pointer: RefCell::new(None),
            method_dict: RefCell::new(MethodDict::new()),
            subclasses: RefCell::new(Vec::new()),
            this_class: RefCell::new(None),
            kind: ClassKind::Ordinary,
            format,
            identity_hash: next_identity_hash(),
        })
    }

    pub fn new_metaclass(name: Symbol) -> Rc<Self> {
        Rc::new(Self {
            name,
            superclass: RefCell::new(None),
            class_pointer: RefCell::new(None),
            method_dict: RefCell::new(MethodDict::new()),
            subclasses: RefCell::new(Vec::new()),
            this_class: RefCell::new(None),
            kind: ClassKind::Metaclass,
            format: 0,
            identity_hash: next_identity_hash(),
        })
    }

    /// `registerInSuperclass`: appends `self` to `superclass`'s `subclasses`
    /// list. Spec.md §4.5 bootstrap step 4.
    pub fn register_in_superclass(self: &Rc<Self>, superclass: &Rc<ClassObj>) {
        superclass.subclasses.borrow_mut().push(Rc::downgrade(self));
    }

    pub fn set_superclass(&self, superclass: Option<Rc<ClassObj>>) {
        *self.superclass.borrow_mut() = superclass;
    }

    pub fn set_class_pointer(&self, class_pointer: Rc<ClassObj>) {
        *self.class_pointer.borrow_mut() = Some(class_pointer);
    }

    /// Walks `superclass` from `self`, looking up `selector` in each class's
    /// method dictionary in turn (spec.md §4.4 dispatch step 2).
    pub fn lookup_selector(self: &Rc<Self>, selector: Symbol) -> Option<Method> {
        let mut current = self.clone();
        loop {
            if let Some(method) = current.method_dict.borrow().get(selector) {
                return Some(method.clone());
            }
            let next = current.superclass.borrow().clone();
            match next {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// Live (non-dropped) subclasses, consistent with the `superclass`
    /// pointer each holds (spec.md §8 law 6).
    pub fn subclasses(&self) -> Vec<Rc<ClassObj>> {
        self.subclasses.borrow().iter().filter_map(Weak::upgrade).collect()
    }

    /// Depth of the `superclass` chain to `UndefinedObject` (represented as
    /// `None`), used by the law-6 test.
    pub fn superclass_chain_depth(self: &Rc<Self>) -> usize {
        let mut depth = 0;
        let mut current = self.clone();
        loop {
            match current.superclass.borrow().clone() {
                Some(parent) => {
                    depth += 1;
                    current = parent;
                }
                None => return depth,
            }
        }
    }

    pub fn is_subclass_of(self: &Rc<Self>, other: &Rc<ClassObj>) -> bool {
        let mut current = Some(self.clone());
        while let Some(c) = current {
            if Rc::ptr_eq(&c, other) {
                return true;
            }
            current = c.superclass.borrow().clone();
        }
        false
    }

    /// Resolves the class this metaclass is the metaclass of, falling back
    /// to `None` when the weak back-reference has been dropped (spec.md
    /// §9: "Printing resolves the weak pointer and falls back to 'a
    /// Metaclass'.").
    pub fn resolved_this_class(&self) -> Option<Rc<ClassObj>> {
        self.this_class.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn print_string(&self) -> String {
        match self.kind {
            ClassKind::Ordinary => self.name.to_string(),
            ClassKind::Metaclass => match self.resolved_this_class() {
                Some(class) => format!("{} class", class.name),
                None => "a Metaclass".to_owned(),
            },
        }
    }
}

impl std::fmt::Debug for ClassObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassObj").field("name", &self.name).field("kind", &self.kind).finish()
    }
}

/// A plain instance of a user/bootstrap-defined class with no more specific
/// `Value` representation: a class pointer plus `format` indexed slots
/// (spec.md §3: "format (instance size)").
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<ClassObj>,
    pub slots: RefCell<Vec<Value>>,
    pub identity_hash: u64,
}

impl Instance {
    pub fn new(class: Rc<ClassObj>) -> Rc<Self> {
        let format = class.format;
        Rc::new(Self { class, slots: RefCell::new(vec![Value::Undefined; format]), identity_hash: next_identity_hash() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_selector_walks_superclass_chain() {
        let root = ClassObj::new_ordinary(Symbol::intern("Root"), 0);
        let child = ClassObj::new_ordinary(Symbol::intern("Child"), 0);
        child.set_superclass(Some(root.clone()));
        root.method_dict.borrow_mut().insert(
            Symbol::intern("foo"),
            Method::Primitive { selector: Symbol::intern("foo"), implementation: Rc::new(|_, _| Ok(Value::Undefined)) },
        );
        assert!(child.lookup_selector(Symbol::intern("foo")).is_some());
        assert!(child.lookup_selector(Symbol::intern("bar")).is_none());
    }

    #[test]
    fn subclasses_list_is_consistent_with_superclass() {
        let root = ClassObj::new_ordinary(Symbol::intern("Root2"), 0);
        let child = ClassObj::new_ordinary(Symbol::intern("Child2"), 0);
        child.set_superclass(Some(root.clone()));
        child.register_in_superclass(&root);
        let subs = root.subclasses();
        assert_eq!(subs.len(), 1);
        assert!(Rc::ptr_eq(&subs[0], &child));
    }

    #[test]
    fn metaclass_print_falls_back_when_class_dropped() {
        let meta = ClassObj::new_metaclass(Symbol::intern("Metaclass"));
        assert_eq!(meta.print_string(), "a Metaclass");
    }
}
