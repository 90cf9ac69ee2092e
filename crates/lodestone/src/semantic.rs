//! The semantic tree: the analyzer's output, directly executable by the
//! evaluator. Every node carries a [`Type`] (set to `Type::Gradual` when
//! nothing better is known, per spec.md §4.3) and a [`SourcePosition`].

use std::rc::Rc;

use crate::{env::Frame, intern::Symbol, source::SourcePosition, types::Type, value::Value};

#[derive(Debug)]
pub struct Semantic {
    pub position: SourcePosition,
    pub ty: Type,
    pub kind: SemanticKind,
}

#[derive(Debug)]
pub enum SemanticKind {
    Literal(Value),
    /// Resolves `binding` by name in the active environment at evaluation
    /// time (argument/fixpoint bindings — value bindings are inlined as
    /// `Literal` by the analyzer instead, per spec.md §4.3).
    IdentifierReference(Symbol),
    Sequence(Vec<Rc<Semantic>>),
    Application { functional: Rc<Semantic>, arguments: Vec<Rc<Semantic>> },
    MessageSend { receiver: Option<Rc<Semantic>>, selector: Rc<Semantic>, arguments: Vec<Rc<Semantic>> },
    If { returns_value: bool, condition: Rc<Semantic>, true_case: Option<Rc<Semantic>>, false_case: Option<Rc<Semantic>> },
    While { condition: Rc<Semantic>, body: Rc<Semantic>, continue_action: Option<Rc<Semantic>> },
    /// `name` is the frame slot the box is installed under, when this alloca
    /// declares a named local (a pattern-binding or a cascade's hidden
    /// receiver temp) rather than an anonymous one.
    Alloca { name: Option<Symbol>, value_type: Type, initial_value: Option<Rc<Semantic>> },
    Load(Rc<Semantic>),
    Store { target: Rc<Semantic>, value: Rc<Semantic> },
    Lambda(Rc<LambdaDef>),
    Pi(Rc<PiDef>),
    SimpleFunctionType { argument_types: Vec<Rc<Semantic>>, argument_names: Vec<Option<Symbol>>, result_type: Rc<Semantic> },
    Array(Vec<Rc<Semantic>>),
    Tuple(Vec<Rc<Semantic>>),
    ByteArray(Vec<Rc<Semantic>>),
    /// Not named among spec.md §3's semantic-node list, but required to
    /// elaborate the `Dictionary`/`Association` CST shapes that §3's data
    /// model does name; see DESIGN.md.
    Association(Rc<Semantic>, Rc<Semantic>),
    Dictionary(Vec<(Rc<Semantic>, Rc<Semantic>)>),
}

#[derive(Debug)]
pub struct LambdaArgument {
    pub name: Option<Symbol>,
    pub declared_type: Type,
    /// `:mutable x` block arguments are boxed on entry so the body can
    /// reassign them; the analyzer binds these as `Binding::Local` instead
    /// of `Binding::Argument` (see DESIGN.md).
    pub is_mutable: bool,
}

#[derive(Debug)]
pub struct LambdaDef {
    pub name: Option<Symbol>,
    pub arguments: Vec<LambdaArgument>,
    pub body: Rc<Semantic>,
    pub result_type: Type,
    pub is_macro: bool,
}

#[derive(Debug)]
pub struct PiDef {
    pub name: Option<Symbol>,
    pub arguments: Vec<(Option<Symbol>, Rc<Semantic>)>,
    pub result_type: Option<Rc<Semantic>>,
}

/// A closure: a lambda materialized over its defining runtime frame.
/// Argument frames are created per call and discarded on return; the
/// closure itself holds its defining frame by shared reference (spec.md §3
/// Lifecycles: "closures capture their defining environment by shared
/// reference"). The semantic tree is already fully resolved by the
/// analyzer, so this is the *runtime* chain, not the analysis-time `Env`.
#[derive(Debug)]
pub struct Closure {
    pub def: Rc<LambdaDef>,
    pub defining_frame: Rc<Frame>,
    pub declared_type: Type,
}

impl Closure {
    pub fn is_macro(&self) -> bool {
        self.def.is_macro
    }
}

impl Semantic {
    pub fn new(position: SourcePosition, ty: Type, kind: SemanticKind) -> Rc<Self> {
        Rc::new(Self { position, ty, kind })
    }

    pub fn literal(position: SourcePosition, value: Value) -> Rc<Self> {
        Self::new(position, Type::Gradual, SemanticKind::Literal(value))
    }
}
