//! The type universe: analysis-time-only types used by the semantic analyzer
//! for gradual coercion checks and by the evaluator as one of the two
//! dispatch disciplines (type-directed, for types/semantic values/closures).
//!
//! `GradualType`, `UnitType`, `BottomType`, `VoidType` are singletons.
//! `ProductType`/`SumType` are hash-consed on their element-type vector so
//! structural equality reduces to pointer equality (spec.md §8 law 8).
//! `PiType` is the dependent function type; it reduces to a
//! `SimpleFunctionType` once its argument and result type expressions are
//! themselves already-reduced type values (spec.md §4.6).

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{intern::Symbol, object::MethodDict, semantic::Semantic};

/// A type value. Types are values in their own right (`Value::Type`) and
/// additionally carry a method dictionary used for type-directed dispatch
/// (spec.md §4.4/§9: "types use a single method dictionary keyed by
/// selector").
#[derive(Debug, Clone)]
pub enum Type {
    Gradual,
    Unit,
    Bottom,
    Void,
    Product(Rc<ProductType>),
    Sum(Rc<SumType>),
    Pi(Rc<PiType>),
    SimpleFunction(Rc<SimpleFunctionType>),
}

impl Type {
    pub fn name(&self) -> String {
        match self {
            Self::Gradual => "?".to_owned(),
            Self::Unit => "Unit".to_owned(),
            Self::Bottom => "Bottom".to_owned(),
            Self::Void => "Void".to_owned(),
            Self::Product(p) => format!("({})", p.elements.iter().map(Type::name).collect::<Vec<_>>().join(", ")),
            Self::Sum(s) => format!("({})", s.elements.iter().map(Type::name).collect::<Vec<_>>().join(" | ")),
            Self::Pi(p) => p.describe(),
            Self::SimpleFunction(f) => f.describe(),
        }
    }

    /// A value of any type coerces to/from `GradualType`; otherwise equal
    /// types are trivially satisfied.
    pub fn is_satisfied_by(&self, source: &Type) -> bool {
        matches!(self, Type::Gradual) || matches!(source, Type::Gradual) || self.structurally_equal(source)
    }

    fn structurally_equal(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Gradual, Type::Gradual)
            | (Type::Unit, Type::Unit)
            | (Type::Bottom, Type::Bottom)
            | (Type::Void, Type::Void) => true,
            (Type::Product(a), Type::Product(b)) => Rc::ptr_eq(a, b),
            (Type::Sum(a), Type::Sum(b)) => Rc::ptr_eq(a, b),
            (Type::SimpleFunction(a), Type::SimpleFunction(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn method_dict(&self) -> Option<&RefCell<MethodDict>> {
        match self {
            Type::Product(p) => Some(&p.method_dict),
            Type::Sum(s) => Some(&s.method_dict),
            Type::SimpleFunction(f) => Some(&f.method_dict),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ProductType {
    pub elements: Vec<Type>,
    pub method_dict: RefCell<MethodDict>,
}

#[derive(Debug)]
pub struct SumType {
    pub elements: Vec<Type>,
    pub method_dict: RefCell<MethodDict>,
}

/// A value inhabiting a `ProductType`: an ordered tuple of elements whose
/// types match the product's element types positionally.
#[derive(Debug, Clone)]
pub struct ProductTypeValue {
    pub ty: Rc<ProductType>,
    pub elements: Vec<crate::value::Value>,
}

/// A value inhabiting a `SumType`: one tagged case plus its payload.
#[derive(Debug, Clone)]
pub struct SumTypeValue {
    pub ty: Rc<SumType>,
    pub case_index: usize,
    pub element: Box<crate::value::Value>,
}

/// An argument binding inside a Π-type signature: a name plus its declared
/// type expression (kept as a semantic node since it may depend on earlier
/// arguments — dependent typing).
#[derive(Debug, Clone)]
pub struct PiArgument {
    pub name: Option<Symbol>,
    pub type_expression: Rc<Semantic>,
}

/// The dependent function type. Stores an optional name expression (for
/// named/recursive function definitions) and an ordered argument list plus
/// a result-type expression, all as un-evaluated semantic nodes — evaluating
/// them happens lazily, only when the Π is materialized.
#[derive(Debug)]
pub struct PiType {
    pub name: Option<Symbol>,
    pub arguments: Vec<PiArgument>,
    pub result_type: Option<Rc<Semantic>>,
    pub method_dict: RefCell<MethodDict>,
}

impl PiType {
    fn describe(&self) -> String {
        let args = self
            .arguments
            .iter()
            .map(|a| a.name.map(|n| n.to_string()).unwrap_or_else(|| "_".to_owned()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("({args}) -> ?")
    }

    /// Picks the last binding for variadic positions: an application with
    /// more arguments than declared bindings reuses the final binding's type
    /// for every extra positional argument (spec.md §4.6).
    pub fn argument_at(&self, index: usize) -> Option<&PiArgument> {
        if self.arguments.is_empty() {
            return None;
        }
        self.arguments.get(index).or_else(|| self.arguments.last())
    }
}

/// The reduced form of a Π-type whose argument types are themselves already
/// type values (no further dependency): parallel vectors of argument types
/// and argument names, plus a result type.
#[derive(Debug)]
pub struct SimpleFunctionType {
    pub argument_types: Vec<Type>,
    pub argument_names: Vec<Option<Symbol>>,
    pub result_type: Type,
    pub method_dict: RefCell<MethodDict>,
}

impl SimpleFunctionType {
    fn describe(&self) -> String {
        let args = self.argument_types.iter().map(Type::name).collect::<Vec<_>>().join(", ");
        format!("({args}) -> {}", self.result_type.name())
    }

    pub fn argument_type_at(&self, index: usize) -> &Type {
        if self.argument_types.is_empty() {
            return &Type::Gradual;
        }
        self.argument_types.get(index).unwrap_or_else(|| self.argument_types.last().unwrap())
    }
}

/// Hash-consing tables for product/sum types, keyed by their element-type
/// vector so that `ProductType(ts) is ProductType(ts)` whenever the element
/// sequences are element-wise equal (spec.md §8 law 8). Process-wide,
/// append-only, lazily initialized — same posture as the symbol intern
/// table in `intern.rs`.
#[derive(Default)]
pub struct TypeUniverse {
    products: HashMap<Vec<TypeKey>, Rc<ProductType>>,
    sums: HashMap<Vec<TypeKey>, Rc<SumType>>,
}

/// A hashable/comparable key standing in for a `Type`, used only for
/// hash-consing lookups (method dictionaries are interior-mutable and would
/// break `Hash`/`Eq` if the `Type` itself were used as a key).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TypeKey {
    Gradual,
    Unit,
    Bottom,
    Void,
    Product(usize),
    Sum(usize),
    SimpleFunction(usize),
    Pi(usize),
}

fn type_key(ty: &Type) -> TypeKey {
    match ty {
        Type::Gradual => TypeKey::Gradual,
        Type::Unit => TypeKey::Unit,
        Type::Bottom => TypeKey::Bottom,
        Type::Void => TypeKey::Void,
        Type::Product(p) => TypeKey::Product(Rc::as_ptr(p) as usize),
        Type::Sum(s) => TypeKey::Sum(Rc::as_ptr(s) as usize),
        Type::SimpleFunction(f) => TypeKey::SimpleFunction(Rc::as_ptr(f) as usize),
        Type::Pi(p) => TypeKey::Pi(Rc::as_ptr(p) as usize),
    }
}

thread_local! {
    static UNIVERSE: RefCell<TypeUniverse> = RefCell::new(TypeUniverse::new());
}

/// Process-wide hash-consing entry point for the analyzer, mirroring the
/// symbol intern table's thread-local-singleton posture (`intern.rs`).
pub fn product_type(elements: Vec<Type>) -> Rc<ProductType> {
    UNIVERSE.with(|u| u.borrow_mut().product(elements))
}

pub fn sum_type(elements: Vec<Type>) -> Rc<SumType> {
    UNIVERSE.with(|u| u.borrow_mut().sum(elements))
}

impl TypeUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product(&mut self, elements: Vec<Type>) -> Rc<ProductType> {
        let key: Vec<TypeKey> = elements.iter().map(type_key).collect();
        if let Some(existing) = self.products.get(&key) {
            return existing.clone();
        }
        let created = Rc::new(ProductType { elements, method_dict: RefCell::new(MethodDict::new()) });
        self.products.insert(key, created.clone());
        created
    }

    pub fn sum(&mut self, elements: Vec<Type>) -> Rc<SumType> {
        let key: Vec<TypeKey> = elements.iter().map(type_key).collect();
        if let Some(existing) = self.sums.get(&key) {
            return existing.clone();
        }
        let created = Rc::new(SumType { elements, method_dict: RefCell::new(MethodDict::new()) });
        self.sums.insert(key, created.clone());
        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products_with_equal_element_sequences_are_hash_consed() {
        let mut universe = TypeUniverse::new();
        let a = universe.product(vec![Type::Unit, Type::Void]);
        let b = universe.product(vec![Type::Unit, Type::Void]);
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn products_with_different_elements_are_distinct() {
        let mut universe = TypeUniverse::new();
        let a = universe.product(vec![Type::Unit]);
        let b = universe.product(vec![Type::Void]);
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn gradual_type_satisfies_and_is_satisfied_by_anything() {
        assert!(Type::Gradual.is_satisfied_by(&Type::Unit));
        assert!(Type::Unit.is_satisfied_by(&Type::Gradual));
    }
}
