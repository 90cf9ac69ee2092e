//! The universal root value and its two dispatch disciplines.
//!
//! Every value optionally answers a class (object-model dispatch: literal
//! and primitive values) and/or a type (type-directed dispatch: types,
//! semantic nodes, closures). `perform_with_arguments` consults the type
//! first and falls back to the class, per spec.md §3/§4.4. `Value` is a
//! tagged sum of concrete variants with one open extension point
//! (`Instance`, for classes with no more specific representation) per the
//! design note in spec.md §9.

use std::{cell::RefCell, fmt::Write as _, rc::Rc};

use crate::{
    cst::Cst,
    diagnostics::Fault,
    intern::Symbol,
    intrinsics,
    numeric::Integer,
    object::{ClassObj, Instance, Method},
    semantic::Closure,
    source::SourcePosition,
    types::Type,
};

/// A mutable width-and-signedness-tagged primitive integer (`u8`, `i64`,
/// ...). Stored widened to `i128`; arithmetic truncates back per
/// `Integer::truncate_to_width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveInt {
    pub bits: u8,
    pub signed: bool,
    pub value: i128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTag {
    Stdin,
    Stdout,
    Stderr,
}

/// A functional value that expands itself at analysis time instead of
/// being called at evaluation time (spec.md §4.3/§9: "a capability bit on
/// functional values plus a distinct entry point
/// `applyMacroWithContextAndArguments`").
#[derive(Debug, Clone)]
pub struct MacroValue {
    pub name: Symbol,
    pub expand: MacroExpand,
}

/// A macro's expansion function: receives the call-site position and the
/// *unanalyzed* argument CST nodes, returns a CST fragment to re-analyze.
pub type MacroExpand = Rc<dyn Fn(&SourcePosition, &[Cst]) -> Result<Cst, Fault>>;

#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Boolean(bool),
    Void,
    Integer(Integer),
    Primitive(PrimitiveInt),
    Float(f64),
    Character(char),
    String(Rc<RefCell<String>>),
    Symbol(Symbol),
    Array(Rc<RefCell<Vec<Value>>>),
    ByteArray(Rc<RefCell<Vec<u8>>>),
    Tuple(Rc<Vec<Value>>),
    Association(Rc<(Value, Value)>),
    Dictionary(Rc<RefCell<Vec<(Value, Value)>>>),
    Class(Rc<ClassObj>),
    Instance(Rc<Instance>),
    Closure(Rc<Closure>),
    Macro(Rc<MacroValue>),
    /// A bound method value, e.g. as produced by `Behavior>>withSelector:addMethod:`'s
    /// `arguments[2]` (the corrected slot per spec.md §9's first Open Question).
    Method(Rc<Method>),
    Type(Type),
    ProductValue(Rc<crate::types::ProductTypeValue>),
    SumValue(Rc<crate::types::SumTypeValue>),
    /// A mutable value box, created by the evaluator's `alloca` node.
    MutableBox(Rc<RefCell<Value>>),
    Stream(StreamTag),
    /// Quoted/quasi-quoted code, produced by `Quote`/`QuasiQuote` evaluation.
    Syntax(Rc<Cst>),
}

impl Value {
    pub fn nil() -> Self {
        Self::Undefined
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Value::Boolean(true))
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Value::Boolean(false))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::String(Rc::new(RefCell::new(s.into())))
    }

    pub fn array(elements: Vec<Value>) -> Self {
        Self::Array(Rc::new(RefCell::new(elements)))
    }

    /// Object-model dispatch: the class of literal/primitive values.
    /// `None` for values whose dispatch is exclusively type-directed (a raw
    /// `Type`, a `Closure`, quoted `Syntax` — spec.md §3: "types, semantic
    /// nodes, and closures answer a type").
    pub fn get_class(&self) -> Option<Rc<ClassObj>> {
        let name = match self {
            Value::Undefined => "UndefinedObject",
            Value::Boolean(true) => "True",
            Value::Boolean(false) => "False",
            Value::Void => "Void",
            Value::Integer(_) => "Integer",
            Value::Primitive(p) => primitive_class_name(p.bits, p.signed),
            Value::Float(_) => "Float",
            Value::Character(_) => "Character",
            Value::String(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Array(_) => "Array",
            Value::ByteArray(_) => "ByteArray",
            Value::Tuple(_) => "Tuple",
            Value::Association(_) => "Association",
            Value::Dictionary(_) => "Dictionary",
            Value::Class(class) => return Some(intrinsics::class_of_class(class)),
            Value::Instance(instance) => return Some(instance.class.clone()),
            Value::Method(_) => "CompiledMethod",
            Value::Stream(_) => "Stdio",
            Value::Syntax(_) => "SyntaxNode",
            Value::Closure(_) | Value::Macro(_) | Value::Type(_) | Value::ProductValue(_) | Value::SumValue(_) | Value::MutableBox(_) => {
                return None;
            }
        };
        Some(intrinsics::class(name))
    }

    /// Type-directed dispatch: types, closures, and product/sum values
    /// answer their own type; everything else is untyped at runtime
    /// (`GradualType` is only assigned statically by the analyzer).
    pub fn get_type(&self) -> Option<Type> {
        match self {
            Value::Closure(closure) => Some(closure.declared_type.clone()),
            Value::Type(_) => Some(Type::Gradual),
            Value::ProductValue(p) => Some(Type::Product(p.ty.clone())),
            Value::SumValue(s) => Some(Type::Sum(s.ty.clone())),
            _ => None,
        }
    }

    pub fn get_class_or_type(&self) -> Option<ClassOrType> {
        if let Some(ty) = self.get_type() {
            return Some(ClassOrType::Type(ty));
        }
        self.get_class().map(ClassOrType::Class)
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, Value::Macro(_))
    }

    /// `performWithArguments`: consult the type first, then the class,
    /// per spec.md §3/§4.4.
    pub fn perform_with_arguments(&self, selector: Symbol, arguments: &[Value], position: &SourcePosition) -> Result<Value, Fault> {
        if let Some(ty) = self.get_type() {
            if let Some(dict) = ty.method_dict() {
                if let Some(method) = dict.borrow().get(selector) {
                    return invoke_method(method, self, arguments, position);
                }
            }
        }
        if let Some(class) = self.get_class() {
            if let Some(method) = class.lookup_selector(selector) {
                let mut all = Vec::with_capacity(1 + arguments.len());
                all.push(self.clone());
                all.extend_from_slice(arguments);
                return invoke_method(&method, self, &all[1..], position);
            }
            return Err(Fault::dispatch(
                position.clone(),
                format!("Failed to find method {} in {}", selector, class.print_string()),
            ));
        }
        Err(Fault::dispatch(position.clone(), format!("Failed to find method {selector} in a value with no class")))
    }

    pub fn print_string(&self) -> String {
        match self {
            Value::Undefined => "nil".to_owned(),
            Value::Boolean(b) => b.to_string(),
            Value::Void => "void".to_owned(),
            Value::Integer(i) => i.to_string(),
            Value::Primitive(p) => p.value.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Character(c) => format!("'{c}'"),
            Value::String(s) => format!("{:?}", s.borrow()),
            Value::Symbol(s) => format!("#{s}"),
            Value::Array(xs) => {
                let mut out = "(".to_owned();
                for (i, x) in xs.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    out.push_str(&x.print_string());
                }
                out.push(')');
                out
            }
            Value::ByteArray(xs) => {
                let mut out = "#[".to_owned();
                for (i, b) in xs.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    write!(out, "{b}").unwrap();
                }
                out.push(']');
                out
            }
            Value::Tuple(xs) => {
                let mut out = "(".to_owned();
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&x.print_string());
                }
                out.push(')');
                out
            }
            Value::Association(pair) => format!("{} -> {}", pair.0.print_string(), pair.1.print_string()),
            Value::Dictionary(entries) => {
                let mut out = "{".to_owned();
                for (i, (k, v)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write!(out, "{} -> {}", k.print_string(), v.print_string()).unwrap();
                }
                out.push('}');
                out
            }
            Value::Class(class) => class.print_string(),
            Value::Instance(instance) => format!("a {}", instance.class.name),
            Value::Closure(_) => "a Closure".to_owned(),
            Value::Macro(m) => format!("a Macro({})", m.name),
            Value::Method(_) => "a CompiledMethod".to_owned(),
            Value::Type(ty) => ty.name(),
            Value::ProductValue(p) => {
                let mut out = "(".to_owned();
                for (i, e) in p.elements.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&e.print_string());
                }
                out.push(')');
                out
            }
            Value::SumValue(s) => s.element.print_string(),
            Value::MutableBox(b) => format!("a MutableBox({})", b.borrow().print_string()),
            Value::Stream(tag) => format!("{tag:?}").to_lowercase(),
            Value::Syntax(cst) => cst.pretty_print(),
        }
    }

    /// Structural/identity equality used by `=`/`==` primitives. Symbols,
    /// booleans, characters, and numbers compare by value (content);
    /// everything heap-shaped compares by identity, matching Smalltalk
    /// `==` semantics for non-literal objects.
    pub fn identical_to(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Void, Value::Void) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Primitive(a), Value::Primitive(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Character(a), Value::Character(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::ByteArray(a), Value::ByteArray(b)) => Rc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (Value::Dictionary(a), Value::Dictionary(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::MutableBox(a), Value::MutableBox(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn identity_hash(&self) -> u64 {
        match self {
            Value::Class(c) => c.identity_hash,
            Value::Instance(i) => i.identity_hash,
            Value::Integer(i) => {
                let mut acc: u64 = 0xcbf29ce484222325;
                for byte in i.to_string().bytes() {
                    acc = (acc ^ u64::from(byte)).wrapping_mul(0x100000001b3);
                }
                acc
            }
            Value::Symbol(s) => s.to_string().bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b))),
            _ => 0,
        }
    }
}

fn invoke_method(method: &Method, receiver: &Value, arguments: &[Value], position: &SourcePosition) -> Result<Value, Fault> {
    match method {
        Method::Primitive { implementation, .. } => {
            let mut all = Vec::with_capacity(1 + arguments.len());
            all.push(receiver.clone());
            all.extend_from_slice(arguments);
            implementation(&all, position)
        }
        Method::Closure(closure_value) => {
            let mut all = Vec::with_capacity(1 + arguments.len());
            all.push(receiver.clone());
            all.extend_from_slice(arguments);
            crate::eval::apply_with_arguments(closure_value, &all, position)
        }
    }
}

pub enum ClassOrType {
    Class(Rc<ClassObj>),
    Type(Type),
}

fn primitive_class_name(bits: u8, signed: bool) -> &'static str {
    match (bits, signed) {
        (8, true) => "Int8",
        (8, false) => "UInt8",
        (16, true) => "Int16",
        (16, false) => "UInt16",
        (32, true) => "Int32",
        (32, false) => "UInt32",
        (64, true) => "Int64",
        (64, false) => "UInt64",
        _ => "Integer",
    }
}

fn format_float(value: f64) -> String {
    if value == value.trunc() && value.is_finite() {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_prints_as_nil_and_is_nil() {
        assert_eq!(Value::nil().print_string(), "nil");
        assert!(Value::nil().is_nil());
    }

    #[test]
    fn symbols_are_identical_by_content() {
        assert!(Value::Symbol(Symbol::intern("foo")).identical_to(&Value::Symbol(Symbol::intern("foo"))));
    }

    #[test]
    fn arrays_are_identical_only_by_identity() {
        let a = Value::array(vec![Value::Integer(Integer::from_i64(1))]);
        let b = Value::array(vec![Value::Integer(Integer::from_i64(1))]);
        assert!(!a.identical_to(&b));
        assert!(a.identical_to(&a.clone()));
    }
}
