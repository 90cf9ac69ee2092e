//! The intrinsics bootstrap: wires the initial class lattice, primitive
//! methods, and the root analysis/evaluation environment.
//!
//! Bootstrap order follows spec.md §4.5 verbatim:
//! 1. Create all (Class, Metaclass) pairs from a declarative list.
//! 2. Link superclasses from the same list.
//! 3. Set every metaclass's class pointer to `Metaclass`.
//! 4. `registerInSuperclass` so each class appears in its superclass's
//!    `subclasses`.
//! 5. Short-circuit: `ProtoObject.superclass := UndefinedObject`,
//!    `Metaclass(ProtoObject).superclass := Class`.
//! 6. Bind names in the intrinsics environment.

use std::rc::Rc;

use crate::{
    diagnostics::Fault,
    env::{Binding, Env, EnvKind},
    intern::Symbol,
    numeric::Integer,
    object::{ClassObj, Method, MethodDict},
    source::SourcePosition,
    types::Type,
    value::{PrimitiveInt, StreamTag, Value},
};

/// `(name, superclass, format)`. Superclass is resolved in a second pass, so
/// order here is declaration order, not lattice order (spec.md §4.5 step
/// 1/2 are deliberately separate steps).
const CLASSES: &[(&str, Option<&str>, usize)] = &[
    ("ProtoObject", None, 0),
    ("UndefinedObject", None, 0),
    ("Object", Some("ProtoObject"), 0),
    ("Behavior", Some("Object"), 0),
    ("ClassDescription", Some("Behavior"), 0),
    ("Class", Some("ClassDescription"), 0),
    ("Metaclass", Some("ClassDescription"), 0),
    ("Boolean", Some("Object"), 0),
    ("True", Some("Boolean"), 0),
    ("False", Some("Boolean"), 0),
    ("Void", Some("Object"), 0),
    ("Magnitude", Some("Object"), 0),
    ("Character", Some("Magnitude"), 0),
    ("Number", Some("Magnitude"), 0),
    ("Integer", Some("Number"), 0),
    ("Int8", Some("Integer"), 0),
    ("UInt8", Some("Integer"), 0),
    ("Int16", Some("Integer"), 0),
    ("UInt16", Some("Integer"), 0),
    ("Int32", Some("Integer"), 0),
    ("UInt32", Some("Integer"), 0),
    ("Int64", Some("Integer"), 0),
    ("UInt64", Some("Integer"), 0),
    ("Float", Some("Number"), 0),
    ("Collection", Some("Object"), 0),
    ("SequenceableCollection", Some("Collection"), 0),
    ("Array", Some("SequenceableCollection"), 0),
    ("ByteArray", Some("SequenceableCollection"), 0),
    ("Tuple", Some("SequenceableCollection"), 0),
    ("String", Some("SequenceableCollection"), 0),
    ("Symbol", Some("String"), 0),
    ("Association", Some("Object"), 0),
    ("Dictionary", Some("Collection"), 0),
    ("CompiledMethod", Some("Object"), 0),
    ("SyntaxNode", Some("Object"), 0),
    ("Stdio", Some("Object"), 0),
];

struct Intrinsics {
    by_name: std::collections::HashMap<&'static str, Rc<ClassObj>>,
    env: Rc<Env>,
}

thread_local! {
    static INTRINSICS: Intrinsics = build();
}

fn build() -> Intrinsics {
    let mut by_name = std::collections::HashMap::new();

    // Step 1: create every (class, metaclass) pair.
    for &(name, _, format) in CLASSES {
        let class = ClassObj::new_ordinary(Symbol::intern(name), format);
        let metaclass = ClassObj::new_metaclass(Symbol::intern(&format!("{name} class")));
        *metaclass.this_class.borrow_mut() = Some(Rc::downgrade(&class));
        class.set_class_pointer(metaclass);
        by_name.insert(name, class);
    }

    // Step 2: link superclasses, including the parallel metaclass lattice
    // (`Integer class`'s superclass is `Number class`, and so on) so method
    // dispatch on a class (`new`, `basicNew`, `withSelector:addMethod:`, …)
    // can walk up to the `Class`/`Behavior` primitives installed below.
    for &(name, superclass, _) in CLASSES {
        if let Some(superclass) = superclass {
            let class = by_name[name].clone();
            let parent = by_name[superclass].clone();
            class.set_superclass(Some(parent.clone()));

            let meta = class.class_pointer.borrow().clone().expect("class pointer set in step 1");
            let parent_meta = parent.class_pointer.borrow().clone().expect("class pointer set in step 1");
            meta.set_superclass(Some(parent_meta));
        }
    }

    // Step 3: every metaclass's class pointer is `Metaclass` itself.
    let metaclass_class = by_name["Metaclass"].clone();
    for class in by_name.values() {
        let meta = class.class_pointer.borrow().clone().expect("class pointer set in step 1");
        meta.set_class_pointer(metaclass_class.clone());
    }

    // Step 4: registerInSuperclass.
    for &(name, superclass, _) in CLASSES {
        if let Some(superclass) = superclass {
            let class = by_name[name].clone();
            let parent = by_name[superclass].clone();
            class.register_in_superclass(&parent);
            let meta = class.class_pointer.borrow().clone().unwrap();
            let parent_meta = parent.class_pointer.borrow().clone().unwrap();
            meta.register_in_superclass(&parent_meta);
        }
    }

    // Step 5: short-circuits.
    let proto = by_name["ProtoObject"].clone();
    let undefined = by_name["UndefinedObject"].clone();
    let class_class = by_name["Class"].clone();
    proto.set_superclass(Some(undefined.clone()));
    proto.register_in_superclass(&undefined);
    let proto_meta = proto.class_pointer.borrow().clone().unwrap();
    proto_meta.set_superclass(Some(class_class.clone()));
    proto_meta.register_in_superclass(&class_class);

    install_primitives(&by_name);

    // Step 6: bind names in the intrinsics environment.
    let env = Env::root().child(EnvKind::Intrinsics);
    for &(name, _, _) in CLASSES {
        env.define(Symbol::intern(name), Binding::Value(Value::Class(by_name[name].clone())));
    }
    env.define(Symbol::intern("nil"), Binding::Value(Value::Undefined));
    env.define(Symbol::intern("true"), Binding::Value(Value::Boolean(true)));
    env.define(Symbol::intern("false"), Binding::Value(Value::Boolean(false)));
    env.define(Symbol::intern("void"), Binding::Value(Value::Void));
    env.define(Symbol::intern("Gradual"), Binding::Value(Value::Type(Type::Gradual)));
    env.define(Symbol::intern("Unit"), Binding::Value(Value::Type(Type::Unit)));
    env.define(Symbol::intern("Bottom"), Binding::Value(Value::Type(Type::Bottom)));

    Intrinsics { by_name, env }
}

/// Looked up by `Value::get_class`; panics (via `bug!`) if `name` is not one
/// of the bootstrap's declared classes — that would mean the intrinsics
/// table itself is malformed, an `AssertionError` per spec.md §7.
pub fn class(name: &str) -> Rc<ClassObj> {
    INTRINSICS.with(|i| match i.by_name.get(name) {
        Some(class) => class.clone(),
        None => crate::bug!("no intrinsic class named {name}"),
    })
}

pub fn class_of_class(class: &Rc<ClassObj>) -> Rc<ClassObj> {
    class.class_pointer.borrow().clone().unwrap_or_else(|| crate::bug!("class {} has no class pointer", class.name))
}

/// The root analysis-time environment: an `Intrinsics`-kind frame with every
/// class name, `nil`/`true`/`false`/`void`, and the type singletons bound.
pub fn root_env() -> Rc<Env> {
    INTRINSICS.with(|i| i.env.clone())
}

fn install_primitives(by_name: &std::collections::HashMap<&'static str, Rc<ClassObj>>) {
    macro_rules! def {
        ($class:expr, $selector:expr, $body:expr) => {
            by_name[$class].method_dict.borrow_mut().insert(
                Symbol::intern($selector),
                Method::Primitive { selector: Symbol::intern($selector), implementation: Rc::new($body) },
            );
        };
    }

    // ProtoObject
    def!("ProtoObject", "initialize", |args: &[Value], _pos: &SourcePosition| Ok(args[0].clone()));
    def!("ProtoObject", "class", |args: &[Value], _pos: &SourcePosition| Ok(args[0]
        .get_class()
        .map(Value::Class)
        .unwrap_or(Value::Undefined)));
    def!("ProtoObject", "identityHash", |args: &[Value], _pos: &SourcePosition| Ok(Value::Integer(Integer::from_i64(
        args[0].identity_hash() as i64
    ))));
    def!("ProtoObject", "==", |args: &[Value], _pos: &SourcePosition| Ok(Value::Boolean(args[0].identical_to(&args[1]))));
    def!("ProtoObject", "~~", |args: &[Value], _pos: &SourcePosition| Ok(Value::Boolean(!args[0].identical_to(&args[1]))));

    // Behavior (class-side protocol, shared by ordinary classes and metaclasses)
    // Open Question fix (spec.md §9): the method to install is `arguments[2]`
    // (the explicit `addMethod:` operand), not `arguments[1]` (the selector).
    def!("Behavior", "withSelector:addMethod:", |args: &[Value], pos: &SourcePosition| {
        let Value::Class(class) = &args[0] else {
            return Err(Fault::dispatch(pos.clone(), "withSelector:addMethod: sent to a non-class receiver"));
        };
        let Value::Symbol(selector) = &args[1] else {
            return Err(Fault::type_error(pos.clone(), "withSelector:addMethod:'s first argument must be a Symbol"));
        };
        class.method_dict.borrow_mut().insert(*selector, Method::Closure(args[2].clone()));
        Ok(args[0].clone())
    });
    def!("Behavior", "basicNew", |args: &[Value], pos: &SourcePosition| {
        let Value::Class(class) = &args[0] else {
            return Err(Fault::dispatch(pos.clone(), "basicNew sent to a non-class receiver"));
        };
        Ok(Value::Instance(crate::object::Instance::new(class.clone())))
    });
    def!("Behavior", "new", |args: &[Value], pos: &SourcePosition| {
        let instance = match &args[0] {
            Value::Class(class) => Value::Instance(crate::object::Instance::new(class.clone())),
            _ => return Err(Fault::dispatch(pos.clone(), "new sent to a non-class receiver")),
        };
        instance.perform_with_arguments(Symbol::intern("initialize"), &[], pos)
    });
    def!("Behavior", "superclass", |args: &[Value], pos: &SourcePosition| {
        let Value::Class(class) = &args[0] else {
            return Err(Fault::dispatch(pos.clone(), "superclass sent to a non-class receiver"));
        };
        Ok(class.superclass.borrow().clone().map(Value::Class).unwrap_or(Value::Undefined))
    });

    // Class
    def!("Class", "subclasses", |args: &[Value], pos: &SourcePosition| {
        let Value::Class(class) = &args[0] else {
            return Err(Fault::dispatch(pos.clone(), "subclasses sent to a non-class receiver"));
        };
        Ok(Value::array(class.subclasses().into_iter().map(Value::Class).collect()))
    });

    // Object
    def!("Object", "printString", |args: &[Value], _pos: &SourcePosition| Ok(Value::string(args[0].print_string())));
    def!("Object", "yourself", |args: &[Value], _pos: &SourcePosition| Ok(args[0].clone()));
    def!("Object", "at:", |args: &[Value], pos: &SourcePosition| object_at(&args[0], &args[1], pos));
    def!("Object", "at:put:", |args: &[Value], pos: &SourcePosition| object_at_put(&args[0], &args[1], &args[2], pos));

    // Collection
    def!("Collection", "size", |args: &[Value], pos: &SourcePosition| collection_size(&args[0], pos));

    install_integer_primitives(by_name);
    install_float_primitives(by_name);
    install_stdio_primitives(by_name);
}

fn object_at(receiver: &Value, index: &Value, pos: &SourcePosition) -> Result<Value, Fault> {
    let Value::Integer(i) = index else {
        return Err(Fault::type_error(pos.clone(), "at: expects an Integer index"));
    };
    let i = i.to_f64() as i64 - 1;
    let read = |xs: &[Value]| -> Result<Value, Fault> {
        usize::try_from(i)
            .ok()
            .and_then(|i| xs.get(i).cloned())
            .ok_or_else(|| Fault::semantic(pos.clone(), "Index out of bounds"))
    };
    match receiver {
        Value::Array(xs) => read(&xs.borrow()),
        Value::Tuple(xs) => read(xs),
        Value::ByteArray(xs) => usize::try_from(i)
            .ok()
            .and_then(|i| xs.borrow().get(i).map(|b| Value::Integer(Integer::from_i64(i64::from(*b)))))
            .ok_or_else(|| Fault::semantic(pos.clone(), "Index out of bounds")),
        Value::Instance(instance) => read(&instance.slots.borrow()),
        _ => Err(Fault::dispatch(pos.clone(), "at: not supported by this receiver")),
    }
}

fn object_at_put(receiver: &Value, index: &Value, value: &Value, pos: &SourcePosition) -> Result<Value, Fault> {
    let Value::Integer(i) = index else {
        return Err(Fault::type_error(pos.clone(), "at:put: expects an Integer index"));
    };
    let i = i.to_f64() as i64 - 1;
    match receiver {
        Value::Array(xs) => {
            let mut xs = xs.borrow_mut();
            let i = usize::try_from(i).map_err(|_| Fault::semantic(pos.clone(), "Index out of bounds"))?;
            if i >= xs.len() {
                return Err(Fault::semantic(pos.clone(), "Index out of bounds"));
            }
            xs[i] = value.clone();
            Ok(value.clone())
        }
        Value::Instance(instance) => {
            let mut slots = instance.slots.borrow_mut();
            let i = usize::try_from(i).map_err(|_| Fault::semantic(pos.clone(), "Index out of bounds"))?;
            if i >= slots.len() {
                return Err(Fault::semantic(pos.clone(), "Index out of bounds"));
            }
            slots[i] = value.clone();
            Ok(value.clone())
        }
        _ => Err(Fault::dispatch(pos.clone(), "at:put: not supported by this receiver")),
    }
}

fn collection_size(receiver: &Value, pos: &SourcePosition) -> Result<Value, Fault> {
    let n = match receiver {
        Value::Array(xs) => xs.borrow().len(),
        Value::Tuple(xs) => xs.len(),
        Value::ByteArray(xs) => xs.borrow().len(),
        Value::String(s) => s.borrow().chars().count(),
        Value::Dictionary(entries) => entries.borrow().len(),
        _ => return Err(Fault::dispatch(pos.clone(), "size not supported by this receiver")),
    };
    Ok(Value::Integer(Integer::from_i64(n as i64)))
}

fn install_integer_primitives(by_name: &std::collections::HashMap<&'static str, Rc<ClassObj>>) {
    macro_rules! def {
        ($class:expr, $selector:expr, $body:expr) => {
            by_name[$class].method_dict.borrow_mut().insert(
                Symbol::intern($selector),
                Method::Primitive { selector: Symbol::intern($selector), implementation: Rc::new($body) },
            );
        };
    }

    def!("Integer", "negated", |args: &[Value], pos: &SourcePosition| match &args[0] {
        Value::Integer(i) => Ok(Value::Integer(i.negated())),
        _ => Err(Fault::dispatch(pos.clone(), "negated sent to a non-Integer receiver")),
    });
    def!("Integer", "+", integer_binop(|a, b| Ok(a.add(b))));
    def!("Integer", "-", integer_binop(|a, b| Ok(a.sub(b))));
    def!("Integer", "*", integer_binop(|a, b| Ok(a.mul(b))));
    def!("Integer", "//", integer_binop(|a, b| a.division_and_remainder(b).map(|(q, _)| q).map_err(|_| ())));
    def!("Integer", "\\\\", integer_binop(|a, b| a.division_and_remainder(b).map(|(_, r)| r).map_err(|_| ())));
    def!("Integer", "=", integer_compare(|o| o == std::cmp::Ordering::Equal));
    def!("Integer", "~=", integer_compare(|o| o != std::cmp::Ordering::Equal));
    def!("Integer", "<", integer_compare(|o| o == std::cmp::Ordering::Less));
    def!("Integer", "<=", integer_compare(|o| o != std::cmp::Ordering::Greater));
    def!("Integer", ">", integer_compare(|o| o == std::cmp::Ordering::Greater));
    def!("Integer", ">=", integer_compare(|o| o != std::cmp::Ordering::Less));
    def!("Integer", "asInteger", |args: &[Value], pos: &SourcePosition| match &args[0] {
        Value::Integer(i) => Ok(Value::Integer(i.clone())),
        Value::Primitive(p) => Ok(Value::Integer(Integer::from_primitive(p.value))),
        _ => Err(Fault::dispatch(pos.clone(), "asInteger sent to an unsupported receiver")),
    });
    def!("Integer", "asFloat", |args: &[Value], pos: &SourcePosition| match &args[0] {
        Value::Integer(i) => Ok(Value::Float(i.to_f64())),
        Value::Primitive(p) => Ok(Value::Float(p.value as f64)),
        _ => Err(Fault::dispatch(pos.clone(), "asFloat sent to an unsupported receiver")),
    });

    for &(selector, bits, signed) in &[
        ("u8", 8u32, false),
        ("i8", 8, true),
        ("u16", 16, false),
        ("i16", 16, true),
        ("u32", 32, false),
        ("i32", 32, true),
        ("u64", 64, false),
        ("i64", 64, true),
        ("c32", 32, false),
    ] {
        def!("Integer", selector, move |args: &[Value], pos: &SourcePosition| {
            let Value::Integer(i) = &args[0] else {
                return Err(Fault::dispatch(pos.clone(), "width converter sent to a non-Integer receiver"));
            };
            Ok(Value::Primitive(PrimitiveInt { bits: bits as u8, signed, value: i.truncate_to_width(bits, signed) }))
        });
    }

    // Primitive fixed-width integer types additionally get bitwise ops.
    for class_name in ["Int8", "UInt8", "Int16", "UInt16", "Int32", "UInt32", "Int64", "UInt64"] {
        def!(class_name, "bitInvert", |args: &[Value], pos: &SourcePosition| match &args[0] {
            Value::Primitive(p) => Ok(Value::Primitive(PrimitiveInt { value: !p.value, ..*p })),
            _ => Err(Fault::dispatch(pos.clone(), "bitInvert sent to a non-primitive-integer receiver")),
        });
        def!(class_name, "%", primitive_binop(|a, b| a.checked_rem(b).ok_or(())));
        // Open Question fix (spec.md §9): `&` must use bitwise AND, not `|`.
        def!(class_name, "&", primitive_binop(|a, b| Ok(a & b)));
        def!(class_name, "|", primitive_binop(|a, b| Ok(a | b)));
        def!(class_name, "^", primitive_binop(|a, b| Ok(a ^ b)));
        def!(class_name, "<<", primitive_binop(|a, b| Ok(a << b)));
        def!(class_name, ">>", primitive_binop(|a, b| Ok(a >> b)));
    }
}

fn integer_binop(
    f: impl Fn(&Integer, &Integer) -> Result<Integer, ()> + 'static,
) -> impl Fn(&[Value], &SourcePosition) -> Result<Value, Fault> {
    move |args: &[Value], pos: &SourcePosition| {
        let (Value::Integer(a), Value::Integer(b)) = (&args[0], &args[1]) else {
            return Err(Fault::type_error(pos.clone(), "arithmetic message sent to a non-Integer receiver/argument"));
        };
        f(a, b).map(Value::Integer).map_err(|()| Fault::arithmetic(pos.clone(), "Division by zero"))
    }
}

fn integer_compare(f: impl Fn(std::cmp::Ordering) -> bool + 'static) -> impl Fn(&[Value], &SourcePosition) -> Result<Value, Fault> {
    move |args: &[Value], pos: &SourcePosition| {
        let (Value::Integer(a), Value::Integer(b)) = (&args[0], &args[1]) else {
            return Err(Fault::type_error(pos.clone(), "comparison sent to a non-Integer receiver/argument"));
        };
        Ok(Value::Boolean(f(a.0.cmp(&b.0))))
    }
}

fn primitive_binop(
    f: impl Fn(i128, i128) -> Result<i128, ()> + 'static,
) -> impl Fn(&[Value], &SourcePosition) -> Result<Value, Fault> {
    move |args: &[Value], pos: &SourcePosition| {
        let (Value::Primitive(a), Value::Primitive(b)) = (&args[0], &args[1]) else {
            return Err(Fault::type_error(pos.clone(), "bitwise/modulo message sent to a non-primitive-integer receiver/argument"));
        };
        let raw = f(a.value, b.value).map_err(|()| Fault::arithmetic(pos.clone(), "Division by zero"))?;
        let truncated = Integer::from_primitive(raw).truncate_to_width(u32::from(a.bits), a.signed);
        Ok(Value::Primitive(PrimitiveInt { value: truncated, ..*a }))
    }
}

fn install_float_primitives(by_name: &std::collections::HashMap<&'static str, Rc<ClassObj>>) {
    by_name["Float"].method_dict.borrow_mut().insert(
        Symbol::intern("sqrt"),
        Method::Primitive {
            selector: Symbol::intern("sqrt"),
            implementation: Rc::new(|args: &[Value], pos: &SourcePosition| match &args[0] {
                Value::Float(f) => Ok(Value::Float(f.sqrt())),
                _ => Err(Fault::dispatch(pos.clone(), "sqrt sent to a non-Float receiver")),
            }),
        },
    );
}

fn install_stdio_primitives(by_name: &std::collections::HashMap<&'static str, Rc<ClassObj>>) {
    let metaclass = by_name["Stdio"].class_pointer.borrow().clone().unwrap();
    for (selector, tag) in [("stdin", StreamTag::Stdin), ("stdout", StreamTag::Stdout), ("stderr", StreamTag::Stderr)] {
        metaclass.method_dict.borrow_mut().insert(
            Symbol::intern(selector),
            Method::Primitive { selector: Symbol::intern(selector), implementation: Rc::new(move |_, _| Ok(Value::Stream(tag))) },
        );
    }
}

/// Fresh method dictionary, used by the type universe's hash-consed
/// product/sum types (spec.md §4.6) — exposed here so `types.rs` doesn't
/// need to depend back on intrinsics wiring.
pub fn empty_method_dict() -> MethodDict {
    MethodDict::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_invariant_the_class_of_any_metaclass_is_metaclass() {
        let metaclass = class("Metaclass");
        let any_metaclass = class_of_class(&class("Integer"));
        let its_class = class_of_class(&any_metaclass);
        assert!(Rc::ptr_eq(&its_class, &metaclass));
    }

    #[test]
    fn metaclass_superclass_chain_climbs_to_behavior_through_class() {
        let integer_meta = class_of_class(&class("Integer"));
        let number_meta = class_of_class(&class("Number"));
        assert!(Rc::ptr_eq(&integer_meta.superclass.borrow().clone().unwrap(), &number_meta));

        let mut current = integer_meta;
        loop {
            if current.name.as_str() == "Behavior" {
                break;
            }
            current = current.superclass.borrow().clone().expect("metaclass chain reaches Behavior");
        }
    }

    #[test]
    fn sending_basic_new_and_new_to_an_intrinsic_class_dispatches_through_the_metaclass_chain() {
        let pos = SourcePosition::initial(crate::source::SourceBuffer::new("", "t", "sysmel", ""));
        let basic = Value::Class(class("Integer")).perform_with_arguments(Symbol::intern("basicNew"), &[], &pos).unwrap();
        assert!(matches!(basic, Value::Instance(_)));

        let instance = Value::Class(class("Object")).perform_with_arguments(Symbol::intern("new"), &[], &pos).unwrap();
        assert!(matches!(instance, Value::Instance(_)));
    }

    #[test]
    fn bootstrap_invariant_proto_object_superclass_is_undefined_object() {
        let proto = class("ProtoObject");
        let undefined = class("UndefinedObject");
        assert!(Rc::ptr_eq(&proto.superclass.borrow().clone().unwrap(), &undefined));
    }

    #[test]
    fn every_intrinsic_class_terminates_at_undefined_object() {
        for &(name, ..) in CLASSES {
            let mut current = class(name);
            let mut steps = 0;
            loop {
                match current.superclass.borrow().clone() {
                    Some(parent) => {
                        current = parent;
                        steps += 1;
                        assert!(steps <= CLASSES.len() + 1, "class {name} never terminates");
                    }
                    None => break,
                }
            }
        }
    }

    #[test]
    fn integer_arithmetic_primitive_dispatches_through_class_lattice() {
        let pos = SourcePosition::initial(crate::source::SourceBuffer::new("", "t", "sysmel", ""));
        let result = Value::Integer(Integer::from_i64(2))
            .perform_with_arguments(Symbol::intern("+"), &[Value::Integer(Integer::from_i64(3))], &pos)
            .unwrap();
        assert_eq!(result.print_string(), "5");
    }

    #[test]
    fn bitwise_and_primitive_is_fixed_to_actually_and() {
        let pos = SourcePosition::initial(crate::source::SourceBuffer::new("", "t", "sysmel", ""));
        let a = Value::Primitive(PrimitiveInt { bits: 8, signed: false, value: 0b1100 });
        let b = Value::Primitive(PrimitiveInt { bits: 8, signed: false, value: 0b1010 });
        let result = a.perform_with_arguments(Symbol::intern("&"), &[b], &pos).unwrap();
        assert_eq!(result.print_string(), "8");
    }
}
