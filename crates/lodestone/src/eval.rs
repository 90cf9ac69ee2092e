//! The tree-walking evaluator: `Semantic` -> `Value`.
//!
//! Every node is resolved by the analyzer already, so evaluation never fails
//! on an unbound name or an ambiguous shape — only on the dynamic failures
//! the semantic tree can't rule out ahead of time (dispatch misses, type
//! mismatches, division by zero, runaway recursion).

use std::rc::Rc;

use crate::{
    diagnostics::Fault,
    env::Frame,
    intern::Symbol,
    semantic::{Closure, PiDef, Semantic, SemanticKind},
    types::{SimpleFunctionType, Type},
    value::Value,
};

/// Recursion-depth guard. Spec.md has no bound on call depth; a runaway
/// recursive definition (e.g. a mistyped base case) would otherwise blow the
/// host stack with no diagnostic. This is an ambient addition, not named in
/// spec.md's error taxonomy (see DESIGN.md).
const MAX_CALL_DEPTH: usize = 4096;

thread_local! {
    static CALL_DEPTH: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

struct DepthGuard;

impl DepthGuard {
    fn enter(position: &crate::source::SourcePosition) -> Result<Self, Fault> {
        let depth = CALL_DEPTH.with(|d| {
            d.set(d.get() + 1);
            d.get()
        });
        if depth > MAX_CALL_DEPTH {
            CALL_DEPTH.with(|d| d.set(d.get() - 1));
            return Err(Fault::resource(position.clone(), "Recursion depth exceeded"));
        }
        Ok(DepthGuard)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        CALL_DEPTH.with(|d| d.set(d.get() - 1));
    }
}

/// Evaluates a semantic tree under the intrinsics' root frame.
pub fn evaluate_program(semantic: &Rc<Semantic>) -> Result<Value, Fault> {
    let root = Frame::root();
    evaluate(semantic, &root)
}

pub fn evaluate(semantic: &Rc<Semantic>, frame: &Rc<Frame>) -> Result<Value, Fault> {
    let pos = &semantic.position;
    match &semantic.kind {
        SemanticKind::Literal(value) => Ok(value.clone()),

        SemanticKind::IdentifierReference(name) => frame
            .get(*name)
            .ok_or_else(|| crate::bug!("unbound identifier reference '{name}' reached the evaluator")),

        SemanticKind::Sequence(statements) => {
            let mut result = Value::nil();
            for statement in statements {
                result = evaluate(statement, frame)?;
            }
            Ok(result)
        }

        SemanticKind::Application { functional, arguments } => {
            let callee = evaluate(functional, frame)?;
            let args = arguments.iter().map(|a| evaluate(a, frame)).collect::<Result<Vec<_>, _>>()?;
            apply_value(&callee, &args, pos)
        }

        SemanticKind::MessageSend { receiver, selector, arguments } => {
            let selector_value = evaluate(selector, frame)?;
            let Value::Symbol(selector) = selector_value else {
                crate::bug!("MessageSend selector did not evaluate to a Symbol");
            };
            let args = arguments.iter().map(|a| evaluate(a, frame)).collect::<Result<Vec<_>, _>>()?;
            match receiver {
                Some(receiver) => {
                    let receiver_value = evaluate(receiver, frame)?;
                    // A closure has no class/type method dictionary of its
                    // own; any message sent to it (`value`, `value:`,
                    // `value:value:`, ...) invokes it directly with the
                    // message's arguments rather than dispatching by
                    // selector name, matching block-invocation convention.
                    match &receiver_value {
                        Value::Closure(_) => apply_with_arguments(&receiver_value, &args, pos),
                        _ => receiver_value.perform_with_arguments(selector, &args, pos),
                    }
                }
                None => match frame.get(selector) {
                    Some(value) => apply_value(&value, &args, pos),
                    None => Err(Fault::semantic(pos.clone(), format!("Unknown variable '{selector}'"))),
                },
            }
        }

        SemanticKind::If { returns_value, condition, true_case, false_case } => {
            let condition = evaluate(condition, frame)?;
            let truthy = match condition {
                Value::Boolean(b) => b,
                _ => return Err(Fault::type_error(pos.clone(), "if: condition must be a Boolean")),
            };
            if truthy {
                match true_case {
                    Some(branch) => evaluate(branch, frame),
                    None => Ok(Value::nil()),
                }
            } else if *returns_value {
                match false_case {
                    Some(branch) => evaluate(branch, frame),
                    None => Ok(Value::nil()),
                }
            } else {
                Ok(Value::nil())
            }
        }

        SemanticKind::While { condition, body, continue_action } => {
            loop {
                let cond = evaluate(condition, frame)?;
                match cond {
                    Value::Boolean(true) => {}
                    Value::Boolean(false) => break,
                    _ => return Err(Fault::type_error(pos.clone(), "while:do: condition must be a Boolean")),
                }
                evaluate(body, frame)?;
                if let Some(continue_action) = continue_action {
                    evaluate(continue_action, frame)?;
                }
            }
            Ok(Value::nil())
        }

        SemanticKind::Alloca { name, initial_value, .. } => {
            let value = match initial_value {
                Some(initial_value) => evaluate(initial_value, frame)?,
                None => Value::nil(),
            };
            let boxed = Value::MutableBox(Rc::new(std::cell::RefCell::new(value)));
            if let Some(name) = name {
                frame.define(*name, boxed.clone());
            }
            Ok(boxed)
        }

        SemanticKind::Load(target) => {
            let boxed = evaluate(target, frame)?;
            match boxed {
                Value::MutableBox(cell) => Ok(cell.borrow().clone()),
                other => Ok(other),
            }
        }

        SemanticKind::Store { target, value } => {
            let new_value = evaluate(value, frame)?;
            let boxed = evaluate(target, frame)?;
            match boxed {
                Value::MutableBox(cell) => {
                    *cell.borrow_mut() = new_value.clone();
                    Ok(new_value)
                }
                _ => crate::bug!("Store target did not evaluate to a MutableBox"),
            }
        }

        SemanticKind::Lambda(def) => {
            let closure = Closure { def: def.clone(), defining_frame: frame.clone(), declared_type: Type::Gradual };
            Ok(Value::Closure(Rc::new(closure)))
        }

        SemanticKind::Pi(def) => evaluate_pi(def, frame, pos),

        SemanticKind::SimpleFunctionType { argument_types, argument_names, result_type } => {
            let argument_types = argument_types.iter().map(|t| evaluate_as_type(t, frame, pos)).collect::<Result<Vec<_>, _>>()?;
            let result_type = evaluate_as_type(result_type, frame, pos)?;
            let ty = SimpleFunctionType {
                argument_types,
                argument_names: argument_names.clone(),
                result_type,
                method_dict: std::cell::RefCell::new(crate::object::MethodDict::new()),
            };
            Ok(Value::Type(Type::SimpleFunction(Rc::new(ty))))
        }

        SemanticKind::Array(elements) => {
            let values = elements.iter().map(|e| evaluate(e, frame)).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::array(values))
        }
        SemanticKind::Tuple(elements) => {
            let values = elements.iter().map(|e| evaluate(e, frame)).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Tuple(Rc::new(values)))
        }
        SemanticKind::ByteArray(elements) => {
            let mut bytes = Vec::with_capacity(elements.len());
            for element in elements {
                let value = evaluate(element, frame)?;
                let Value::Integer(i) = value else {
                    return Err(Fault::type_error(pos.clone(), "ByteArray elements must be Integer literals"));
                };
                let n = i.to_f64();
                if !(0.0..=255.0).contains(&n) {
                    return Err(Fault::semantic(pos.clone(), "ByteArray element out of 0..255 range"));
                }
                bytes.push(n as u8);
            }
            Ok(Value::ByteArray(Rc::new(std::cell::RefCell::new(bytes))))
        }
        SemanticKind::Association(key, value) => {
            let key = evaluate(key, frame)?;
            let value = evaluate(value, frame)?;
            Ok(Value::Association(Rc::new((key, value))))
        }
        SemanticKind::Dictionary(pairs) => {
            let mut entries = Vec::with_capacity(pairs.len());
            for (key, value) in pairs {
                entries.push((evaluate(key, frame)?, evaluate(value, frame)?));
            }
            Ok(Value::Dictionary(Rc::new(std::cell::RefCell::new(entries))))
        }
    }
}

fn evaluate_as_type(semantic: &Rc<Semantic>, frame: &Rc<Frame>, pos: &crate::source::SourcePosition) -> Result<Type, Fault> {
    match evaluate(semantic, frame)? {
        Value::Type(ty) => Ok(ty),
        _ => {
            let _ = pos;
            Ok(Type::Gradual)
        }
    }
}

/// A standalone `(args) -> Result` expression reduces to a genuine
/// `Type::SimpleFunction` value: every argument/result type expression is
/// evaluated and coerced into a `Type` (falling back to `Gradual` if the
/// expression didn't produce one), matching spec.md §4.6's Π-reduction.
fn evaluate_pi(def: &PiDef, frame: &Rc<Frame>, pos: &crate::source::SourcePosition) -> Result<Value, Fault> {
    let mut argument_types = Vec::with_capacity(def.arguments.len());
    let mut argument_names = Vec::with_capacity(def.arguments.len());
    for (name, type_expression) in &def.arguments {
        argument_types.push(evaluate_as_type(type_expression, frame, pos)?);
        argument_names.push(*name);
    }
    let result_type = match &def.result_type {
        Some(result_type) => evaluate_as_type(result_type, frame, pos)?,
        None => Type::Gradual,
    };
    let ty = SimpleFunctionType {
        argument_types,
        argument_names,
        result_type,
        method_dict: std::cell::RefCell::new(crate::object::MethodDict::new()),
    };
    Ok(Value::Type(Type::SimpleFunction(Rc::new(ty))))
}

fn apply_value(callee: &Value, arguments: &[Value], position: &crate::source::SourcePosition) -> Result<Value, Fault> {
    match callee {
        Value::Closure(_) => apply_with_arguments(callee, arguments, position),
        Value::Macro(_) => Err(Fault::semantic(position.clone(), "Macros cannot be invoked as ordinary values at evaluation time")),
        _ => callee.perform_with_arguments(Symbol::intern("value"), arguments, position),
    }
}

/// Invokes a `Value::Closure` with already-evaluated arguments (argument 0
/// is the receiver for bound methods; plain function closures take no
/// implicit receiver). `:mutable` parameters are boxed on entry so the body
/// can reassign them through `Store`.
pub fn apply_with_arguments(closure_value: &Value, arguments: &[Value], position: &crate::source::SourcePosition) -> Result<Value, Fault> {
    let Value::Closure(closure) = closure_value else {
        return Err(Fault::dispatch(position.clone(), "Attempted to call a non-Closure value"));
    };
    let _guard = DepthGuard::enter(position)?;

    let call_frame = Frame::child(&closure.defining_frame);
    if let Some(name) = closure.def.name {
        call_frame.define(name, closure_value.clone());
    }

    let params = &closure.def.arguments;
    if arguments.len() != params.len() {
        return Err(Fault::dispatch(
            position.clone(),
            format!("Wrong number of arguments: expected {}, got {}", params.len(), arguments.len()),
        ));
    }
    for (param, argument) in params.iter().zip(arguments) {
        let Some(param_name) = param.name else { continue };
        if param.is_mutable {
            call_frame.define(param_name, Value::MutableBox(Rc::new(std::cell::RefCell::new(argument.clone()))));
        } else {
            call_frame.define(param_name, argument.clone());
        }
    }

    evaluate(&closure.def.body, &call_frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analyzer::analyze_program, intrinsics, parse::parse, scanner::scan, source::SourceBuffer};

    fn run(text: &str) -> Value {
        let cst = parse(scan(SourceBuffer::new("", "t", "sysmel", text)));
        let semantic = analyze_program(&cst, &intrinsics::root_env()).unwrap();
        evaluate_program(&semantic).unwrap()
    }

    #[test]
    fn arithmetic_dispatches_through_intrinsic_primitives() {
        assert_eq!(run("2 + 3 * 4").print_string(), "20");
    }

    #[test]
    fn if_then_else_picks_the_taken_branch() {
        assert_eq!(run("if: 1 < 2 then: [10] else: [20]").print_string(), "10");
        assert_eq!(run("if: 2 < 1 then: [10] else: [20]").print_string(), "20");
    }

    #[test]
    fn local_assignment_then_reassignment_updates_in_place() {
        assert_eq!(run("x := 1. x := x + 1. x").print_string(), "2");
    }

    #[test]
    fn while_loop_accumulates_into_a_mutable_local() {
        assert_eq!(run("n := 0. i := 0. while: [i < 5] do: [n := n + i. i := i + 1]. n").print_string(), "10");
    }

    #[test]
    fn recursive_block_definition_can_call_itself() {
        let value = run("factorial := [:n | if: n = 0 then: [1] else: [n * (factorial value: n - 1)]]. factorial value: 5");
        assert_eq!(value.print_string(), "120");
    }

    #[test]
    fn cascade_returns_the_last_messages_result() {
        assert_eq!(run("x := 3. (x + 1; + 2; + 3)").print_string(), "6");
    }

    #[test]
    fn deeply_recursive_definition_raises_a_resource_fault_instead_of_overflowing_the_stack() {
        let cst = parse(scan(SourceBuffer::new(
            "",
            "t",
            "sysmel",
            "loop := [:n | loop value: n + 1]. loop value: 0",
        )));
        let semantic = analyze_program(&cst, &intrinsics::root_env()).unwrap();
        let err = evaluate_program(&semantic).unwrap_err();
        assert_eq!(err.kind, crate::diagnostics::FaultKind::Resource);
    }
}
