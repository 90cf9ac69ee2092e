//! CST to Semantic lowering: name resolution, the assignment rewrite table,
//! macro expansion, and the four built-in control-flow forms.
//!
//! Macro expansion happens here and only here, at analysis time: a
//! receiver-less send whose selector is bound to a [`crate::value::MacroValue`]
//! is expanded into a CST fragment and re-analyzed in place, before the
//! evaluator ever sees it. `if:then:`, `if:then:else:`, `while:do:`, and
//! `while:do:continueWith:` are special-cased directly below rather than
//! registered as macros, since they need to thread `returns_value` and
//! build dedicated `Semantic::If`/`Semantic::While` nodes the evaluator
//! short-circuits on, rather than a generic macro expansion round-trip.

use std::rc::Rc;

use crate::{
    cst::{Cst, CstKind},
    diagnostics::Fault,
    env::{Binding, Env, EnvKind},
    intern::Symbol,
    numeric::Integer,
    semantic::{LambdaArgument, LambdaDef, PiDef, Semantic, SemanticKind},
    source::SourcePosition,
    types::Type,
    value::Value,
};

/// Analyzes a complete top-level CST (assumed free of `SyntaxError` nodes —
/// the driver rejects those before analysis ever runs).
pub fn analyze_program(cst: &Cst, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    analyze(cst, env)
}

fn analyze(cst: &Cst, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    let pos = cst.position.clone();
    match &cst.kind {
        CstKind::LiteralInteger(small, big) => {
            let value = match big {
                Some(big) => Integer(big.clone()),
                None => Integer::from_i64(*small),
            };
            Ok(Semantic::literal(pos, Value::Integer(value)))
        }
        CstKind::LiteralFloat(f) => Ok(Semantic::literal(pos, Value::Float(*f))),
        CstKind::LiteralCharacter(c) => Ok(Semantic::literal(pos, Value::Character(*c))),
        CstKind::LiteralString(s) => Ok(Semantic::literal(pos, Value::string(s.clone()))),
        CstKind::LiteralSymbol(s) => Ok(Semantic::literal(pos, Value::Symbol(*s))),

        CstKind::Identifier(name) => analyze_identifier(*name, pos, env),

        CstKind::ValueSequence(items) => analyze_sequence(items, pos, env),

        CstKind::Tuple(items) => {
            let elements = items.iter().map(|i| analyze(i, env)).collect::<Result<Vec<_>, _>>()?;
            Ok(Semantic::new(pos, Type::Gradual, SemanticKind::Tuple(elements)))
        }
        CstKind::Array(items) => {
            let elements = items.iter().map(|i| analyze(i, env)).collect::<Result<Vec<_>, _>>()?;
            Ok(Semantic::new(pos, Type::Gradual, SemanticKind::Array(elements)))
        }
        CstKind::ByteArray(items) => {
            let elements = items.iter().map(|i| analyze(i, env)).collect::<Result<Vec<_>, _>>()?;
            Ok(Semantic::new(pos, Type::Gradual, SemanticKind::ByteArray(elements)))
        }
        CstKind::Dictionary(pairs) => {
            let pairs = pairs
                .iter()
                .map(|(k, v)| Ok((analyze(k, env)?, analyze(v, env)?)))
                .collect::<Result<Vec<_>, Fault>>()?;
            Ok(Semantic::new(pos, Type::Gradual, SemanticKind::Dictionary(pairs)))
        }
        CstKind::Association(k, v) => {
            let k = analyze(k, env)?;
            let v = analyze(v, env)?;
            Ok(Semantic::new(pos, Type::Gradual, SemanticKind::Association(k, v)))
        }

        CstKind::BindableName { name, type_expression, .. } => analyze_bare_declaration(*name, type_expression.as_deref(), pos, env),

        CstKind::BindPattern { pattern, type_expression } => analyze_bind_pattern(pattern, type_expression.as_deref(), pos, env),

        CstKind::FunctionalDependentType { argument, result_type } => {
            analyze_standalone_function_type(argument, result_type.as_deref(), pos, env)
        }

        CstKind::Block { arguments, body } => analyze_block(arguments, body, pos, env, None),

        CstKind::LexicalBlock(body) => analyze(body, &env.child(EnvKind::Lexical)),

        CstKind::Assignment { store, value } => analyze_assignment(store, value, pos, env),

        CstKind::Application { functional, arguments } => {
            let functional = analyze(functional, env)?;
            let arguments = arguments.iter().map(|a| analyze(a, env)).collect::<Result<Vec<_>, _>>()?;
            Ok(Semantic::new(pos, Type::Gradual, SemanticKind::Application { functional, arguments }))
        }

        CstKind::MessageSend { receiver, selector, arguments } => analyze_message_send(receiver.as_deref(), *selector, arguments, pos, env),

        CstKind::MessageCascade { receiver, messages } => analyze_cascade(receiver, messages, pos, env),

        CstKind::BinaryExpressionSequence { first, rest } => analyze_binary_sequence(first, rest, env),

        CstKind::Quote(inner) | CstKind::QuasiQuote(inner) | CstKind::QuasiUnquote(inner) | CstKind::Splice(inner) => {
            // Quoting captures `inner` verbatim, unanalyzed. Full quasiquote
            // substitution (splicing unquoted fragments back in at analysis
            // time) is not implemented; nested unquote/splice forms are
            // captured as inert syntax rather than interpolated. See
            // DESIGN.md.
            Ok(Semantic::literal(pos, Value::Syntax(Rc::new((**inner).clone()))))
        }

        CstKind::SyntaxError { .. } => {
            crate::bug!("analyzer reached a SyntaxError node; the driver must reject these before analysis")
        }
    }
}

fn analyze_identifier(name: Symbol, pos: SourcePosition, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    match env.lookup(name) {
        Some(Binding::Value(v)) => Ok(Semantic::literal(pos, v)),
        Some(Binding::Argument { ty, .. }) => Ok(Semantic::new(pos, ty, SemanticKind::IdentifierReference(name))),
        Some(Binding::Fixpoint { .. }) => Ok(Semantic::new(pos, Type::Gradual, SemanticKind::IdentifierReference(name))),
        Some(Binding::Local { ty, .. }) => {
            let reference = Semantic::new(pos.clone(), ty.clone(), SemanticKind::IdentifierReference(name));
            Ok(Semantic::new(pos, ty, SemanticKind::Load(reference)))
        }
        None => Err(Fault::semantic(pos, format!("Unknown variable '{name}'"))),
    }
}

fn analyze_sequence(items: &[Cst], pos: SourcePosition, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    if items.is_empty() {
        return Ok(Semantic::literal(pos, Value::nil()));
    }
    let semantics = items.iter().map(|i| analyze(i, env)).collect::<Result<Vec<_>, _>>()?;
    let ty = semantics.last().unwrap().ty.clone();
    Ok(Semantic::new(pos, ty, SemanticKind::Sequence(semantics)))
}

/// A bare `BindableName` expression (not the store of an `Assignment`) is a
/// declaration with no initializer — `n: Integer` alone binds `n` to `nil`
/// — *unless* `name` already names a macro, in which case this is that
/// macro's invocation with `type_expression` as its sole unanalyzed
/// argument. The keyword-collapsing grammar makes these syntactically
/// identical; resolving by looking `name` up in `env` is how the analyzer
/// tells them apart (see DESIGN.md).
fn analyze_bare_declaration(name: Symbol, type_expression: Option<&Cst>, pos: SourcePosition, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    if let Some(Binding::Value(Value::Macro(macro_value))) = env.lookup(name) {
        let args = type_expression.map(std::slice::from_ref).unwrap_or(&[]);
        let expanded = (macro_value.expand)(&pos, args)?;
        return analyze(&expanded, env);
    }
    env.define(name, Binding::Local { ty: Type::Gradual, position: pos.clone() });
    Ok(Semantic::new(pos, Type::Gradual, SemanticKind::Alloca { name: Some(name), value_type: Type::Gradual, initial_value: None }))
}

/// Macro-produced `|x|`/`|x: T|` declarations: same shape as a bare
/// declaration with no initializer. `outer_type_expression` is the
/// `BindPattern` node's own type annotation, used when `pattern` is a bare
/// identifier rather than an already-typed `BindableName`.
fn analyze_bind_pattern(pattern: &Cst, outer_type_expression: Option<&Cst>, pos: SourcePosition, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    match &pattern.kind {
        CstKind::BindableName { name, type_expression, .. } => {
            analyze_bare_declaration(*name, type_expression.as_deref().or(outer_type_expression), pos, env)
        }
        CstKind::Identifier(name) => analyze_bare_declaration(*name, outer_type_expression, pos, env),
        _ => Err(Fault::semantic(pos, "Malformed pattern binding")),
    }
}

/// True for CST shapes the keyword-collapsing grammar uses to carry a
/// parameter list: a single typed binder (`n: Integer`) or a multi-segment
/// keyword send (`n: Integer m: Integer`), per `parse.rs`'s module doc
/// comment on the consequence this has for function signatures.
fn looks_like_parameter_list(cst: &Cst) -> bool {
    matches!(
        cst.kind,
        CstKind::BindableName { .. } | CstKind::MessageSend { receiver: None, .. } | CstKind::Identifier(_)
    )
}

/// Extracts `(name, type_expression)` pairs from a parameter-list-shaped CST.
fn collect_binders(cst: &Cst) -> Vec<(Option<Symbol>, Option<Cst>, bool)> {
    match &cst.kind {
        CstKind::BindableName { name, type_expression, is_mutable, .. } => {
            vec![(Some(*name), type_expression.as_deref().cloned(), *is_mutable)]
        }
        CstKind::Identifier(name) => vec![(Some(*name), None, false)],
        CstKind::MessageSend { receiver: None, selector, arguments } => selector
            .as_str()
            .split(':')
            .filter(|p| !p.is_empty())
            .zip(arguments)
            .map(|(part, arg)| (Some(Symbol::intern(part)), Some(arg.clone()), false))
            .collect(),
        _ => vec![(None, Some(cst.clone()), false)],
    }
}

fn build_lambda_arguments(binders: &[(Option<Symbol>, Option<Cst>, bool)]) -> Vec<LambdaArgument> {
    // Declared parameter types are accepted syntactically but not elaborated
    // into the `Type` lattice — the analyzer carries `Type::Gradual`
    // uniformly for parameters, matching the bootstrap's gradual-by-default
    // posture (see DESIGN.md).
    binders
        .iter()
        .map(|(name, _type_expr, is_mutable)| LambdaArgument { name: *name, declared_type: Type::Gradual, is_mutable: *is_mutable })
        .collect()
}

fn analyze_block(arguments: &[Cst], body: &Cst, pos: SourcePosition, env: &Rc<Env>, name: Option<Symbol>) -> Result<Rc<Semantic>, Fault> {
    let child = env.child(EnvKind::Lexical);
    let mut lambda_arguments = Vec::with_capacity(arguments.len());
    for argument in arguments {
        let CstKind::BindableName { name, is_mutable, .. } = &argument.kind else {
            return Err(Fault::semantic(argument.position.clone(), "Malformed block argument"));
        };
        if *is_mutable {
            child.define(*name, Binding::Local { ty: Type::Gradual, position: argument.position.clone() });
        } else {
            child.define(*name, Binding::Argument { ty: Type::Gradual, position: argument.position.clone() });
        }
        lambda_arguments.push(LambdaArgument { name: Some(*name), declared_type: Type::Gradual, is_mutable: *is_mutable });
    }
    let body = analyze(body, &child)?;
    let def = LambdaDef { name, arguments: lambda_arguments, body, result_type: Type::Gradual, is_macro: false };
    Ok(Semantic::new(pos, Type::Gradual, SemanticKind::Lambda(Rc::new(def))))
}

/// A standalone `(args) -> Result` expression (not an assignment store) is a
/// Π-type value: the dependent function type itself, not a function
/// definition.
fn analyze_standalone_function_type(argument: &Cst, result_type: Option<&Cst>, pos: SourcePosition, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    let binders = collect_binders(argument);
    let mut pi_arguments = Vec::with_capacity(binders.len());
    for (name, type_expr, _) in &binders {
        let type_semantic = match type_expr {
            Some(t) => analyze(t, env)?,
            None => Semantic::literal(pos.clone(), Value::Type(Type::Gradual)),
        };
        pi_arguments.push((*name, type_semantic));
    }
    let result_semantic = result_type.map(|r| analyze(r, env)).transpose()?;
    let def = PiDef { name: None, arguments: pi_arguments, result_type: result_semantic };
    Ok(Semantic::new(pos, Type::Gradual, SemanticKind::Pi(Rc::new(def))))
}

fn analyze_assignment(store: &Cst, value: &Cst, pos: SourcePosition, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    match &store.kind {
        CstKind::Identifier(name) => analyze_identifier_assignment(*name, store.position.clone(), value, pos, env),

        CstKind::BindableName { name, type_expression: Some(inner), .. } if looks_like_parameter_list(inner) => {
            analyze_named_function_definition(*name, inner, None, value, pos, env)
        }
        CstKind::BindableName { name, .. } => {
            let value_semantic = analyze(value, env)?;
            env.define(*name, Binding::Local { ty: Type::Gradual, position: pos.clone() });
            Ok(Semantic::new(
                pos,
                Type::Gradual,
                SemanticKind::Alloca { name: Some(*name), value_type: Type::Gradual, initial_value: Some(value_semantic) },
            ))
        }

        CstKind::FunctionalDependentType { argument, result_type } => match &argument.kind {
            CstKind::BindableName { name, type_expression: Some(inner), .. } if looks_like_parameter_list(inner) => {
                analyze_named_function_definition(*name, inner, result_type.as_deref(), value, pos, env)
            }
            _ => {
                // No name to bind: this is a type-ascribed function literal,
                // not a declaration. The whole assignment collapses to the
                // ascribed lambda value.
                let binders = collect_binders(argument);
                let lambda_arguments = build_lambda_arguments(&binders);
                let child = env.child(EnvKind::Lexical);
                for arg in &lambda_arguments {
                    if let Some(name) = arg.name {
                        let binding = if arg.is_mutable {
                            Binding::Local { ty: Type::Gradual, position: pos.clone() }
                        } else {
                            Binding::Argument { ty: Type::Gradual, position: pos.clone() }
                        };
                        child.define(name, binding);
                    }
                }
                let body = analyze(value, &child)?;
                let def = LambdaDef { name: None, arguments: lambda_arguments, body, result_type: Type::Gradual, is_macro: false };
                Ok(Semantic::new(pos, Type::Gradual, SemanticKind::Lambda(Rc::new(def))))
            }
        },

        _ => Err(Fault::semantic(pos, "Invalid assignment target")),
    }
}

fn analyze_identifier_assignment(name: Symbol, store_pos: SourcePosition, value: &Cst, pos: SourcePosition, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    match env.lookup(name) {
        Some(Binding::Local { ty, .. }) => {
            let value_semantic = analyze(value, env)?;
            let target = Semantic::new(store_pos, ty.clone(), SemanticKind::IdentifierReference(name));
            Ok(Semantic::new(pos, ty, SemanticKind::Store { target, value: value_semantic }))
        }
        Some(Binding::Argument { .. }) => Err(Fault::semantic(pos, format!("Cannot assign to argument '{name}'"))),
        Some(Binding::Value(_)) => Err(Fault::semantic(pos, format!("Cannot assign to constant '{name}'"))),
        Some(Binding::Fixpoint { .. }) => Err(Fault::semantic(pos, format!("Cannot assign to '{name}' inside its own definition"))),
        None if matches!(value.kind, CstKind::Block { .. }) => analyze_recursive_block_definition(name, value, pos, env),
        None => {
            let value_semantic = analyze(value, env)?;
            env.define(name, Binding::Local { ty: Type::Gradual, position: pos.clone() });
            Ok(Semantic::new(
                pos,
                Type::Gradual,
                SemanticKind::Alloca { name: Some(name), value_type: Type::Gradual, initial_value: Some(value_semantic) },
            ))
        }
    }
}

/// `name := [ ... ]` where `name` is fresh: binds `name` as a `Fixpoint`
/// while analyzing the block body, so a self-call inside resolves, then
/// rebinds `name` to an ordinary `Local` for code following the assignment.
/// The closure's defining frame is the frame the `Alloca` installs `name`
/// into, so a recursive call performed after the box is installed finds it
/// (see DESIGN.md: the evaluator must evaluate `initial_value` before
/// defining the name, using the same frame as the closure's captured frame).
fn analyze_recursive_block_definition(name: Symbol, value: &Cst, pos: SourcePosition, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    let CstKind::Block { arguments, body } = &value.kind else {
        crate::bug!("analyze_recursive_block_definition called with a non-Block value");
    };
    env.define(name, Binding::Fixpoint { type_expression: Rc::new(value.clone()) });
    let lambda = analyze_block(arguments, body, value.position.clone(), env, Some(name))?;
    env.define(name, Binding::Local { ty: Type::Gradual, position: pos.clone() });
    Ok(Semantic::new(
        pos,
        Type::Gradual,
        SemanticKind::Alloca { name: Some(name), value_type: Type::Gradual, initial_value: Some(lambda) },
    ))
}

fn analyze_named_function_definition(
    name: Symbol,
    parameter_list: &Cst,
    result_type: Option<&Cst>,
    value: &Cst,
    pos: SourcePosition,
    env: &Rc<Env>,
) -> Result<Rc<Semantic>, Fault> {
    let binders = collect_binders(parameter_list);
    let lambda_arguments = build_lambda_arguments(&binders);
    let result_type_value = result_type.map(|_| Type::Gradual).unwrap_or(Type::Gradual);

    env.define(name, Binding::Fixpoint { type_expression: Rc::new(parameter_list.clone()) });
    let child = env.child(EnvKind::Lexical);
    for arg in &lambda_arguments {
        if let Some(arg_name) = arg.name {
            let binding = if arg.is_mutable {
                Binding::Local { ty: Type::Gradual, position: pos.clone() }
            } else {
                Binding::Argument { ty: Type::Gradual, position: pos.clone() }
            };
            child.define(arg_name, binding);
        }
    }
    let body = analyze(value, &child)?;
    env.define(name, Binding::Local { ty: Type::Gradual, position: pos.clone() });

    let def = LambdaDef { name: Some(name), arguments: lambda_arguments, body, result_type: result_type_value, is_macro: false };
    let lambda = Semantic::new(value.position.clone(), Type::Gradual, SemanticKind::Lambda(Rc::new(def)));
    Ok(Semantic::new(
        pos,
        Type::Gradual,
        SemanticKind::Alloca { name: Some(name), value_type: Type::Gradual, initial_value: Some(lambda) },
    ))
}

fn analyze_binary_sequence(first: &Cst, rest: &[(Symbol, Cst)], env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    let mut acc = analyze(first, env)?;
    for (op, operand_cst) in rest {
        let operand = analyze(operand_cst, env)?;
        let position = acc.position.to(&operand.position);
        let selector = Semantic::literal(position.clone(), Value::Symbol(*op));
        acc = Semantic::new(
            position,
            Type::Gradual,
            SemanticKind::MessageSend { receiver: Some(acc), selector, arguments: vec![operand] },
        );
    }
    Ok(acc)
}

/// Analyzes one branch of `if:then:[else:]`/`while:do:[continueWith:]`: a
/// literal zero-argument block's body is analyzed inline in a fresh lexical
/// scope; anything else is analyzed as-is. Either way the branch is only
/// ever evaluated by the evaluator when actually taken — laziness comes
/// from `Semantic` nodes not being walked until then, not from any special
/// wrapping here.
fn analyze_branch(cst: &Cst, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    match &cst.kind {
        CstKind::Block { body, .. } => analyze(body, &env.child(EnvKind::Lexical)),
        _ => analyze(cst, env),
    }
}

fn analyze_message_send(receiver: Option<&Cst>, selector: Symbol, arguments: &[Cst], pos: SourcePosition, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    if receiver.is_none() {
        match selector.as_str() {
            "if:then:" if arguments.len() == 2 => {
                let condition = analyze(&arguments[0], env)?;
                let true_case = analyze_branch(&arguments[1], env)?;
                return Ok(Semantic::new(
                    pos,
                    Type::Gradual,
                    SemanticKind::If { returns_value: false, condition, true_case: Some(true_case), false_case: None },
                ));
            }
            "if:then:else:" if arguments.len() == 3 => {
                let condition = analyze(&arguments[0], env)?;
                let true_case = analyze_branch(&arguments[1], env)?;
                let false_case = analyze_branch(&arguments[2], env)?;
                return Ok(Semantic::new(
                    pos,
                    Type::Gradual,
                    SemanticKind::If { returns_value: true, condition, true_case: Some(true_case), false_case: Some(false_case) },
                ));
            }
            "while:do:" if arguments.len() == 2 => {
                let condition = analyze_branch(&arguments[0], env)?;
                let body = analyze_branch(&arguments[1], env)?;
                return Ok(Semantic::new(pos, Type::Gradual, SemanticKind::While { condition, body, continue_action: None }));
            }
            "while:do:continueWith:" if arguments.len() == 3 => {
                let condition = analyze_branch(&arguments[0], env)?;
                let body = analyze_branch(&arguments[1], env)?;
                let continue_action = analyze_branch(&arguments[2], env)?;
                return Ok(Semantic::new(
                    pos,
                    Type::Gradual,
                    SemanticKind::While { condition, body, continue_action: Some(continue_action) },
                ));
            }
            _ => {
                if let Some(Binding::Value(Value::Macro(macro_value))) = env.lookup(selector) {
                    let expanded = (macro_value.expand)(&pos, arguments)?;
                    return analyze(&expanded, env);
                }
            }
        }
    }

    let receiver_semantic = receiver.map(|r| analyze(r, env)).transpose()?;
    let argument_semantics = arguments.iter().map(|a| analyze(a, env)).collect::<Result<Vec<_>, _>>()?;
    let selector_semantic = Semantic::literal(pos.clone(), Value::Symbol(selector));
    Ok(Semantic::new(
        pos,
        Type::Gradual,
        SemanticKind::MessageSend { receiver: receiver_semantic, selector: selector_semantic, arguments: argument_semantics },
    ))
}

/// Materializes the cascade's receiver exactly once: `Alloca` a hidden
/// gensym'd local, evaluate the receiver into it, then have every cascaded
/// message `Load` that local instead of re-walking the receiver's CST.
fn analyze_cascade(receiver: &Cst, messages: &[crate::cst::CascadeMessage], pos: SourcePosition, env: &Rc<Env>) -> Result<Rc<Semantic>, Fault> {
    let receiver_semantic = analyze(receiver, env)?;
    let temp = Symbol::gensym("cascade");
    let child = env.child(EnvKind::Lexical);
    child.define(temp, Binding::Local { ty: Type::Gradual, position: receiver.position.clone() });

    let mut statements = Vec::with_capacity(messages.len() + 1);
    statements.push(Semantic::new(
        receiver.position.clone(),
        Type::Gradual,
        SemanticKind::Alloca { name: Some(temp), value_type: Type::Gradual, initial_value: Some(receiver_semantic) },
    ));
    for message in messages {
        let target = Semantic::new(message.position.clone(), Type::Gradual, SemanticKind::IdentifierReference(temp));
        let loaded_receiver = Semantic::new(message.position.clone(), Type::Gradual, SemanticKind::Load(target));
        let argument_semantics = message.arguments.iter().map(|a| analyze(a, &child)).collect::<Result<Vec<_>, _>>()?;
        let selector_semantic = Semantic::literal(message.position.clone(), Value::Symbol(message.selector));
        statements.push(Semantic::new(
            message.position.clone(),
            Type::Gradual,
            SemanticKind::MessageSend { receiver: Some(loaded_receiver), selector: selector_semantic, arguments: argument_semantics },
        ));
    }
    let ty = statements.last().unwrap().ty.clone();
    Ok(Semantic::new(pos, ty, SemanticKind::Sequence(statements)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{intrinsics, parse::parse, scanner::scan, source::SourceBuffer};

    fn analyze_str(text: &str) -> Rc<Semantic> {
        let cst = parse(scan(SourceBuffer::new("", "t", "sysmel", text)));
        analyze_program(&cst, &intrinsics::root_env()).unwrap()
    }

    #[test]
    fn integer_literal_analyzes_to_a_literal_value() {
        let sem = analyze_str("42");
        assert!(matches!(sem.kind, SemanticKind::Literal(Value::Integer(_))));
    }

    #[test]
    fn unknown_identifier_is_a_semantic_error() {
        let cst = parse(scan(SourceBuffer::new("", "t", "sysmel", "zzz")));
        let err = analyze_program(&cst, &intrinsics::root_env()).unwrap_err();
        assert_eq!(err.kind, crate::diagnostics::FaultKind::Semantic);
    }

    #[test]
    fn fresh_assignment_declares_a_local_as_an_alloca() {
        let sem = analyze_str("x := 5");
        assert!(matches!(sem.kind, SemanticKind::Alloca { initial_value: Some(_), .. }));
    }

    #[test]
    fn reassigning_a_declared_local_produces_a_store() {
        let sem = analyze_str("x := 5. x := 6");
        match &sem.kind {
            SemanticKind::Sequence(stmts) => assert!(matches!(stmts[1].kind, SemanticKind::Store { .. })),
            other => panic!("expected Sequence, got {other:?}"),
        }
    }

    #[test]
    fn if_then_else_builds_an_if_node_with_both_branches() {
        let sem = analyze_str("if: 1 = 1 then: [10] else: [20]");
        assert!(matches!(sem.kind, SemanticKind::If { returns_value: true, true_case: Some(_), false_case: Some(_), .. }));
    }

    #[test]
    fn binary_sequence_left_folds_into_nested_sends() {
        let sem = analyze_str("2 + 3 * 4");
        match &sem.kind {
            SemanticKind::MessageSend { receiver: Some(r), .. } => {
                assert!(matches!(r.kind, SemanticKind::MessageSend { .. }));
            }
            other => panic!("expected outer MessageSend, got {other:?}"),
        }
    }

    #[test]
    fn cascade_materializes_receiver_once_via_alloca_and_load() {
        let sem = analyze_str("x := 1. x foo; bar");
        match &sem.kind {
            SemanticKind::Sequence(stmts) => match &stmts[1].kind {
                SemanticKind::Sequence(cascade_stmts) => {
                    assert!(matches!(cascade_stmts[0].kind, SemanticKind::Alloca { .. }));
                    assert_eq!(cascade_stmts.len(), 3);
                }
                other => panic!("expected nested cascade Sequence, got {other:?}"),
            },
            other => panic!("expected Sequence, got {other:?}"),
        }
    }
}
