//! A bootstrap interpreter for a small Smalltalk-flavoured, dependently-typed
//! expression language.
//!
//! The pipeline is strictly top-down, one phase feeding the next:
//! [`source`] text -> [`scanner`] tokens -> [`parse`] concrete syntax tree
//! ([`cst`]) -> [`analyzer`] semantic tree ([`semantic`]) -> [`eval`]
//! evaluator, against the [`value`] universe ([`object`] model, [`types`]
//! universe, [`numeric`] stack, [`intern`]ed symbols) that [`intrinsics`]
//! bootstraps once per process. [`diagnostics`] carries positioned failures
//! the pipeline's later phases raise; lexical and syntactic failures never
//! raise — they're reified as CST nodes and collected by [`run_source`]
//! before analysis ever begins.

#![expect(clippy::cast_possible_truncation, reason = "numeric narrowing is checked at each call site")]
#![expect(clippy::cast_sign_loss, reason = "sign-changing casts are intentional in the numeric stack")]
#![expect(clippy::cast_possible_wrap, reason = "wrap behavior mirrors the width-truncation contract")]

mod analyzer;
mod cst;
mod diagnostics;
mod env;
mod eval;
mod intern;
mod intrinsics;
mod numeric;
mod object;
mod parse;
mod scanner;
mod semantic;
mod source;
mod token;
mod types;
mod value;

pub use crate::{
    cst::{Cst, CstKind},
    diagnostics::{Fault, FaultKind},
    intern::Symbol,
    numeric::Integer,
    object::{ClassObj, Instance, Method},
    source::{SourceBuffer, SourcePosition},
    types::Type,
    value::Value,
};

/// Runs one complete source buffer end to end: scan, parse, reject if any
/// `SyntaxError` node survived parsing, analyze against the intrinsics root
/// environment, then evaluate. This is the entry point the `lodestone-cli`
/// driver's `-ep`/file-path modes both call through (spec.md §6); embedders
/// that need the intermediate CST or semantic tree should call the phase
/// functions directly instead.
///
/// # Errors
/// Returns the first collected `SyntaxError`'s message, formatted as the
/// one-line diagnostic contract, if the source doesn't parse cleanly.
/// Otherwise returns a [`Fault`] for any semantic, type, dispatch, or
/// arithmetic failure encountered during analysis or evaluation.
pub fn run_source(buffer: std::rc::Rc<SourceBuffer>) -> Result<Value, String> {
    let tokens = scanner::scan(buffer);
    let tree = parse::parse(tokens);

    let mut errors = Vec::new();
    tree.collect_syntax_errors(&mut errors);
    if let Some(first) = errors.first() {
        let CstKind::SyntaxError { message, .. } = &first.kind else {
            unreachable!("collect_syntax_errors only ever collects SyntaxError nodes");
        };
        return Err(format!("{}: {}", first.position.format(), message));
    }

    let semantic = analyzer::analyze_program(&tree, &intrinsics::root_env()).map_err(|fault| fault.format())?;
    eval::evaluate_program(&semantic).map_err(|fault| fault.format())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> Result<Value, String> {
        run_source(SourceBuffer::new("", "t", "sysmel", text))
    }

    #[test]
    fn end_to_end_scenarios_from_the_external_interface_contract() {
        assert_eq!(run("42").unwrap().print_string(), "42");
        assert_eq!(run("2 + 3 * 4").unwrap().print_string(), "20");
        assert_eq!(run("if: 1 = 1 then: 10 else: 20").unwrap().print_string(), "10");
        assert_eq!(run("16rFF").unwrap().print_string(), "255");
        assert_eq!(run(r#""ab\nc""#).unwrap().print_string(), "\"ab\\nc\"");
        assert_eq!(run("Integer").unwrap().print_string(), "Integer");
        assert_eq!(run("#foo == #foo").unwrap().print_string(), "true");
    }

    #[test]
    fn unterminated_block_comment_is_a_syntax_error_spanning_to_eof() {
        let err = run("#* never closes").unwrap_err();
        assert!(err.contains("Unterminated block comment"));
    }
}
