use lodestone::{run_source, SourceBuffer};

fn run(text: &str) -> Result<String, String> {
    run_source(SourceBuffer::new("", "test", "sysmel", text)).map(|v| v.print_string())
}

#[test]
fn integer_literal_prints_itself() {
    assert_eq!(run("42").unwrap(), "42");
}

#[test]
fn binary_messages_are_left_to_right_with_no_precedence() {
    assert_eq!(run("2 + 3 * 4").unwrap(), "20");
}

#[test]
fn keyword_if_then_else_selects_the_true_branch() {
    assert_eq!(run("if: 1 = 1 then: 10 else: 20").unwrap(), "10");
}

#[test]
fn radix_integer_literal_parses_in_the_given_base() {
    assert_eq!(run("16rFF").unwrap(), "255");
}

#[test]
fn string_literal_round_trips_with_escapes_preserved() {
    assert_eq!(run(r#""ab\nc""#).unwrap(), "\"ab\\nc\"");
}

#[test]
fn a_class_prints_its_own_name() {
    assert_eq!(run("Integer").unwrap(), "Integer");
}

#[test]
fn identity_equality_on_symbols() {
    assert_eq!(run("#foo == #foo").unwrap(), "true");
}

#[test]
fn unterminated_block_comment_reports_a_diagnostic_spanning_to_eof() {
    let err = run("1 + 2 #* never closes").unwrap_err();
    assert!(err.contains("Unterminated block comment"), "got: {err}");
}

#[test]
fn unknown_identifier_is_a_reported_semantic_failure_not_a_panic() {
    let err = run("thisNameIsNotBound").unwrap_err();
    assert!(err.contains("test:"), "diagnostic should carry the buffer name, got: {err}");
}

#[test]
fn division_by_zero_is_a_reported_arithmetic_failure() {
    assert!(run("1 // 0").is_err());
}

#[test]
fn truncating_division_and_remainder_satisfy_the_division_identity() {
    assert_eq!(run("(7 // 2) * 2 + (7 \\\\ 2)").unwrap(), "7");
    assert_eq!(run("((0 - 7) // 2) * 2 + ((0 - 7) \\\\ 2)").unwrap(), "-7");
}

#[test]
fn a_sequence_evaluates_every_statement_and_yields_the_last() {
    assert_eq!(run("1. 2. 3").unwrap(), "3");
}

#[test]
fn a_block_literal_can_be_applied_with_arguments() {
    assert_eq!(run("[:x :y | x + y] value: 3 value: 4").unwrap(), "7");
}

#[test]
fn a_while_loop_runs_to_completion_and_mutates_through_a_box() {
    assert_eq!(run("i := 0. while: [i < 5] do: [i := i + 1]. i").unwrap(), "5");
}

#[test]
fn basic_new_on_an_intrinsic_class_produces_an_instance() {
    assert_eq!(run("Object basicNew class").unwrap(), "Object");
}

#[test]
fn cascaded_messages_share_one_materialized_receiver() {
    // `size` on an Array is stable across a cascade; this exercises that the
    // cascade's hidden receiver temp is installed once, not re-evaluated
    // per message.
    assert_eq!(run("#(1 2 3) size; size").unwrap(), "3");
}
