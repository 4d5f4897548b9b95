// crates/sentinel-gate-core/tests/condition_unit.rs
// ============================================================================
// Module: Condition Evaluator Unit Tests
// Description: Operator matrix, missing-field policies, and regex stability.
// Purpose: Validate that condition evaluation is total and load-validated.
// Dependencies: sentinel-gate-core, serde_json
// ============================================================================

//! ## Overview
//! Exercises every [`sentinel_gate_core::ConditionKind`] operator, the
//! per-operator missing-field policies, the regex input-length bound, and the
//! guarantee that case-insensitive matching never alters a compiled pattern.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use sentinel_gate_core::ArgumentPath;
use sentinel_gate_core::Condition;
use sentinel_gate_core::ConditionKind;
use sentinel_gate_core::MAX_CONDITION_INPUT_BYTES;
use serde_json::json;

// ============================================================================
// SECTION: Helper Functions
// ============================================================================

fn equals(value: &str, ignore_case: bool) -> Condition {
    Condition::on_value(ConditionKind::Equals {
        value: value.to_owned(),
        ignore_case,
    })
}

fn contains(value: &str, ignore_case: bool) -> Condition {
    Condition::on_value(ConditionKind::Contains {
        value: value.to_owned(),
        ignore_case,
    })
}

fn not_contains(value: &str, ignore_case: bool) -> Condition {
    Condition::on_value(ConditionKind::NotContains {
        value: value.to_owned(),
        ignore_case,
    })
}

fn regex(pattern: &str, ignore_case: bool) -> Condition {
    Condition::on_value(ConditionKind::regex(pattern, ignore_case).unwrap())
}

// ============================================================================
// SECTION: String Operators
// ============================================================================

#[test]
fn contains_matches_substring() {
    assert!(contains("SELECT", false).evaluate(&json!("SELECT * FROM users")));
}

#[test]
fn contains_rejects_absent_substring() {
    assert!(!contains("DELETE", false).evaluate(&json!("SELECT * FROM users")));
}

#[test]
fn contains_folds_case_when_requested() {
    assert!(contains("select", true).evaluate(&json!("SELECT * FROM users")));
    assert!(!contains("select", false).evaluate(&json!("SELECT * FROM users")));
}

#[test]
fn not_contains_matches_when_value_absent() {
    assert!(not_contains("LIMIT", false).evaluate(&json!("SELECT * FROM users")));
    assert!(!not_contains("SELECT", false).evaluate(&json!("SELECT * FROM users")));
}

#[test]
fn equals_requires_exact_match() {
    assert!(equals("DROP TABLE", false).evaluate(&json!("DROP TABLE")));
    assert!(!equals("DROP TABLE", false).evaluate(&json!("DROP TABLE users")));
}

#[test]
fn equals_folds_case_when_requested() {
    assert!(equals("drop table", true).evaluate(&json!("DROP TABLE")));
}

#[test]
fn not_equals_inverts_equality() {
    let condition = Condition::on_value(ConditionKind::NotEquals {
        value: "safe".to_owned(),
        ignore_case: false,
    });
    assert!(condition.evaluate(&json!("unsafe")));
    assert!(!condition.evaluate(&json!("safe")));
}

#[test]
fn numeric_input_compares_as_text_for_string_operators() {
    assert!(equals("42", false).evaluate(&json!(42)));
}

// ============================================================================
// SECTION: Regex Operator
// ============================================================================

#[test]
fn regex_matches_pattern() {
    assert!(regex(r"SELECT\s+\*\s+FROM", false).evaluate(&json!("SELECT * FROM users")));
}

#[test]
fn regex_rejects_non_matching_input() {
    assert!(!regex(r"^DELETE", false).evaluate(&json!("SELECT * FROM users")));
}

#[test]
fn regex_case_insensitivity_preserves_pattern_source() {
    // `\s` must stay `\s` under case-insensitive matching; folding the
    // pattern would turn it into the complement class `\S`.
    let condition = regex(r"\s+limit", true);
    assert!(condition.evaluate(&json!("SELECT * FROM t LIMIT 5")));
    assert!(condition.evaluate(&json!("select * from t Limit 5")));
    assert!(!condition.evaluate(&json!("no-whitespace-here")));
}

#[test]
fn regex_invalid_pattern_fails_at_construction() {
    assert!(ConditionKind::regex(r"[invalid(", false).is_err());
}

#[test]
fn regex_rejects_oversized_input() {
    let oversized = "a".repeat(MAX_CONDITION_INPUT_BYTES + 1);
    assert!(!regex("a", false).evaluate(&json!(oversized)));
}

// ============================================================================
// SECTION: Domain and Numeric Operators
// ============================================================================

#[test]
fn missing_limit_matches_unbounded_query() {
    let condition = Condition::on_value(ConditionKind::MissingLimit);
    assert!(condition.evaluate(&json!("SELECT * FROM users")));
}

#[test]
fn missing_limit_rejects_bounded_query_any_case() {
    let condition = Condition::on_value(ConditionKind::MissingLimit);
    assert!(!condition.evaluate(&json!("SELECT id FROM users LIMIT 10")));
    assert!(!condition.evaluate(&json!("select id from users limit 10")));
}

#[test]
fn numeric_comparisons_accept_numbers_and_numeric_strings() {
    let above = Condition::on_value(ConditionKind::GreaterThan {
        value: 10.0,
    });
    assert!(above.evaluate(&json!(11)));
    assert!(above.evaluate(&json!("12.5")));
    assert!(!above.evaluate(&json!(10)));
    assert!(!above.evaluate(&json!("not a number")));
}

#[test]
fn numeric_bounds_are_inclusive_only_for_or_equal_variants() {
    let at_most = Condition::on_value(ConditionKind::LessThanOrEqual {
        value: 3.0,
    });
    let below = Condition::on_value(ConditionKind::LessThan {
        value: 3.0,
    });
    assert!(at_most.evaluate(&json!(3)));
    assert!(!below.evaluate(&json!(3)));
}

// ============================================================================
// SECTION: Missing-Field Policies
// ============================================================================

#[test]
fn missing_field_matches_only_negated_operators() {
    let argument = json!({"other": "value"});
    let field = ArgumentPath::parse("absent");

    let positive = Condition::on_field(field.clone(), ConditionKind::Contains {
        value: "x".to_owned(),
        ignore_case: false,
    });
    let negated = Condition::on_field(field.clone(), ConditionKind::NotContains {
        value: "x".to_owned(),
        ignore_case: false,
    });
    let limit = Condition::on_field(field, ConditionKind::MissingLimit);

    assert!(!positive.evaluate(&argument));
    assert!(negated.evaluate(&argument));
    assert!(limit.evaluate(&argument));
}

#[test]
fn nested_field_reference_resolves_dotted_path() {
    let argument = json!({"options": {"mode": "fast"}});
    let condition = Condition::on_field(ArgumentPath::parse("options.mode"), ConditionKind::Equals {
        value: "fast".to_owned(),
        ignore_case: false,
    });
    assert!(condition.evaluate(&argument));
}

#[test]
fn non_scalar_value_follows_missing_policy_for_string_operators() {
    let condition = contains("x", false);
    assert!(!condition.evaluate(&json!({"nested": "x"})));
    assert!(!condition.evaluate(&json!(["x"])));
}
