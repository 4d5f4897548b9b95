// crates/sentinel-gate-core/src/condition.rs
// ============================================================================
// Module: Sentinel Gate Conditions
// Description: Condition operators evaluated against tool-argument values.
// Purpose: Provide a total, load-time-validated condition evaluator.
// Dependencies: crate::message, regex, thiserror
// ============================================================================

//! ## Overview
//! Conditions compare a field of the selected argument value against a
//! comparison value. Operators form a closed enum so an invalid operator is a
//! policy-load error, never an evaluation-time surprise. Evaluation is a total
//! function: a missing field resolves through an explicit per-operator policy
//! instead of failing.
//!
//! Regex patterns are compiled once at rule load. Case-insensitive matching
//! normalizes only the runtime input and literal comparison values; a regex
//! source is never case-folded, since folding corrupts escape sequences
//! (`\s` is not `\S`). Inputs longer than [`MAX_CONDITION_INPUT_BYTES`] are
//! rejected as non-matching to bound worst-case matching cost.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use regex::RegexBuilder;
use serde_json::Value;
use thiserror::Error;

use crate::message::ArgumentPath;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum input length, in bytes, accepted by pattern-based operators.
///
/// Longer inputs evaluate as non-matching rather than being scanned.
pub const MAX_CONDITION_INPUT_BYTES: usize = 10_000;

/// Detects a `LIMIT <n>` clause in SQL-like text, case-insensitively.
static LIMIT_CLAUSE: LazyLock<Option<Regex>> =
    LazyLock::new(|| RegexBuilder::new(r"\blimit\s+\d+").case_insensitive(true).build().ok());

// ============================================================================
// SECTION: Condition Errors
// ============================================================================

/// Errors raised while constructing a condition.
///
/// # Invariants
/// - Raised at policy-load time only; evaluation never fails.
#[derive(Debug, Error)]
pub enum ConditionError {
    /// Regex pattern failed to compile.
    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        /// Pattern source text as written in the policy.
        pattern: String,
        /// Underlying compile error.
        #[source]
        source: Box<regex::Error>,
    },
}

// ============================================================================
// SECTION: Condition Kinds
// ============================================================================

/// Closed set of condition operators.
///
/// # Invariants
/// - Every variant defines its own missing-field policy (see
///   [`ConditionKind::matches_missing`]).
#[derive(Debug, Clone)]
pub enum ConditionKind {
    /// Input equals the literal value.
    Equals {
        /// Literal comparison value.
        value: String,
        /// Case-insensitive comparison flag.
        ignore_case: bool,
    },
    /// Input differs from the literal value.
    NotEquals {
        /// Literal comparison value.
        value: String,
        /// Case-insensitive comparison flag.
        ignore_case: bool,
    },
    /// Input contains the literal value as a substring.
    Contains {
        /// Literal comparison value.
        value: String,
        /// Case-insensitive comparison flag.
        ignore_case: bool,
    },
    /// Input does not contain the literal value.
    NotContains {
        /// Literal comparison value.
        value: String,
        /// Case-insensitive comparison flag.
        ignore_case: bool,
    },
    /// Input matches a precompiled regex.
    Regex {
        /// Compiled pattern; case-insensitivity is baked into the compile.
        pattern: Regex,
    },
    /// SQL-like input carries no `LIMIT <n>` clause.
    MissingLimit,
    /// Numeric input is strictly greater than the bound.
    GreaterThan {
        /// Comparison bound.
        value: f64,
    },
    /// Numeric input is greater than or equal to the bound.
    GreaterThanOrEqual {
        /// Comparison bound.
        value: f64,
    },
    /// Numeric input is strictly less than the bound.
    LessThan {
        /// Comparison bound.
        value: f64,
    },
    /// Numeric input is less than or equal to the bound.
    LessThanOrEqual {
        /// Comparison bound.
        value: f64,
    },
}

impl ConditionKind {
    /// Compiles a regex operator from its policy-file source.
    ///
    /// Case-insensitivity is applied through the builder flag so the pattern
    /// source text is preserved byte for byte.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::InvalidRegex`] when the pattern does not
    /// compile.
    pub fn regex(pattern: &str, ignore_case: bool) -> Result<Self, ConditionError> {
        let compiled = RegexBuilder::new(pattern).case_insensitive(ignore_case).build().map_err(
            |source| ConditionError::InvalidRegex {
                pattern: pattern.to_owned(),
                source: Box::new(source),
            },
        )?;
        Ok(Self::Regex {
            pattern: compiled,
        })
    }

    /// Missing-field outcome for this operator.
    ///
    /// Negated operators and the missing-limit check match on absence; every
    /// other operator does not.
    #[must_use]
    pub const fn matches_missing(&self) -> bool {
        matches!(
            self,
            Self::NotEquals {
                ..
            } | Self::NotContains {
                ..
            } | Self::MissingLimit
        )
    }

    /// Evaluates the operator against a present JSON value.
    #[must_use]
    fn matches_value(&self, value: &Value) -> bool {
        match self {
            Self::Equals {
                value: target,
                ignore_case,
            } => as_text(value).is_some_and(|input| fold_eq(&input, target, *ignore_case)),
            Self::NotEquals {
                value: target,
                ignore_case,
            } => !as_text(value).is_some_and(|input| fold_eq(&input, target, *ignore_case)),
            Self::Contains {
                value: target,
                ignore_case,
            } => as_text(value).is_some_and(|input| fold_contains(&input, target, *ignore_case)),
            Self::NotContains {
                value: target,
                ignore_case,
            } => !as_text(value).is_some_and(|input| fold_contains(&input, target, *ignore_case)),
            Self::Regex {
                pattern,
            } => as_text(value)
                .is_some_and(|input| within_bound(&input) && pattern.is_match(&input)),
            Self::MissingLimit => as_text(value).is_some_and(|input| {
                within_bound(&input)
                    && LIMIT_CLAUSE.as_ref().is_none_or(|clause| !clause.is_match(&input))
            }),
            Self::GreaterThan {
                value: bound,
            } => as_number(value).is_some_and(|input| input > *bound),
            Self::GreaterThanOrEqual {
                value: bound,
            } => as_number(value).is_some_and(|input| input >= *bound),
            Self::LessThan {
                value: bound,
            } => as_number(value).is_some_and(|input| input < *bound),
            Self::LessThanOrEqual {
                value: bound,
            } => as_number(value).is_some_and(|input| input <= *bound),
        }
    }

    /// Stable operator label used in errors and audit output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Equals {
                ..
            } => "equals",
            Self::NotEquals {
                ..
            } => "not_equals",
            Self::Contains {
                ..
            } => "contains",
            Self::NotContains {
                ..
            } => "not_contains",
            Self::Regex {
                ..
            } => "regex",
            Self::MissingLimit => "missing_limit",
            Self::GreaterThan {
                ..
            } => "greater_than",
            Self::GreaterThanOrEqual {
                ..
            } => "greater_than_or_equal",
            Self::LessThan {
                ..
            } => "less_than",
            Self::LessThanOrEqual {
                ..
            } => "less_than_or_equal",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Conditions
// ============================================================================

/// A single condition attached to a policy rule.
///
/// # Invariants
/// - `field`, when present, is resolved inside the value selected by the
///   rule's target argument path; when absent the whole value is compared.
#[derive(Debug, Clone)]
pub struct Condition {
    /// Optional field reference inside the selected argument value.
    pub field: Option<ArgumentPath>,
    /// Operator and comparison value.
    pub kind: ConditionKind,
}

impl Condition {
    /// Builds a condition that compares the whole selected value.
    #[must_use]
    pub const fn on_value(kind: ConditionKind) -> Self {
        Self {
            field: None,
            kind,
        }
    }

    /// Builds a condition that compares a field inside the selected value.
    #[must_use]
    pub const fn on_field(field: ArgumentPath, kind: ConditionKind) -> Self {
        Self {
            field: Some(field),
            kind,
        }
    }

    /// Evaluates the condition against the selected argument value.
    ///
    /// Total function: a missing field reference resolves through the
    /// operator's missing-field policy.
    #[must_use]
    pub fn evaluate(&self, argument: &Value) -> bool {
        let resolved = match &self.field {
            Some(path) => path.resolve_value(argument),
            None => Some(argument),
        };
        match resolved {
            Some(value) => self.kind.matches_value(value),
            None => self.kind.matches_missing(),
        }
    }
}

// ============================================================================
// SECTION: Value Coercion
// ============================================================================

/// Renders a scalar JSON value as comparable text.
///
/// Objects, arrays, and null have no text form; string operators treat them
/// like a missing field.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Extracts a numeric view of a JSON value for comparison operators.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Equality with optional case folding of input and literal only.
fn fold_eq(input: &str, target: &str, ignore_case: bool) -> bool {
    if ignore_case {
        input.to_uppercase() == target.to_uppercase()
    } else {
        input == target
    }
}

/// Substring check with optional case folding of input and literal only.
fn fold_contains(input: &str, target: &str, ignore_case: bool) -> bool {
    if ignore_case {
        input.to_uppercase().contains(&target.to_uppercase())
    } else {
        input.contains(target)
    }
}

/// Length gate applied before pattern-based evaluation.
const fn within_bound(input: &str) -> bool {
    input.len() <= MAX_CONDITION_INPUT_BYTES
}
