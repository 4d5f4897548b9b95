// crates/sentinel-gate-config/src/model.rs
// ============================================================================
// Module: Sentinel Gate Policy Document Model
// Description: Raw serde-facing shape of the YAML policy file.
// Purpose: Make unknown operators, actions, and fields load-time errors.
// Dependencies: serde, serde_yaml
// ============================================================================

//! ## Overview
//! The raw model mirrors the policy file exactly as written. Every enum is
//! closed and every struct denies unknown fields, so a typo in an operator or
//! action name fails deserialization instead of silently weakening the
//! policy. Compilation into the engine's runtime types happens in
//! [`crate::loader`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;

use sentinel_gate_core::MatchMode;

// ============================================================================
// SECTION: Policy Document
// ============================================================================

/// Root of the YAML policy document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPolicyFile {
    /// Rules in declaration order. Declaration order is evaluation order.
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

/// One rule as written in the policy file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRule {
    /// Rule identifier, unique within the file.
    pub id: String,
    /// Optional human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Tool-name pattern, exact or glob (`query_*`).
    pub target_tool: String,
    /// Dotted path into the tool arguments object.
    pub target_argument: String,
    /// How condition outcomes combine; defaults to `all`.
    #[serde(rename = "match", default)]
    pub match_mode: MatchMode,
    /// Conditions evaluated against the selected argument value.
    #[serde(default)]
    pub conditions: Vec<RawCondition>,
    /// Action applied when the rule matches.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub action: RawAction,
}

// ============================================================================
// SECTION: Conditions
// ============================================================================

/// One condition as written in the policy file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCondition {
    /// Optional dotted field reference inside the selected argument value.
    #[serde(default)]
    pub field: Option<String>,
    /// Operator name; unknown names fail deserialization.
    pub operator: RawOperator,
    /// Comparison value. Requirements are operator-specific and enforced at
    /// compile time.
    #[serde(default)]
    pub value: Option<serde_yaml::Value>,
    /// Case-insensitive comparison flag for string operators.
    #[serde(default)]
    pub ignore_case: bool,
}

/// Closed set of operator names accepted in policy files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawOperator {
    /// Input equals the literal value.
    Equals,
    /// Input differs from the literal value.
    NotEquals,
    /// Input contains the literal value.
    Contains,
    /// Input does not contain the literal value.
    NotContains,
    /// Input matches the regex in `value`.
    Regex,
    /// SQL-like input carries no `LIMIT <n>` clause; takes no value.
    MissingLimit,
    /// Numeric input is strictly greater than the bound.
    GreaterThan,
    /// Numeric input is greater than or equal to the bound.
    GreaterThanOrEqual,
    /// Numeric input is strictly less than the bound.
    LessThan,
    /// Numeric input is less than or equal to the bound.
    LessThanOrEqual,
}

impl RawOperator {
    /// Stable operator name as written in policy files.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::Regex => "regex",
            Self::MissingLimit => "missing_limit",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThan => "less_than",
            Self::LessThanOrEqual => "less_than_or_equal",
        }
    }
}

// ============================================================================
// SECTION: Actions
// ============================================================================

/// Closed set of actions accepted in policy files.
///
/// Externally tagged: `allow` and `log` are bare strings, `block` and
/// `allow_with_approval` carry a mapping.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum RawAction {
    /// Forward the message unchanged.
    Allow,
    /// Forward the message and emit an audit entry.
    Log,
    /// Reject the message with a protocol-level error.
    Block {
        /// Human-readable block reason.
        #[serde(default)]
        reason: Option<String>,
    },
    /// Suspend the message pending a human approve/deny decision.
    AllowWithApproval {
        /// Approval wait in seconds; the loader default applies when absent.
        #[serde(default)]
        timeout_secs: Option<u64>,
        /// Approver identities, surfaced in notifications only.
        #[serde(default)]
        approvers: Vec<String>,
    },
}
