// crates/sentinel-gate-core/src/rule.rs
// ============================================================================
// Module: Sentinel Gate Rules
// Description: Policy rules, actions, and the immutable rule-set snapshot.
// Purpose: Model the ordered, first-match-wins policy declaration.
// Dependencies: crate::{condition, message}, globset, serde, thiserror
// ============================================================================

//! ## Overview
//! Rules are ordered: the first fully matching rule wins and later rules are
//! never consulted. Each rule names a tool pattern (exact or glob), a target
//! argument path whose existence is a precondition, a condition list, and an
//! action. [`RuleSet`] is the immutable snapshot the policy engine swaps
//! atomically on reload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use globset::Glob;
use globset::GlobMatcher;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::condition::Condition;
use crate::message::ArgumentPath;

// ============================================================================
// SECTION: Rule Identifiers
// ============================================================================

/// Rule identifier referenced by audit entries and decisions.
///
/// # Invariants
/// - Opaque UTF-8 string; unique within a rule set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Creates a new rule identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RuleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RuleId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Tool Patterns
// ============================================================================

/// Errors raised while compiling a tool pattern.
#[derive(Debug, Error)]
pub enum ToolPatternError {
    /// Glob pattern failed to compile.
    #[error("invalid tool pattern '{pattern}': {source}")]
    InvalidGlob {
        /// Pattern source text as written in the policy.
        pattern: String,
        /// Underlying glob compile error.
        #[source]
        source: Box<globset::Error>,
    },
}

/// Tool-name matcher supporting exact names and glob wildcards.
///
/// # Invariants
/// - Compiled once at rule load; matching allocates nothing.
#[derive(Debug, Clone)]
pub struct ToolPattern {
    /// Compiled glob matcher.
    matcher: GlobMatcher,
    /// Original pattern text, kept for display and auditing.
    source: String,
}

impl ToolPattern {
    /// Compiles a tool pattern such as `query_database` or `query_*`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolPatternError::InvalidGlob`] when the pattern does not
    /// compile.
    pub fn new(pattern: &str) -> Result<Self, ToolPatternError> {
        let glob = Glob::new(pattern).map_err(|source| ToolPatternError::InvalidGlob {
            pattern: pattern.to_owned(),
            source: Box::new(source),
        })?;
        Ok(Self {
            matcher: glob.compile_matcher(),
            source: pattern.to_owned(),
        })
    }

    /// Returns `true` when the pattern matches the tool name.
    #[must_use]
    pub fn matches(&self, tool_name: &str) -> bool {
        self.matcher.is_match(tool_name)
    }

    /// Returns the original pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for ToolPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.source.fmt(f)
    }
}

// ============================================================================
// SECTION: Actions
// ============================================================================

/// Action applied when a rule matches.
///
/// # Invariants
/// - Variants form a closed set; an unknown action is a policy-load error.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Forward the message unchanged.
    Allow,
    /// Forward the message and emit an audit entry.
    Log,
    /// Reject the message with a protocol-level error.
    Block {
        /// Human-readable block reason; falls back to the rule id when absent.
        reason: Option<String>,
    },
    /// Suspend the message pending a human approve/deny decision.
    AllowWithApproval {
        /// How long to wait before the request expires.
        timeout: Duration,
        /// Approver identities, surfaced in notifications only.
        approvers: Vec<String>,
    },
}

impl Action {
    /// Stable action label used in audit output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Log => "log",
            Self::Block {
                ..
            } => "block",
            Self::AllowWithApproval {
                ..
            } => "allow_with_approval",
        }
    }
}

// ============================================================================
// SECTION: Match Mode
// ============================================================================

/// How a rule combines its condition outcomes.
///
/// # Invariants
/// - `All` over an empty condition list matches unconditionally; `Any` over an
///   empty list never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Every condition must match (conjunctive).
    All,
    /// At least one condition must match.
    Any,
}

impl MatchMode {
    /// Folds condition outcomes according to the mode.
    #[must_use]
    pub fn combine(self, outcomes: impl IntoIterator<Item = bool>) -> bool {
        match self {
            Self::All => outcomes.into_iter().all(|outcome| outcome),
            Self::Any => outcomes.into_iter().any(|outcome| outcome),
        }
    }
}

impl Default for MatchMode {
    fn default() -> Self {
        Self::All
    }
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// A declarative policy rule.
///
/// # Invariants
/// - Declaration order is evaluation order; the first full match wins.
/// - Existence of `argument` in the message is a precondition: a missing path
///   skips the rule, it never counts as a condition outcome.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Rule identifier.
    pub id: RuleId,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// Tool-name pattern gating the rule.
    pub tool: ToolPattern,
    /// Target argument path whose existence gates the rule.
    pub argument: ArgumentPath,
    /// How condition outcomes combine.
    pub match_mode: MatchMode,
    /// Conditions evaluated against the selected argument value.
    pub conditions: Vec<Condition>,
    /// Action applied when the rule matches.
    pub action: Action,
}

// ============================================================================
// SECTION: Rule Sets
// ============================================================================

/// Immutable ordered rule collection.
///
/// # Invariants
/// - Never mutated after construction; reload swaps whole snapshots.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    /// Rules in declaration order.
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates a rule set from ordered rules.
    #[must_use]
    pub const fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
        }
    }

    /// Creates an empty, allow-all rule set.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            rules: Vec::new(),
        }
    }

    /// Number of rules in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when the snapshot holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
