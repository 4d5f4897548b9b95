// crates/sentinel-gate-core/src/engine.rs
// ============================================================================
// Module: Sentinel Gate Policy Engine
// Description: First-match-wins rule evaluation over an atomic snapshot.
// Purpose: Map a tool invocation to the action of the first matching rule.
// Dependencies: crate::rule, arc-swap, serde_json
// ============================================================================

//! ## Overview
//! The policy engine holds the active [`RuleSet`] behind an
//! [`arc_swap::ArcSwap`]. Each evaluation dereferences the snapshot exactly
//! once and runs against that single consistent version; `reload` swaps the
//! reference atomically without disturbing evaluations already in flight.
//!
//! Evaluation order per rule: tool pattern, then argument-path existence,
//! then conditions. A missing argument path skips the rule. When no rule
//! matches, the default action is allow.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Map;
use serde_json::Value;

use crate::rule::Action;
use crate::rule::MatchMode;
use crate::rule::Rule;
use crate::rule::RuleId;
use crate::rule::RuleSet;

// ============================================================================
// SECTION: Policy Decisions
// ============================================================================

/// Outcome of a policy evaluation.
///
/// # Invariants
/// - `rule_id` is `None` exactly when the default allow applied.
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    /// Action selected by the first matching rule, or the default allow.
    pub action: Action,
    /// Identifier of the matching rule, when one matched.
    pub rule_id: Option<RuleId>,
}

impl PolicyDecision {
    /// Default decision applied when no rule matches.
    #[must_use]
    pub const fn default_allow() -> Self {
        Self {
            action: Action::Allow,
            rule_id: None,
        }
    }
}

// ============================================================================
// SECTION: Policy Engine
// ============================================================================

/// Thread-safe policy evaluator with hot-reloadable rule snapshots.
#[derive(Debug)]
pub struct PolicyEngine {
    /// Active rule-set snapshot; swapped atomically on reload.
    active: ArcSwap<RuleSet>,
}

impl PolicyEngine {
    /// Creates an engine serving the provided initial snapshot.
    #[must_use]
    pub fn new(initial: RuleSet) -> Self {
        Self {
            active: ArcSwap::from_pointee(initial),
        }
    }

    /// Atomically replaces the active snapshot.
    ///
    /// Evaluations in flight keep reading the snapshot they loaded; new
    /// evaluations observe the replacement.
    pub fn reload(&self, next: RuleSet) {
        self.active.store(Arc::new(next));
    }

    /// Returns the active snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.active.load_full()
    }

    /// Evaluates a tool invocation against the active snapshot.
    ///
    /// First-match-wins: rules are consulted in declaration order and the
    /// first full match decides. No match yields the default allow.
    #[must_use]
    pub fn evaluate(&self, tool_name: &str, arguments: &Map<String, Value>) -> PolicyDecision {
        let snapshot = self.active.load();
        for rule in &snapshot.rules {
            if rule_matches(rule, tool_name, arguments) {
                return PolicyDecision {
                    action: rule.action.clone(),
                    rule_id: Some(rule.id.clone()),
                };
            }
        }
        PolicyDecision::default_allow()
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(RuleSet::empty())
    }
}

// ============================================================================
// SECTION: Rule Matching
// ============================================================================

/// Full-match check for a single rule.
///
/// Argument-path existence is a precondition: when the target path is absent
/// the rule is skipped, regardless of its conditions.
fn rule_matches(rule: &Rule, tool_name: &str, arguments: &Map<String, Value>) -> bool {
    if !rule.tool.matches(tool_name) {
        return false;
    }
    let Some(argument) = rule.argument.resolve(arguments) else {
        return false;
    };
    if rule.conditions.is_empty() {
        return rule.match_mode == MatchMode::All;
    }
    rule.match_mode.combine(rule.conditions.iter().map(|condition| condition.evaluate(argument)))
}
