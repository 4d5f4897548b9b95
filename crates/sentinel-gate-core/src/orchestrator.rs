// crates/sentinel-gate-core/src/orchestrator.rs
// ============================================================================
// Module: Sentinel Gate Decision Orchestrator
// Description: Per-message decision pipeline over policy, breaker, and HITL.
// Purpose: Produce exactly one verdict with audit metadata for each message.
// Dependencies: crate::{approval, audit, breaker, engine, message, rule}
// ============================================================================

//! ## Overview
//! The orchestrator is the per-message entry point of the decision engine.
//! Order of consultation: policy engine, then (for escalations) the approval
//! registry, then (for allowed messages) the circuit breaker. Escalation
//! resolves internally: the calling thread blocks in the registry until a
//! human decides or the timeout elapses, and the verdict returned is always
//! final.
//!
//! The orchestrator performs no I/O beyond invoking the audit sink and the
//! approval notifier collaborators, both best-effort.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::approval::ApprovalOutcome;
use crate::approval::ApprovalRegistry;
use crate::approval::ApprovalTicket;
use crate::audit::AuditEntry;
use crate::audit::AuditSink;
use crate::breaker::CircuitBreaker;
use crate::engine::PolicyEngine;
use crate::message::InboundMessage;
use crate::rule::Action;
use crate::rule::RuleId;

// ============================================================================
// SECTION: Verdicts
// ============================================================================

/// Final outcome for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Pass the payload through unchanged.
    Forward,
    /// Reject with a protocol-level error carrying the reason.
    Block {
        /// Human-readable block reason.
        reason: String,
    },
    /// Forward unchanged and additionally audit the reason.
    ForwardWithAudit {
        /// Human-readable audit reason.
        reason: String,
    },
}

// ============================================================================
// SECTION: Approval Notifier
// ============================================================================

/// Collaborator that surfaces a human-actionable approval reference.
///
/// The core supplies the identifiers and the time remaining; transport (URL,
/// chat message, terminal output) is the implementation's concern.
pub trait ApprovalNotifier: Send + Sync {
    /// Announces a newly created approval request.
    fn notify(&self, ticket: &ApprovalTicket, timeout: Duration);
}

/// Notifier that drops every announcement.
///
/// Test and headless-deployment stand-in.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl ApprovalNotifier for NoopNotifier {
    fn notify(&self, _ticket: &ApprovalTicket, _timeout: Duration) {}
}

// ============================================================================
// SECTION: Decision Orchestrator
// ============================================================================

/// Per-message decision pipeline.
///
/// # Invariants
/// - The circuit breaker is consulted only for messages the policy engine
///   allowed (directly or via an approved escalation).
/// - Every non-forward outcome emits exactly one audit entry.
pub struct DecisionOrchestrator {
    /// Policy engine with the active rule snapshot.
    policy: Arc<PolicyEngine>,
    /// Rate-limiting circuit breaker.
    breaker: Arc<CircuitBreaker>,
    /// Human-in-the-loop approval registry.
    approvals: Arc<ApprovalRegistry>,
    /// Best-effort audit sink.
    audit: Arc<dyn AuditSink>,
    /// Approval notification collaborator.
    notifier: Arc<dyn ApprovalNotifier>,
}

impl DecisionOrchestrator {
    /// Wires the orchestrator to its collaborators.
    #[must_use]
    pub fn new(
        policy: Arc<PolicyEngine>,
        breaker: Arc<CircuitBreaker>,
        approvals: Arc<ApprovalRegistry>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn ApprovalNotifier>,
    ) -> Self {
        Self {
            policy,
            breaker,
            approvals,
            audit,
            notifier,
        }
    }

    /// Returns the approval registry shared with the HTTP handler.
    #[must_use]
    pub fn approvals(&self) -> Arc<ApprovalRegistry> {
        Arc::clone(&self.approvals)
    }

    /// Returns the policy engine shared with the reload trigger.
    #[must_use]
    pub fn policy(&self) -> Arc<PolicyEngine> {
        Arc::clone(&self.policy)
    }

    /// Decides the fate of one inbound message.
    ///
    /// Non-tool-invocation messages forward immediately without consulting
    /// any component. Escalations block the calling thread until resolution
    /// or timeout; this is the single suspension point of the core.
    #[must_use]
    pub fn decide(&self, message: &InboundMessage) -> Verdict {
        if !message.is_tool_call() {
            return Verdict::Forward;
        }
        let tool_name = message.tool_name().unwrap_or_default();
        let empty = serde_json::Map::new();
        let arguments = message.arguments().unwrap_or(&empty);

        let decision = self.policy.evaluate(tool_name, arguments);
        match decision.action {
            Action::Allow => {}
            Action::Log => {
                let reason = log_reason(decision.rule_id.as_ref());
                self.emit_audit(message, &reason);
                return Verdict::ForwardWithAudit {
                    reason,
                };
            }
            Action::Block {
                reason,
            } => {
                let reason = reason
                    .unwrap_or_else(|| block_fallback_reason(decision.rule_id.as_ref()));
                self.emit_audit(message, &reason);
                return Verdict::Block {
                    reason,
                };
            }
            Action::AllowWithApproval {
                timeout,
                approvers: _,
            } => match self.escalate(message, timeout, decision.rule_id.clone()) {
                ApprovalOutcome::Approved => {
                    self.emit_audit(
                        message,
                        &escalation_reason("approved", decision.rule_id.as_ref()),
                    );
                }
                ApprovalOutcome::Denied => {
                    let reason = "User Denied Action".to_owned();
                    self.emit_audit(message, &reason);
                    return Verdict::Block {
                        reason,
                    };
                }
                ApprovalOutcome::Expired => {
                    let reason = "Approval Timed Out".to_owned();
                    self.emit_audit(message, &reason);
                    return Verdict::Block {
                        reason,
                    };
                }
            },
        }

        if self.breaker.admit(tool_name) {
            Verdict::Forward
        } else {
            let reason = self.breaker.denial_reason(tool_name);
            self.emit_audit(message, &reason);
            Verdict::Block {
                reason,
            }
        }
    }

    /// Creates an approval entry, notifies, and blocks for the outcome.
    fn escalate(
        &self,
        message: &InboundMessage,
        timeout: Duration,
        rule_id: Option<RuleId>,
    ) -> ApprovalOutcome {
        let ticket = self.approvals.create(message.payload().clone(), timeout, rule_id);
        self.notifier.notify(&ticket, timeout);
        self.approvals.await_decision(&ticket.id, timeout)
    }

    /// Hands one audit entry to the sink, best-effort.
    fn emit_audit(&self, message: &InboundMessage, reason: &str) {
        let entry = AuditEntry::new(
            message.id().cloned(),
            message.method().unwrap_or_default().to_owned(),
            reason.to_owned(),
            message.payload().clone(),
        );
        self.audit.record(&entry);
    }
}

// ============================================================================
// SECTION: Reason Formatting
// ============================================================================

/// Audit reason for a log-action match.
fn log_reason(rule_id: Option<&RuleId>) -> String {
    match rule_id {
        Some(id) => format!("Logged by rule '{id}'"),
        None => "Logged".to_owned(),
    }
}

/// Fallback block reason when the rule carries none.
fn block_fallback_reason(rule_id: Option<&RuleId>) -> String {
    match rule_id {
        Some(id) => format!("Blocked by rule '{id}'"),
        None => "Blocked by policy".to_owned(),
    }
}

/// Audit reason for a resolved escalation.
fn escalation_reason(outcome: &str, rule_id: Option<&RuleId>) -> String {
    match rule_id {
        Some(id) => format!("Approval {outcome} for rule '{id}'"),
        None => format!("Approval {outcome}"),
    }
}
