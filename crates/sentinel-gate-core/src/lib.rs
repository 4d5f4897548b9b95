// crates/sentinel-gate-core/src/lib.rs
// ============================================================================
// Module: Sentinel Gate Core
// Description: Decision engine for the Sentinel Gate runtime security gateway.
// Purpose: Evaluate tool-invocation messages against policy, rate limits, and
// human approvals without touching the wire.
// Dependencies: arc-swap, globset, rand, regex, serde, serde_json, subtle,
// thiserror
// ============================================================================

//! ## Overview
//! Sentinel Gate interposes between a JSON-RPC client and a tool-providing
//! server. This crate is the decision engine: given a parsed tool-invocation
//! message it produces a single verdict (forward, block, or forward-and-audit)
//! by consulting the policy engine, the circuit breaker, and the
//! human-in-the-loop approval registry.
//!
//! The crate performs no I/O of its own. Stream forwarding, the approval HTTP
//! endpoint, audit persistence, and reload triggers are collaborators that
//! plug in through the traits defined here.
//!
//! Security posture: message payloads are untrusted input; condition
//! evaluation is total and bounds regex input length.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod approval;
pub mod audit;
pub mod breaker;
pub mod condition;
pub mod engine;
pub mod message;
pub mod orchestrator;
pub mod rule;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use approval::ApprovalDecision;
pub use approval::ApprovalId;
pub use approval::ApprovalOutcome;
pub use approval::ApprovalRegistry;
pub use approval::ApprovalStatus;
pub use approval::ApprovalTicket;
pub use approval::ApprovalToken;
pub use audit::AuditEntry;
pub use audit::AuditSink;
pub use audit::StderrAuditSink;
pub use breaker::CircuitBreaker;
pub use breaker::CircuitBreakerConfig;
pub use condition::Condition;
pub use condition::ConditionError;
pub use condition::ConditionKind;
pub use condition::MAX_CONDITION_INPUT_BYTES;
pub use engine::PolicyDecision;
pub use engine::PolicyEngine;
pub use message::ArgumentPath;
pub use message::InboundMessage;
pub use message::TOOL_CALL_METHOD;
pub use orchestrator::ApprovalNotifier;
pub use orchestrator::DecisionOrchestrator;
pub use orchestrator::NoopNotifier;
pub use orchestrator::Verdict;
pub use rule::Action;
pub use rule::MatchMode;
pub use rule::Rule;
pub use rule::RuleId;
pub use rule::RuleSet;
pub use rule::ToolPattern;
pub use rule::ToolPatternError;
