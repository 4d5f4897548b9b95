// crates/sentinel-gate-core/src/audit.rs
// ============================================================================
// Module: Sentinel Gate Audit Events
// Description: Structured audit entries for non-default decisions.
// Purpose: Hand blocked, logged, and escalated outcomes to an external sink.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every non-default decision (block, log, escalation outcome, rate-limit
//! denial) produces one [`AuditEntry`]. The orchestrator hands entries to an
//! [`AuditSink`] best-effort: a failing or absent sink never fails the
//! message path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Audit Entries
// ============================================================================

/// Structured record of a non-default decision.
///
/// # Invariants
/// - `payload` is the full original message, retained for forensics.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// JSON-RPC id of the affected message, when present.
    pub message_id: Option<Value>,
    /// JSON-RPC method of the affected message.
    pub method: String,
    /// Decision reason, e.g. the firing rule's block reason.
    pub reason: String,
    /// Full original message payload.
    pub payload: Value,
}

impl AuditEntry {
    /// Creates an entry stamped with the current wall-clock time.
    #[must_use]
    pub fn new(message_id: Option<Value>, method: String, reason: String, payload: Value) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            timestamp_ms,
            message_id,
            method,
            reason,
            payload,
        }
    }
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Consumer of audit entries.
///
/// Implementations must be non-blocking from the caller's perspective and
/// swallow their own failures; the decision path never waits on persistence.
pub trait AuditSink: Send + Sync {
    /// Records one audit entry, best-effort.
    fn record(&self, entry: &AuditEntry);
}

/// Audit sink that writes JSON lines to stderr.
///
/// Stdout stays reserved for the JSON-RPC channel.
#[derive(Debug, Default)]
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, entry: &AuditEntry) {
        if let Ok(line) = serde_json::to_string(entry) {
            let _ = writeln!(std::io::stderr(), "{line}");
        }
    }
}
