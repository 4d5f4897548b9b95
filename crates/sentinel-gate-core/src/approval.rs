// crates/sentinel-gate-core/src/approval.rs
// ============================================================================
// Module: Sentinel Gate Approval Registry
// Description: Human-in-the-loop approval requests and blocking waits.
// Purpose: Suspend escalated messages until a human approves, denies, or the
// request times out.
// Dependencies: rand, serde, subtle, std
// ============================================================================

//! ## Overview
//! The approval registry owns every pending approval request. The forwarding
//! thread creates an entry and blocks in [`ApprovalRegistry::await_decision`];
//! the approval HTTP handler resolves it from another thread through
//! [`ApprovalRegistry::resolve`]. Status transitions are monotonic and
//! one-way: `pending` moves to exactly one of `approved`, `denied`, or
//! `expired`, all terminal.
//!
//! Waits use a condition variable, so the map lock is released for the whole
//! blocking interval and resolver calls always land. Identifiers and tokens
//! are random 32-character alphanumerics; tokens are compared in constant
//! time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::fmt;
use std::sync::Condvar;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use serde_json::Value;
use subtle::ConstantTimeEq;

use crate::rule::RuleId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length, in characters, of generated identifiers and tokens.
const CREDENTIAL_LEN: usize = 32;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Approval request identifier, safe to embed in approver-facing URLs.
///
/// # Invariants
/// - Randomly generated; collision probability is negligible at 32
///   alphanumeric characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ApprovalId(String);

impl ApprovalId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_alphanumeric())
    }

    /// Wraps an identifier received from an external caller.
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

impl fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ApprovalId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Unguessable approval token authenticating resolve calls.
///
/// # Invariants
/// - Compared in constant time; never logged in full by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ApprovalToken(String);

impl ApprovalToken {
    /// Generates a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_alphanumeric())
    }

    /// Wraps a token received from an external caller.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time equality against another token.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl From<&str> for ApprovalToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Generates a random alphanumeric credential string.
fn random_alphanumeric() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(CREDENTIAL_LEN).map(char::from).collect()
}

// ============================================================================
// SECTION: Status and Decisions
// ============================================================================

/// Lifecycle status of an approval request.
///
/// # Invariants
/// - `Pending` transitions to exactly one terminal variant; terminal entries
///   never resurrect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting a human decision.
    Pending,
    /// Approved by a human actor.
    Approved,
    /// Denied by a human actor.
    Denied,
    /// Timed out before resolution.
    Expired,
}

impl ApprovalStatus {
    /// Returns `true` for terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Human decision submitted through the approval endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// Allow the suspended message.
    Approve,
    /// Reject the suspended message.
    Deny,
}

/// Final outcome observed by the waiting thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalOutcome {
    /// The request was approved before the timeout.
    Approved,
    /// The request was denied before the timeout.
    Denied,
    /// The timeout elapsed without a decision.
    Expired,
}

// ============================================================================
// SECTION: Tickets and Entries
// ============================================================================

/// Identifiers handed to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalTicket {
    /// Request identifier.
    pub id: ApprovalId,
    /// Authentication token for resolve calls.
    pub token: ApprovalToken,
}

/// Registry-owned approval entry.
///
/// Entries are referenced externally by id and token only; the struct itself
/// never leaves the registry.
#[derive(Debug)]
struct ApprovalEntry {
    /// Token required to resolve this entry.
    token: ApprovalToken,
    /// Current lifecycle status.
    status: ApprovalStatus,
    /// Creation instant, retained for expiry bookkeeping.
    created_at: Instant,
    /// Timeout after which the entry expires.
    timeout: Duration,
    /// Original message payload, kept for audit and approver context.
    payload: Value,
    /// Rule that triggered the escalation, when known.
    rule_id: Option<RuleId>,
}

// ============================================================================
// SECTION: Approval Registry
// ============================================================================

/// Thread-safe store of pending approval requests.
///
/// Shared between the blocking forwarding thread and the approval HTTP
/// handler. The condition variable wakes waiters on every resolution; each
/// waiter rechecks its own entry, so spurious wakeups are harmless.
#[derive(Debug, Default)]
pub struct ApprovalRegistry {
    /// Entry storage keyed by request identifier.
    entries: Mutex<HashMap<ApprovalId, ApprovalEntry>>,
    /// Wakes blocked `await_decision` calls when any entry resolves.
    wakeup: Condvar,
}

impl ApprovalRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new pending request and returns its ticket.
    ///
    /// The payload is retained for audit and approver context until the
    /// waiting thread consumes the outcome.
    #[must_use]
    pub fn create(
        &self,
        payload: Value,
        timeout: Duration,
        rule_id: Option<RuleId>,
    ) -> ApprovalTicket {
        let ticket = ApprovalTicket {
            id: ApprovalId::generate(),
            token: ApprovalToken::generate(),
        };
        let entry = ApprovalEntry {
            token: ticket.token.clone(),
            status: ApprovalStatus::Pending,
            created_at: Instant::now(),
            timeout,
            payload,
            rule_id,
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(ticket.id.clone(), entry);
        }
        ticket
    }

    /// Applies a human decision to a pending entry.
    ///
    /// Single compare-and-set under the lock: returns `true` only for the one
    /// caller that transitions the entry out of `Pending` with a matching
    /// token. Unknown ids, token mismatches, and already-terminal entries all
    /// return `false` as a benign no-op.
    pub fn resolve(&self, id: &ApprovalId, token: &ApprovalToken, decision: ApprovalDecision) -> bool {
        let Ok(mut entries) = self.entries.lock() else {
            return false;
        };
        let Some(entry) = entries.get_mut(id) else {
            return false;
        };
        if !entry.token.matches(token) {
            return false;
        }
        if entry.status.is_terminal() {
            return false;
        }
        entry.status = match decision {
            ApprovalDecision::Approve => ApprovalStatus::Approved,
            ApprovalDecision::Deny => ApprovalStatus::Denied,
        };
        drop(entries);
        self.wakeup.notify_all();
        true
    }

    /// Blocks until the entry leaves `Pending` or the timeout elapses.
    ///
    /// On timeout the registry itself transitions the entry to `Expired`. The
    /// terminal entry is evicted before returning, so a later `resolve` call
    /// observes an unknown id and reports `false`. An id the registry does not
    /// know yields `Expired` immediately.
    #[must_use]
    pub fn await_decision(&self, id: &ApprovalId, timeout: Duration) -> ApprovalOutcome {
        let deadline = Instant::now() + timeout;
        let Ok(mut entries) = self.entries.lock() else {
            return ApprovalOutcome::Expired;
        };
        loop {
            let Some(entry) = entries.get_mut(id) else {
                return ApprovalOutcome::Expired;
            };
            match entry.status {
                ApprovalStatus::Approved => {
                    entries.remove(id);
                    return ApprovalOutcome::Approved;
                }
                ApprovalStatus::Denied => {
                    entries.remove(id);
                    return ApprovalOutcome::Denied;
                }
                ApprovalStatus::Expired => {
                    entries.remove(id);
                    return ApprovalOutcome::Expired;
                }
                ApprovalStatus::Pending => {}
            }
            let now = Instant::now();
            if now >= deadline {
                entry.status = ApprovalStatus::Expired;
                entries.remove(id);
                return ApprovalOutcome::Expired;
            }
            let remaining = deadline.duration_since(now);
            match self.wakeup.wait_timeout(entries, remaining) {
                Ok((guard, _)) => entries = guard,
                Err(_) => return ApprovalOutcome::Expired,
            }
        }
    }

    /// Force-expires every pending entry and wakes all waiters.
    ///
    /// Shutdown hook: releases threads blocked in `await_decision` instead of
    /// leaving them suspended indefinitely.
    pub fn expire_all(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            for entry in entries.values_mut() {
                if entry.status == ApprovalStatus::Pending {
                    entry.status = ApprovalStatus::Expired;
                }
            }
        }
        self.wakeup.notify_all();
    }

    /// Number of entries currently held, pending or awaiting pickup.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns `true` when no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of an entry's payload and escalating rule for notifications.
    ///
    /// Returns `None` for unknown or already-evicted entries.
    #[must_use]
    pub fn context(&self, id: &ApprovalId) -> Option<(Value, Option<RuleId>)> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(id)?;
        Some((entry.payload.clone(), entry.rule_id.clone()))
    }

    /// Time left before a pending entry expires.
    ///
    /// Returns `None` for unknown entries; terminal entries report zero.
    #[must_use]
    pub fn remaining(&self, id: &ApprovalId) -> Option<Duration> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(id)?;
        if entry.status.is_terminal() {
            return Some(Duration::ZERO);
        }
        Some(entry.timeout.saturating_sub(entry.created_at.elapsed()))
    }
}
