// crates/sentinel-gate-core/tests/approval_registry.rs
// ============================================================================
// Module: Approval Registry Unit Tests
// Description: HITL lifecycle, expiry, token checks, and resolve races.
// Purpose: Validate monotonic status transitions and blocking-wait behavior.
// Dependencies: sentinel-gate-core, serde_json
// ============================================================================

//! ## Overview
//! Exercises [`sentinel_gate_core::ApprovalRegistry`]: create/resolve/await
//! lifecycles, timeout-driven expiry, late and unauthorized resolve calls,
//! the concurrent conflicting-resolve race, and shutdown expiry of blocked
//! waiters.

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

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use sentinel_gate_core::ApprovalDecision;
use sentinel_gate_core::ApprovalId;
use sentinel_gate_core::ApprovalOutcome;
use sentinel_gate_core::ApprovalRegistry;
use sentinel_gate_core::ApprovalToken;
use sentinel_gate_core::RuleId;
use serde_json::json;

// ============================================================================
// SECTION: Helper Functions
// ============================================================================

fn registry() -> Arc<ApprovalRegistry> {
    Arc::new(ApprovalRegistry::new())
}

const LONG: Duration = Duration::from_secs(5);

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

#[test]
fn approve_then_await_returns_approved() {
    let registry = registry();
    let ticket = registry.create(json!({"id": 1}), LONG, None);
    assert!(registry.resolve(&ticket.id, &ticket.token, ApprovalDecision::Approve));
    assert_eq!(registry.await_decision(&ticket.id, LONG), ApprovalOutcome::Approved);
}

#[test]
fn deny_then_await_returns_denied() {
    let registry = registry();
    let ticket = registry.create(json!({}), LONG, None);
    assert!(registry.resolve(&ticket.id, &ticket.token, ApprovalDecision::Deny));
    assert_eq!(registry.await_decision(&ticket.id, LONG), ApprovalOutcome::Denied);
}

#[test]
fn second_resolve_after_decision_returns_false() {
    let registry = registry();
    let ticket = registry.create(json!({}), LONG, None);
    assert!(registry.resolve(&ticket.id, &ticket.token, ApprovalDecision::Approve));
    assert!(!registry.resolve(&ticket.id, &ticket.token, ApprovalDecision::Deny));
    assert_eq!(registry.await_decision(&ticket.id, LONG), ApprovalOutcome::Approved);
}

#[test]
fn await_without_resolve_expires_near_timeout() {
    let registry = registry();
    let ticket = registry.create(json!({}), Duration::from_millis(100), None);

    let start = Instant::now();
    let outcome = registry.await_decision(&ticket.id, Duration::from_millis(100));
    let elapsed = start.elapsed();

    assert_eq!(outcome, ApprovalOutcome::Expired);
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_millis(500));

    // Expired entries are evicted; a late resolve is a benign no-op.
    assert!(!registry.resolve(&ticket.id, &ticket.token, ApprovalDecision::Approve));
}

#[test]
fn resolve_unblocks_a_waiting_thread() {
    let registry = registry();
    let ticket = registry.create(json!({}), LONG, None);

    let waiter = {
        let registry = Arc::clone(&registry);
        let id = ticket.id.clone();
        thread::spawn(move || registry.await_decision(&id, LONG))
    };
    thread::sleep(Duration::from_millis(50));
    assert!(registry.resolve(&ticket.id, &ticket.token, ApprovalDecision::Approve));
    assert_eq!(waiter.join().unwrap(), ApprovalOutcome::Approved);
}

#[test]
fn entry_is_evicted_after_waiter_observes_outcome() {
    let registry = registry();
    let ticket = registry.create(json!({}), LONG, None);
    assert_eq!(registry.len(), 1);
    assert!(registry.resolve(&ticket.id, &ticket.token, ApprovalDecision::Approve));
    let _ = registry.await_decision(&ticket.id, LONG);
    assert!(registry.is_empty());
}

// ============================================================================
// SECTION: Authentication and Misses
// ============================================================================

#[test]
fn token_mismatch_is_rejected() {
    let registry = registry();
    let ticket = registry.create(json!({}), LONG, None);
    let wrong = ApprovalToken::new("definitely-not-the-issued-token!!");
    assert!(!registry.resolve(&ticket.id, &wrong, ApprovalDecision::Approve));
    // The entry is still pending and resolvable with the real token.
    assert!(registry.resolve(&ticket.id, &ticket.token, ApprovalDecision::Approve));
}

#[test]
fn unknown_id_resolve_returns_false() {
    let registry = registry();
    let unknown = ApprovalId::new("no-such-request");
    let token = ApprovalToken::new("irrelevant");
    assert!(!registry.resolve(&unknown, &token, ApprovalDecision::Approve));
}

#[test]
fn unknown_id_await_returns_expired() {
    let registry = registry();
    let unknown = ApprovalId::new("no-such-request");
    assert_eq!(registry.await_decision(&unknown, LONG), ApprovalOutcome::Expired);
}

#[test]
fn tickets_are_unique_and_unguessable_length() {
    let registry = registry();
    let first = registry.create(json!({}), LONG, None);
    let second = registry.create(json!({}), LONG, None);
    assert_ne!(first.id, second.id);
    assert_ne!(first.token.as_str(), second.token.as_str());
    assert_eq!(first.id.as_str().len(), 32);
    assert_eq!(first.token.as_str().len(), 32);
}

#[test]
fn context_exposes_payload_and_rule() {
    let registry = registry();
    let payload = json!({"method": "tools/call"});
    let ticket = registry.create(payload.clone(), LONG, Some(RuleId::new("escalate-deletes")));
    let (stored, rule_id) = registry.context(&ticket.id).unwrap();
    assert_eq!(stored, payload);
    assert_eq!(rule_id, Some(RuleId::new("escalate-deletes")));
    assert!(registry.remaining(&ticket.id).unwrap() <= LONG);
}

// ============================================================================
// SECTION: Races and Shutdown
// ============================================================================

#[test]
fn conflicting_concurrent_resolves_have_exactly_one_winner() {
    for _ in 0..20 {
        let registry = registry();
        let ticket = registry.create(json!({}), LONG, None);

        let approver = {
            let registry = Arc::clone(&registry);
            let id = ticket.id.clone();
            let token = ticket.token.clone();
            thread::spawn(move || registry.resolve(&id, &token, ApprovalDecision::Approve))
        };
        let denier = {
            let registry = Arc::clone(&registry);
            let id = ticket.id.clone();
            let token = ticket.token.clone();
            thread::spawn(move || registry.resolve(&id, &token, ApprovalDecision::Deny))
        };

        let approved = approver.join().unwrap();
        let denied = denier.join().unwrap();
        assert_ne!(approved, denied, "exactly one resolver must win");

        let outcome = registry.await_decision(&ticket.id, LONG);
        if approved {
            assert_eq!(outcome, ApprovalOutcome::Approved);
        } else {
            assert_eq!(outcome, ApprovalOutcome::Denied);
        }
    }
}

#[test]
fn expire_all_releases_blocked_waiters() {
    let registry = registry();
    let ticket = registry.create(json!({}), LONG, None);

    let waiter = {
        let registry = Arc::clone(&registry);
        let id = ticket.id.clone();
        thread::spawn(move || registry.await_decision(&id, LONG))
    };
    thread::sleep(Duration::from_millis(50));
    registry.expire_all();
    assert_eq!(waiter.join().unwrap(), ApprovalOutcome::Expired);
}
