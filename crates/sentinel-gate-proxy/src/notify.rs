// crates/sentinel-gate-proxy/src/notify.rs
// ============================================================================
// Module: Sentinel Gate Approval Notifier
// Description: Log-based announcement of pending approval requests.
// Purpose: Surface approve/deny URLs to the operator watching the gateway log.
// Dependencies: sentinel-gate-core, tracing
// ============================================================================

//! ## Overview
//! The gateway's notification channel is its own stderr log: each escalation
//! is announced with the approve and deny URLs for the loopback endpoint, the
//! affected tool, and the time remaining. Anything richer (chat, email) would
//! implement the same [`ApprovalNotifier`] trait.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use sentinel_gate_core::ApprovalNotifier;
use sentinel_gate_core::ApprovalRegistry;
use sentinel_gate_core::ApprovalTicket;
use sentinel_gate_core::InboundMessage;

// ============================================================================
// SECTION: URL Notifier
// ============================================================================

/// Notifier that logs approve/deny URLs for the loopback endpoint.
pub struct UrlNotifier {
    /// Registry consulted for request context.
    registry: Arc<ApprovalRegistry>,
    /// Host part of the announced URLs.
    host: String,
    /// Port of the approval endpoint.
    port: u16,
}

impl UrlNotifier {
    /// Creates a notifier announcing URLs for `host:port`.
    #[must_use]
    pub fn new(registry: Arc<ApprovalRegistry>, host: impl Into<String>, port: u16) -> Self {
        Self {
            registry,
            host: host.into(),
            port,
        }
    }
}

impl ApprovalNotifier for UrlNotifier {
    fn notify(&self, ticket: &ApprovalTicket, timeout: Duration) {
        let tool = self
            .registry
            .context(&ticket.id)
            .map(|(payload, _)| {
                InboundMessage::new(payload).tool_name().unwrap_or("unknown").to_owned()
            })
            .unwrap_or_else(|| "unknown".to_owned());
        let remaining =
            self.registry.remaining(&ticket.id).unwrap_or(timeout).as_secs();
        let approve_url = format!(
            "http://{}:{}/approve/{}/{}",
            self.host,
            self.port,
            ticket.token.as_str(),
            ticket.id.as_str()
        );
        let deny_url = format!(
            "http://{}:{}/deny/{}/{}",
            self.host,
            self.port,
            ticket.token.as_str(),
            ticket.id.as_str()
        );
        tracing::warn!(
            %tool,
            timeout_secs = remaining,
            %approve_url,
            %deny_url,
            "tool invocation awaiting human approval"
        );
    }
}
