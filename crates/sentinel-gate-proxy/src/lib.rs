// crates/sentinel-gate-proxy/src/lib.rs
// ============================================================================
// Module: Sentinel Gate Proxy
// Description: Transport shell around the Sentinel Gate decision engine.
// Purpose: Wrap a tool server's stdio, enforce verdicts, and serve approvals.
// Dependencies: axum, clap, sentinel-gate-config, sentinel-gate-core,
// serde_json, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! The proxy owns everything the decision engine deliberately does not:
//! spawning the wrapped tool server, line framing on its stdio, synthesizing
//! JSON-RPC errors for blocked messages, the approval HTTP endpoint, the
//! append-only audit log, and SIGHUP-driven policy hot-reload.
//!
//! Stdout is reserved for the JSON-RPC channel; all diagnostics go to stderr
//! through `tracing`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod approval_http;
pub mod audit_log;
pub mod config;
pub mod forward;
pub mod notify;
pub mod reload;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use approval_http::approval_router;
pub use approval_http::serve_approvals;
pub use audit_log::FileAuditSink;
pub use config::GatewayArgs;
pub use forward::ForwardError;
pub use forward::policy_violation_error;
pub use forward::run_gateway;
pub use notify::UrlNotifier;
pub use reload::watch_sighup;
