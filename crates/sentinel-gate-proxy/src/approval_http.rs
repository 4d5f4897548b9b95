// crates/sentinel-gate-proxy/src/approval_http.rs
// ============================================================================
// Module: Sentinel Gate Approval Endpoint
// Description: Loopback HTTP endpoint resolving pending approvals.
// Purpose: Let a human approve or deny a suspended tool invocation by URL.
// Dependencies: axum, sentinel-gate-core, tokio, tracing
// ============================================================================

//! ## Overview
//! Two GET routes, `/approve/{token}/{id}` and `/deny/{token}/{id}`, each
//! calling [`ApprovalRegistry::resolve`]. The token is the bearer credential:
//! holding a valid approve-or-deny link is the entire authorization model, so
//! the server binds to loopback only. Unknown ids, already-decided requests,
//! and mismatched tokens are indistinguishable to the caller: all answer 404.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;

use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use tokio::net::TcpListener;

use sentinel_gate_core::ApprovalDecision;
use sentinel_gate_core::ApprovalId;
use sentinel_gate_core::ApprovalRegistry;
use sentinel_gate_core::ApprovalToken;

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the approval router over a shared registry.
#[must_use]
pub fn approval_router(registry: Arc<ApprovalRegistry>) -> Router {
    Router::new()
        .route("/approve/{token}/{id}", get(approve))
        .route("/deny/{token}/{id}", get(deny))
        .with_state(registry)
}

/// Binds the approval endpoint on loopback and serves it until shutdown.
///
/// # Errors
///
/// Returns the underlying I/O error when the port cannot be bound or the
/// server fails.
pub async fn serve_approvals(registry: Arc<ApprovalRegistry>, port: u16) -> io::Result<()> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await?;
    tracing::info!(port, "approval endpoint listening");
    axum::serve(listener, approval_router(registry)).await
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Resolves a request as approved.
async fn approve(
    State(registry): State<Arc<ApprovalRegistry>>,
    Path((token, id)): Path<(String, String)>,
) -> (StatusCode, Html<&'static str>) {
    respond(&registry, &token, &id, ApprovalDecision::Approve)
}

/// Resolves a request as denied.
async fn deny(
    State(registry): State<Arc<ApprovalRegistry>>,
    Path((token, id)): Path<(String, String)>,
) -> (StatusCode, Html<&'static str>) {
    respond(&registry, &token, &id, ApprovalDecision::Deny)
}

/// Shared resolve-and-render path for both handlers.
fn respond(
    registry: &ApprovalRegistry,
    token: &str,
    id: &str,
    decision: ApprovalDecision,
) -> (StatusCode, Html<&'static str>) {
    let resolved = registry.resolve(
        &ApprovalId::new(id),
        &ApprovalToken::new(token),
        decision,
    );
    if resolved {
        let page = match decision {
            ApprovalDecision::Approve => {
                "<html><body><h1>Request approved</h1>\
                 <p>The tool invocation will proceed.</p></body></html>"
            }
            ApprovalDecision::Deny => {
                "<html><body><h1>Request denied</h1>\
                 <p>The tool invocation has been blocked.</p></body></html>"
            }
        };
        (StatusCode::OK, Html(page))
    } else {
        (
            StatusCode::NOT_FOUND,
            Html("<html><body><h1>Unknown or expired approval request</h1></body></html>"),
        )
    }
}
