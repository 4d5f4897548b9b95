// crates/sentinel-gate-proxy/src/main.rs
// ============================================================================
// Module: Sentinel Gate Entry Point
// Description: Gateway process wiring and lifecycle.
// Purpose: Assemble the decision engine and run the stdio forwarder.
// Dependencies: clap, sentinel-gate-config, sentinel-gate-core,
// sentinel-gate-proxy, tokio, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! Startup order: logging to stderr, configuration resolution, initial policy
//! load, collaborator wiring, then the approval endpoint and SIGHUP reload
//! task on the async runtime while the blocking forwarder owns stdio. On
//! shutdown every pending approval is force-expired so no thread stays
//! blocked, and the gateway exits with the wrapped server's status.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sentinel_gate_config::PolicyLoader;
use sentinel_gate_core::ApprovalRegistry;
use sentinel_gate_core::AuditSink;
use sentinel_gate_core::CircuitBreaker;
use sentinel_gate_core::DecisionOrchestrator;
use sentinel_gate_core::PolicyEngine;
use sentinel_gate_core::RuleSet;
use sentinel_gate_core::StderrAuditSink;
use sentinel_gate_proxy::FileAuditSink;
use sentinel_gate_proxy::GatewayArgs;
use sentinel_gate_proxy::UrlNotifier;
use sentinel_gate_proxy::run_gateway;
use sentinel_gate_proxy::serve_approvals;
use sentinel_gate_proxy::watch_sighup;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Gateway entry point.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = GatewayArgs::parse();
    let loader = PolicyLoader::new(args.approval_timeout());

    let initial_rules = match &args.policy_file {
        Some(path) => match loader.load_file(path) {
            Ok(rules) => {
                tracing::info!(path = %path.display(), rules = rules.len(), "policy loaded");
                rules
            }
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "policy load failed; starting with an allow-all rule set"
                );
                RuleSet::empty()
            }
        },
        None => {
            tracing::warn!("no policy file configured; starting with an allow-all rule set");
            RuleSet::empty()
        }
    };

    let engine = Arc::new(PolicyEngine::new(initial_rules));
    let breaker = Arc::new(CircuitBreaker::new(args.breaker_config()));
    let registry = Arc::new(ApprovalRegistry::new());
    let audit: Arc<dyn AuditSink> = match &args.audit_log {
        Some(path) => match FileAuditSink::open(path) {
            Ok(sink) => Arc::new(sink),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "audit log open failed; falling back to stderr"
                );
                Arc::new(StderrAuditSink)
            }
        },
        None => Arc::new(StderrAuditSink),
    };
    let notifier =
        Arc::new(UrlNotifier::new(Arc::clone(&registry), "localhost", args.hitl_port));

    let orchestrator = Arc::new(DecisionOrchestrator::new(
        Arc::clone(&engine),
        breaker,
        Arc::clone(&registry),
        audit,
        notifier,
    ));

    let endpoint_registry = Arc::clone(&registry);
    let hitl_port = args.hitl_port;
    tokio::spawn(async move {
        if let Err(error) = serve_approvals(endpoint_registry, hitl_port).await {
            tracing::error!(%error, "approval endpoint stopped");
        }
    });
    if let Some(path) = args.policy_file.clone() {
        tokio::spawn(watch_sighup(engine, loader, path));
    }

    let command = args.server_command.clone();
    let forwarded =
        tokio::task::spawn_blocking(move || run_gateway(orchestrator, &command)).await;

    // No waiter may stay blocked once forwarding is over.
    registry.expire_all();

    match forwarded {
        Ok(Ok(status)) => {
            tracing::info!(%status, "tool server exited");
            status
                .code()
                .and_then(|code| u8::try_from(code).ok())
                .map_or(ExitCode::FAILURE, ExitCode::from)
        }
        Ok(Err(error)) => {
            tracing::error!(%error, "gateway failed");
            ExitCode::FAILURE
        }
        Err(error) => {
            tracing::error!(%error, "forwarder task panicked");
            ExitCode::FAILURE
        }
    }
}
