// crates/sentinel-gate-proxy/src/reload.rs
// ============================================================================
// Module: Sentinel Gate Policy Reload
// Description: SIGHUP-driven hot-reload of the policy file.
// Purpose: Swap rule snapshots in place without restarting the gateway.
// Dependencies: sentinel-gate-config, sentinel-gate-core, tokio, tracing
// ============================================================================

//! ## Overview
//! On each SIGHUP the policy file is re-read and re-compiled; only a fully
//! valid file replaces the active snapshot. A failed load logs the error and
//! keeps the previous rules, so a bad edit can never strip protection from a
//! running gateway. In-flight decisions keep the snapshot they started with.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use tokio::signal::unix::SignalKind;
use tokio::signal::unix::signal;

use sentinel_gate_config::PolicyLoader;
use sentinel_gate_core::PolicyEngine;

// ============================================================================
// SECTION: Reload Task
// ============================================================================

/// Listens for SIGHUP and reloads the policy file on each delivery.
///
/// Runs until the process exits. When the signal stream cannot be installed
/// the task logs and returns; the gateway then simply runs without hot-reload.
pub async fn watch_sighup(engine: Arc<PolicyEngine>, loader: PolicyLoader, path: PathBuf) {
    let mut stream = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(error) => {
            tracing::error!(%error, "failed to install SIGHUP handler; hot-reload disabled");
            return;
        }
    };
    while stream.recv().await.is_some() {
        match loader.load_file(&path) {
            Ok(rules) => {
                let count = rules.len();
                engine.reload(rules);
                tracing::info!(path = %path.display(), rules = count, "policy reloaded");
            }
            Err(error) => {
                tracing::error!(
                    path = %path.display(),
                    %error,
                    "policy reload failed; keeping previous rules"
                );
            }
        }
    }
}
