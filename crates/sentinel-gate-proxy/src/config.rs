// crates/sentinel-gate-proxy/src/config.rs
// ============================================================================
// Module: Sentinel Gate Proxy Configuration
// Description: CLI arguments and environment-variable configuration.
// Purpose: Resolve gateway settings with CLI flags taking precedence over env.
// Dependencies: clap, sentinel-gate-core
// ============================================================================

//! ## Overview
//! All gateway settings come from CLI flags with environment-variable
//! fallbacks (`MCP_*`), clap resolving precedence: an explicit flag beats the
//! variable, the variable beats the built-in default. Trailing arguments are
//! the wrapped tool-server command line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::ArgAction;
use clap::Parser;

use sentinel_gate_core::CircuitBreakerConfig;

// ============================================================================
// SECTION: Gateway Arguments
// ============================================================================

/// Command-line and environment configuration of the gateway.
#[derive(Debug, Parser)]
#[command(
    name = "sentinel-gate",
    about = "Runtime security gateway for JSON-RPC tool servers",
    version
)]
pub struct GatewayArgs {
    /// YAML policy file; absence starts the gateway with an allow-all policy.
    #[arg(long, env = "MCP_POLICY_FILE", value_name = "PATH")]
    pub policy_file: Option<PathBuf>,

    /// Append-only JSON-lines audit log; absence falls back to stderr.
    #[arg(long, env = "MCP_AUDIT_LOG", value_name = "PATH")]
    pub audit_log: Option<PathBuf>,

    /// Loopback port of the approval HTTP endpoint.
    #[arg(long, env = "MCP_HITL_PORT", default_value_t = 8888)]
    pub hitl_port: u16,

    /// Default approval wait, in seconds, for rules without their own.
    #[arg(long, env = "MCP_HITL_TIMEOUT_SECONDS", default_value_t = 300)]
    pub hitl_timeout_seconds: u64,

    /// Whether the per-tool circuit breaker is active.
    #[arg(
        long,
        env = "MCP_CIRCUIT_BREAKER",
        default_value_t = true,
        action = ArgAction::Set,
        value_name = "BOOL"
    )]
    pub circuit_breaker: bool,

    /// Calls admitted per tool per window before the breaker opens.
    #[arg(long, env = "MCP_MAX_CALLS_PER_TOOL", default_value_t = 100)]
    pub max_calls_per_tool: u32,

    /// Breaker window length in seconds.
    #[arg(long, env = "MCP_CALL_WINDOW_SECONDS", default_value_t = 60)]
    pub call_window_seconds: u64,

    /// Wrapped tool-server command and its arguments.
    #[arg(required = true, trailing_var_arg = true, value_name = "COMMAND")]
    pub server_command: Vec<String>,
}

impl GatewayArgs {
    /// Circuit-breaker configuration derived from the resolved settings.
    #[must_use]
    pub const fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            enabled: self.circuit_breaker,
            threshold: self.max_calls_per_tool,
            window: Duration::from_secs(self.call_window_seconds),
        }
    }

    /// Default approval wait applied to rules without `timeout_secs`.
    #[must_use]
    pub const fn approval_timeout(&self) -> Duration {
        Duration::from_secs(self.hitl_timeout_seconds)
    }
}
