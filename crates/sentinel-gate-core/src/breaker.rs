// crates/sentinel-gate-core/src/breaker.rs
// ============================================================================
// Module: Sentinel Gate Circuit Breaker
// Description: Per-scope fixed-window rate limiting for tool invocations.
// Purpose: Deny runaway call loops after policy evaluation admits a message.
// Dependencies: serde, std
// ============================================================================

//! ## Overview
//! The circuit breaker tracks invocation counts per scope key (normally the
//! tool name) over fixed windows. Once the window duration elapses the count
//! resets and the window restarts; counts never decay incrementally. The call
//! that crosses the threshold is itself counted, so an over-threshold scope
//! stays denied until the window rolls over.
//!
//! Scope state is created lazily on first observation and lives for the
//! process lifetime. Admission checks for one scope are serialized; two
//! concurrent callers can never both pass where a serialized count would deny
//! the second.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Circuit breaker tuning.
///
/// # Invariants
/// - A disabled breaker admits every call without recording state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Master enable switch.
    pub enabled: bool,
    /// Maximum admitted calls per scope within one window.
    pub threshold: u32,
    /// Window duration after which the count resets.
    pub window: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 100,
            window: Duration::from_secs(60),
        }
    }
}

// ============================================================================
// SECTION: Window State
// ============================================================================

/// Mutable per-scope counter state.
#[derive(Debug, Clone, Copy)]
struct ScopeWindow {
    /// Start of the current window.
    window_start: Instant,
    /// Invocations observed since the window began.
    count: u32,
}

// ============================================================================
// SECTION: Circuit Breaker
// ============================================================================

/// Thread-safe fixed-window rate limiter.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Tuning parameters, fixed at construction.
    config: CircuitBreakerConfig,
    /// Lazily populated per-scope windows.
    scopes: Mutex<HashMap<String, ScopeWindow>>,
}

impl CircuitBreaker {
    /// Creates a breaker with the provided tuning.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            scopes: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configured tuning.
    #[must_use]
    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Admission check for one invocation of `scope`.
    ///
    /// Counts the call, then admits while the window count stays at or below
    /// the threshold. Denials are not rolled back; the denied call remains in
    /// the window baseline.
    #[must_use]
    pub fn admit(&self, scope: &str) -> bool {
        if !self.config.enabled {
            return true;
        }
        let Ok(mut scopes) = self.scopes.lock() else {
            // Poisoned state fails open for availability; the policy layer
            // already ran.
            return true;
        };
        let now = Instant::now();
        let window = scopes.entry(scope.to_owned()).or_insert(ScopeWindow {
            window_start: now,
            count: 0,
        });
        if now.duration_since(window.window_start) >= self.config.window {
            window.window_start = now;
            window.count = 0;
        }
        window.count = window.count.saturating_add(1);
        window.count <= self.config.threshold
    }

    /// Human-readable denial reason for audit output.
    #[must_use]
    pub fn denial_reason(&self, scope: &str) -> String {
        format!(
            "Circuit Breaker: {scope} exceeded {} calls in {}s",
            self.config.threshold,
            self.config.window.as_secs()
        )
    }
}
