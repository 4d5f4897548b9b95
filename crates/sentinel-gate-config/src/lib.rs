// crates/sentinel-gate-config/src/lib.rs
// ============================================================================
// Module: Sentinel Gate Config
// Description: YAML policy document model and rule-set compilation.
// Purpose: Turn declarative policy files into validated engine snapshots.
// Dependencies: sentinel-gate-core, serde, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! Policies are declared in YAML and compiled into
//! [`sentinel_gate_core::RuleSet`] snapshots. Validation is front-loaded:
//! unknown operators and actions fail deserialization, and regex or glob
//! compile failures reject the whole file, so a bad policy can never become
//! the active snapshot.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod loader;
pub mod model;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use loader::DEFAULT_APPROVAL_TIMEOUT;
pub use loader::PolicyLoadError;
pub use loader::PolicyLoader;
pub use model::RawAction;
pub use model::RawCondition;
pub use model::RawOperator;
pub use model::RawPolicyFile;
pub use model::RawRule;
