// crates/sentinel-gate-core/src/message.rs
// ============================================================================
// Module: Sentinel Gate Inbound Messages
// Description: Parsed JSON-RPC message view and argument path resolution.
// Purpose: Give the decision engine typed access to tool-invocation payloads.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The gateway's transport layer hands the core fully parsed JSON-RPC
//! payloads. [`InboundMessage`] wraps one payload and exposes the fields the
//! decision engine needs: method, request id, tool name, and the arguments
//! object. [`ArgumentPath`] resolves dotted paths inside the arguments object.
//!
//! The core never sees raw bytes; framing is owned by the proxy crate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON-RPC method name that marks a tool-invocation message.
pub const TOOL_CALL_METHOD: &str = "tools/call";

// ============================================================================
// SECTION: Inbound Message
// ============================================================================

/// Parsed tool-invocation record handed to the decision engine.
///
/// # Invariants
/// - The wrapped payload is immutable for the lifetime of the decision.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Full JSON-RPC payload as parsed by the transport layer.
    payload: Value,
}

impl InboundMessage {
    /// Wraps a parsed JSON-RPC payload.
    #[must_use]
    pub const fn new(payload: Value) -> Self {
        Self {
            payload,
        }
    }

    /// Returns the full payload for forwarding and auditing.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the JSON-RPC method name, if present.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.payload.get("method").and_then(Value::as_str)
    }

    /// Returns the JSON-RPC request id, if present.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.payload.get("id")
    }

    /// Returns `true` when the message requests execution of a named tool.
    #[must_use]
    pub fn is_tool_call(&self) -> bool {
        self.method() == Some(TOOL_CALL_METHOD)
    }

    /// Returns the requested tool name (`params.name`), if present.
    #[must_use]
    pub fn tool_name(&self) -> Option<&str> {
        self.payload.get("params").and_then(|params| params.get("name")).and_then(Value::as_str)
    }

    /// Returns the tool arguments object (`params.arguments`), if present.
    #[must_use]
    pub fn arguments(&self) -> Option<&Map<String, Value>> {
        self.payload
            .get("params")
            .and_then(|params| params.get("arguments"))
            .and_then(Value::as_object)
    }
}

impl From<Value> for InboundMessage {
    fn from(payload: Value) -> Self {
        Self::new(payload)
    }
}

// ============================================================================
// SECTION: Argument Paths
// ============================================================================

/// Dotted path into a JSON arguments object.
///
/// # Invariants
/// - Segments are split on `.` once at construction; resolution never parses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentPath {
    /// Path segments in traversal order.
    segments: Vec<String>,
    /// Original dotted form, kept for display and auditing.
    source: String,
}

impl ArgumentPath {
    /// Parses a dotted path such as `query` or `options.limit`.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path.split('.').map(str::to_owned).collect(),
            source: path.to_owned(),
        }
    }

    /// Returns the original dotted form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Resolves the path within an arguments object.
    ///
    /// Returns `None` when any segment is absent or an intermediate value is
    /// not an object. Absence is a distinct outcome the policy engine treats
    /// as "rule skipped", never as a false condition match.
    #[must_use]
    pub fn resolve<'a>(&self, arguments: &'a Map<String, Value>) -> Option<&'a Value> {
        let mut segments = self.segments.iter();
        let first = segments.next()?;
        let mut current = arguments.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Resolves the path within an arbitrary JSON value.
    ///
    /// Used for condition-level field references that drill into the value
    /// already selected by the rule's target argument path.
    #[must_use]
    pub fn resolve_value<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for segment in &self.segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl fmt::Display for ArgumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.source.fmt(f)
    }
}

impl From<&str> for ArgumentPath {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}
