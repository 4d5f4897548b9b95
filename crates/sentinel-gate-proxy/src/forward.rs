// crates/sentinel-gate-proxy/src/forward.rs
// ============================================================================
// Module: Sentinel Gate Stream Forwarder
// Description: Stdio plumbing between the client and the wrapped tool server.
// Purpose: Apply verdicts on the client-to-server path, forward all else.
// Dependencies: sentinel-gate-core, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! The forwarder spawns the wrapped tool server with piped stdio and runs
//! three OS threads: client-to-server (the only path that consults the
//! orchestrator), server-to-client (unconditional forward), and a stderr
//! drain that surfaces the child's diagnostics through `tracing`.
//!
//! Framing is line-oriented JSON-RPC. Lines that do not parse as JSON pass
//! through untouched; the gateway only judges what it can read. A `Block`
//! verdict never reaches the tool server: the forwarder answers the client
//! directly with a synthesized JSON-RPC error on stdout.
//!
//! The client-to-server thread blocks for the whole of an escalation's
//! `await_decision`, so one pending approval back-pressures later messages on
//! the session. Accepted limitation for a single local session.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::process::Child;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;
use std::sync::Arc;
use std::thread;

use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use sentinel_gate_core::DecisionOrchestrator;
use sentinel_gate_core::InboundMessage;
use sentinel_gate_core::Verdict;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON-RPC error code for policy violations.
pub const POLICY_VIOLATION_CODE: i64 = -32000;

// ============================================================================
// SECTION: Forward Errors
// ============================================================================

/// Errors raised while setting up the forwarder.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// No wrapped server command was supplied.
    #[error("no tool-server command supplied")]
    EmptyCommand,
    /// The wrapped server failed to start.
    #[error("failed to spawn tool server '{command}': {source}")]
    SpawnFailed {
        /// Program name that failed to start.
        command: String,
        /// Underlying spawn error.
        #[source]
        source: io::Error,
    },
    /// The child process was spawned without the expected pipes.
    #[error("tool server is missing a stdio pipe")]
    MissingPipe,
    /// Waiting on the child process failed.
    #[error("failed waiting for tool server exit: {source}")]
    WaitFailed {
        /// Underlying wait error.
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// SECTION: Error Synthesis
// ============================================================================

/// Builds the JSON-RPC error answering a blocked message.
///
/// Carries the original request id (or null) so the client can correlate the
/// rejection.
#[must_use]
pub fn policy_violation_error(id: Option<Value>, reason: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id.unwrap_or(Value::Null),
        "error": {
            "code": POLICY_VIOLATION_CODE,
            "message": format!("Policy Violation: {reason}"),
        },
    })
}

// ============================================================================
// SECTION: Gateway Loop
// ============================================================================

/// Spawns the wrapped server and forwards until it exits.
///
/// Returns the child's exit status once both the client stream and the child
/// have finished.
///
/// # Errors
///
/// Returns [`ForwardError`] when the command is empty, the child cannot be
/// spawned, or its pipes are missing.
pub fn run_gateway(
    orchestrator: Arc<DecisionOrchestrator>,
    command: &[String],
) -> Result<ExitStatus, ForwardError> {
    let (program, args) = command.split_first().ok_or(ForwardError::EmptyCommand)?;
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ForwardError::SpawnFailed {
            command: program.clone(),
            source,
        })?;

    let threads = spawn_pumps(&mut child, orchestrator)?;
    let status = child.wait().map_err(|source| ForwardError::WaitFailed {
        source,
    })?;
    for handle in threads {
        let _ = handle.join();
    }
    Ok(status)
}

/// Starts the three pump threads, taking the child's pipes.
fn spawn_pumps(
    child: &mut Child,
    orchestrator: Arc<DecisionOrchestrator>,
) -> Result<Vec<thread::JoinHandle<()>>, ForwardError> {
    let child_stdin = child.stdin.take().ok_or(ForwardError::MissingPipe)?;
    let child_stdout = child.stdout.take().ok_or(ForwardError::MissingPipe)?;
    let child_stderr = child.stderr.take().ok_or(ForwardError::MissingPipe)?;

    let inbound = thread::spawn(move || {
        pump_client_to_server(orchestrator, child_stdin);
    });
    let outbound = thread::spawn(move || {
        pump_server_to_client(child_stdout);
    });
    let diagnostics = thread::spawn(move || {
        drain_server_stderr(child_stderr);
    });
    Ok(vec![inbound, outbound, diagnostics])
}

/// Client-to-server pump: the only path that consults the orchestrator.
///
/// Dropping the child's stdin at the end of the loop signals EOF so a
/// well-behaved tool server shuts down when the client disconnects.
fn pump_client_to_server(
    orchestrator: Arc<DecisionOrchestrator>,
    mut child_stdin: impl Write,
) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        match serde_json::from_str::<Value>(&line) {
            Ok(payload) => {
                let message = InboundMessage::new(payload);
                match orchestrator.decide(&message) {
                    Verdict::Forward
                    | Verdict::ForwardWithAudit {
                        ..
                    } => {
                        if writeln!(child_stdin, "{line}").is_err() {
                            break;
                        }
                    }
                    Verdict::Block {
                        reason,
                    } => {
                        tracing::warn!(%reason, "blocked tool invocation");
                        let error = policy_violation_error(message.id().cloned(), &reason);
                        if write_client_line(&error.to_string()).is_err() {
                            break;
                        }
                    }
                }
            }
            // Not JSON: pass through untouched.
            Err(_) => {
                if writeln!(child_stdin, "{line}").is_err() {
                    break;
                }
            }
        }
    }
}

/// Server-to-client pump: unconditional forwarding.
fn pump_server_to_client(child_stdout: impl io::Read) {
    let reader = BufReader::new(child_stdout);
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        if write_client_line(&line).is_err() {
            break;
        }
    }
}

/// Surfaces the child's stderr through the gateway's log.
fn drain_server_stderr(child_stderr: impl io::Read) {
    let reader = BufReader::new(child_stderr);
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        tracing::info!(target: "tool_server", "{line}");
    }
}

/// Writes one line to the gateway's stdout, the JSON-RPC channel.
///
/// The stdout lock keeps synthesized errors and forwarded responses from
/// interleaving.
fn write_client_line(line: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut guard = stdout.lock();
    writeln!(guard, "{line}")?;
    guard.flush()
}
