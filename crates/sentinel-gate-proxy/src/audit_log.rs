// crates/sentinel-gate-proxy/src/audit_log.rs
// ============================================================================
// Module: Sentinel Gate File Audit Sink
// Description: Append-only JSON-lines audit log.
// Purpose: Persist non-default decisions without ever failing the message path.
// Dependencies: sentinel-gate-core, serde_json
// ============================================================================

//! ## Overview
//! One JSON object per line, appended under a mutex so concurrent decisions
//! never interleave bytes. Write failures are swallowed: auditing is
//! best-effort and must never block or break forwarding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use sentinel_gate_core::AuditEntry;
use sentinel_gate_core::AuditSink;

// ============================================================================
// SECTION: File Audit Sink
// ============================================================================

/// Audit sink appending JSON lines to a file.
#[derive(Debug)]
pub struct FileAuditSink {
    /// Open log file, serialized by a mutex.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens (or creates) the audit log in append mode.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the file cannot be opened; the
    /// caller degrades to the stderr sink in that case.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, entry: &AuditEntry) {
        let Ok(line) = serde_json::to_string(entry) else {
            return;
        };
        // A poisoned lock drops the entry; auditing never panics the caller.
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }
    }
}
