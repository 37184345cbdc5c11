// crates/gateway-workspace-core/src/audit.rs
// ============================================================================
// Module: Gateway Workspace Audit Logging
// Description: Structured audit events for workspace mutations.
// Purpose: Emit JSON-line audit logs without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every rename, delete, import, and reconcile call records exactly one
//! [`WorkspaceAuditEvent`]. Sinks are pluggable so deployments can route
//! events to their preferred logging pipeline; the bundled sinks write JSON
//! lines to stderr or to an append-only file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::model::EntityKind;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Workspace operation classification.
///
/// # Invariants
/// - Variants are stable for audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceOperation {
    /// Entity rename with reference propagation.
    Rename,
    /// Delete by name (optionally forced).
    Delete,
    /// Config document import.
    Import,
    /// Dangling reference reconciliation.
    Reconcile,
}

/// Workspace operation outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceOutcome {
    /// The operation changed the store.
    Ok,
    /// The operation succeeded without changing anything.
    Unchanged,
    /// The operation failed.
    Error,
}

/// Workspace audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Operation performed.
    pub operation: WorkspaceOperation,
    /// Entity kind targeted, when the operation targets one entity.
    pub entity_kind: Option<EntityKind>,
    /// Target name, when the operation targets one entity.
    pub name: Option<String>,
    /// New name for renames.
    pub new_name: Option<String>,
    /// Force flag for deletes.
    pub force: Option<bool>,
    /// Operation outcome.
    pub outcome: WorkspaceOutcome,
    /// Number of referencing records rewritten or detached.
    pub references_updated: usize,
    /// Normalized error kind label when the operation failed.
    pub error_kind: Option<&'static str>,
}

/// Inputs required to construct an audit event.
pub struct WorkspaceAuditEventParams {
    /// Operation performed.
    pub operation: WorkspaceOperation,
    /// Entity kind targeted.
    pub entity_kind: Option<EntityKind>,
    /// Target name.
    pub name: Option<String>,
    /// New name for renames.
    pub new_name: Option<String>,
    /// Force flag for deletes.
    pub force: Option<bool>,
    /// Operation outcome.
    pub outcome: WorkspaceOutcome,
    /// Number of referencing records rewritten or detached.
    pub references_updated: usize,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
}

impl WorkspaceAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: WorkspaceAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "workspace_audit",
            timestamp_ms,
            operation: params.operation,
            entity_kind: params.entity_kind,
            name: params.name,
            new_name: params.new_name,
            force: params.force,
            outcome: params.outcome,
            references_updated: params.references_updated,
            error_kind: params.error_kind,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for workspace mutation events.
pub trait WorkspaceAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &WorkspaceAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct WorkspaceStderrAuditSink;

impl WorkspaceAuditSink for WorkspaceStderrAuditSink {
    fn record(&self, event: &WorkspaceAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct WorkspaceFileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl WorkspaceFileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl WorkspaceAuditSink for WorkspaceFileAuditSink {
    fn record(&self, event: &WorkspaceAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct WorkspaceNoopAuditSink;

impl WorkspaceAuditSink for WorkspaceNoopAuditSink {
    fn record(&self, _event: &WorkspaceAuditEvent) {}
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]
mod tests {
    use super::WorkspaceAuditEvent;
    use super::WorkspaceAuditEventParams;
    use super::WorkspaceAuditSink;
    use super::WorkspaceFileAuditSink;
    use super::WorkspaceOperation;
    use super::WorkspaceOutcome;
    use crate::core::model::EntityKind;

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("audit.log");
        let sink = WorkspaceFileAuditSink::new(&path).expect("open audit log");
        for _ in 0 .. 2 {
            sink.record(&WorkspaceAuditEvent::new(WorkspaceAuditEventParams {
                operation: WorkspaceOperation::Delete,
                entity_kind: Some(EntityKind::Policy),
                name: Some("auth-catalog".to_string()),
                new_name: None,
                force: Some(true),
                outcome: WorkspaceOutcome::Ok,
                references_updated: 1,
                error_kind: None,
            }));
        }
        let contents = std::fs::read_to_string(&path).expect("read audit log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "workspace_audit");
        assert_eq!(first["operation"], "delete");
        assert_eq!(first["entity_kind"], "policy");
        assert_eq!(first["force"], true);
    }
}
