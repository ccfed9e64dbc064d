//! Error types for storage and flight planning.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use gcom_core::{ReconcileError, ResolveError};
use thiserror::Error;

/// Which table an operation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Waypoint,
    Route,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Waypoint => f.write_str("waypoint"),
            EntityKind::Route => f.write_str("route"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Create was handed an entity that already carries an id.
    #[error("non-sentinel id {id} passed to {kind} create")]
    NonSentinelIdentifier { kind: EntityKind, id: i64 },
    /// Update/delete/get-by-id was handed an entity that was never stored.
    #[error("{kind} has not been created yet")]
    UncreatedIdentifier { kind: EntityKind },
    #[error("{kind} not found")]
    NotFound { kind: EntityKind },
    #[error("storage error: {0}")]
    Io(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("failed to encode solver input: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("solver input {} does not exist", .path.display())]
    Precondition { path: PathBuf },
    #[error("solver exited without writing {}", .path.display())]
    Postcondition { path: PathBuf },
    #[error("failed to launch solver {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("solver exited with {}: {output}", exit_label(.status))]
    Process { status: Option<i32>, output: String },
    #[error("solver did not finish within {after:?}")]
    Timeout { after: Duration },
    #[error("malformed solver output: {0}")]
    Parse(#[source] serde_json::Error),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}
