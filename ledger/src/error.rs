//! Ledger error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, mutating or saving the ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Task {id} not found; no updates applied.")]
    NotFound { id: String },

    #[error("Task ID counter exhausted at {next_id}; no task created.")]
    CounterOverflow { next_id: u64 },

    #[error("Failed to parse ledger {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode ledger {path}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock {path}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LedgerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the one condition callers are expected to handle
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
