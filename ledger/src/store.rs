//! Ledger document persistence

use fs2::FileExt;
use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::LedgerError;
use crate::state::{LedgerState, StoredLedger};

/// Current local time in the ledger's sortable ISO-8601 form
pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Handle to the ledger document on disk
///
/// Holds no document state itself: every `load` reads the file afresh.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    /// Path of the JSON document
    path: PathBuf,
    /// Serialize mutations through an advisory lock file
    locking: bool,
}

impl LedgerStore {
    /// Point a store at the given document path
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        debug!("Opened ledger store at {}", path.display());
        Self { path, locking: false }
    }

    /// Enable or disable the advisory lock taken around mutations
    pub fn with_locking(mut self, locking: bool) -> Self {
        self.locking = locking;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn locking(&self) -> bool {
        self.locking
    }

    /// Sidecar file used for the advisory lock
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Load the document, or a fresh ledger if the file does not exist
    pub fn load(&self) -> Result<LedgerState, LedgerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("load: {} missing, starting fresh ledger", self.path.display());
                return Ok(LedgerState::default());
            }
            Err(e) => return Err(LedgerError::io(&self.path, e)),
        };

        let stored: StoredLedger = serde_json::from_str(&content).map_err(|source| LedgerError::Parse {
            path: self.path.clone(),
            source,
        })?;
        let state = stored.into_state();
        debug!("load: {} tasks, next_id={}", state.tasks.len(), state.next_id);
        Ok(state)
    }

    /// Stamp `last_updated` and write the whole document back
    pub fn save(&self, state: &mut LedgerState) -> Result<(), LedgerError> {
        self.ensure_parent()?;
        state.last_updated = Some(now_timestamp());

        let content = serde_json::to_string_pretty(state).map_err(|source| LedgerError::Encode {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, content).map_err(|e| LedgerError::io(&self.path, e))?;
        debug!("save: wrote {} tasks to {}", state.tasks.len(), self.path.display());
        Ok(())
    }

    /// Take the exclusive mutation lock, if locking is enabled
    ///
    /// Blocks until any other holder releases it. The lock lasts as long as
    /// the returned guard.
    pub fn lock(&self) -> Result<Option<LockGuard>, LedgerError> {
        if !self.locking {
            return Ok(None);
        }

        self.ensure_parent()?;
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| LedgerError::io(&lock_path, e))?;
        file.lock_exclusive().map_err(|source| LedgerError::Lock {
            path: lock_path.clone(),
            source,
        })?;
        debug!("lock: acquired {}", lock_path.display());
        Ok(Some(LockGuard { file, path: lock_path }))
    }

    fn ensure_parent(&self) -> Result<(), LedgerError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))
            }
            _ => Ok(()),
        }
    }
}

/// Held advisory lock; released on drop
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release {}: {}", self.path.display(), e);
        }
    }
}
