//! Ledger operations: add and update
//!
//! Each operation is one read-modify-write of the whole document. Nothing is
//! written unless the mutation succeeded.

use log::info;

use crate::error::LedgerError;
use crate::state::{Task, TaskStatus};
use crate::store::{LedgerStore, now_timestamp};

/// Task ledger backed by a [`LedgerStore`]
#[derive(Debug, Clone)]
pub struct Ledger {
    store: LedgerStore,
}

impl Ledger {
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Create a `todo` task and persist it together with the advanced counter
    pub fn add(&self, description: &str, skill: &str) -> Result<Task, LedgerError> {
        let _lock = self.store.lock()?;
        let mut state = self.store.load()?;

        let id = state.allocate_id()?;
        let task = Task::new(id, description, skill, now_timestamp());
        state.push_task(task.clone());
        self.store.save(&mut state)?;

        info!("Created {} for skill {}", task.id, task.assigned_skill);
        Ok(task)
    }

    /// Set a task's status and, when given, its artifact path
    ///
    /// An empty artifact is treated as absent. Fails with
    /// [`LedgerError::NotFound`] without writing anything if no task has the ID.
    /// With locking enabled, unknown IDs are rejected before the lock file or
    /// its directory are created.
    pub fn update(&self, task_id: &str, status: TaskStatus, artifact: Option<&str>) -> Result<Task, LedgerError> {
        if self.store.locking() && self.store.load()?.find_task(task_id).is_none() {
            return Err(LedgerError::NotFound {
                id: task_id.to_string(),
            });
        }

        let _lock = self.store.lock()?;
        let mut state = self.store.load()?;

        let task = state.find_task_mut(task_id).ok_or_else(|| LedgerError::NotFound {
            id: task_id.to_string(),
        })?;
        task.status = status;
        if let Some(artifact) = artifact.filter(|a| !a.is_empty()) {
            task.artifact = Some(artifact.to_string());
        }
        let updated = task.clone();
        self.store.save(&mut state)?;

        info!("Updated {} to {}", updated.id, updated.status);
        Ok(updated)
    }
}
