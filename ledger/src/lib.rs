//! SwarmLedger - flat JSON task ledger
//!
//! Coordinates work items between cooperating agents through a single JSON
//! document on local disk. One agent creates tasks with a description and a
//! skill tag, others move them through `todo -> in_progress -> done/blocked`
//! and attach the path of whatever they produced.
//!
//! # Layout
//!
//! ```text
//! _artifacts/
//! └── swarm_state.json   # mission metadata, task list, ID counter
//! ```
//!
//! # Example
//!
//! ```ignore
//! use swarmledger::{Ledger, LedgerStore, TaskStatus};
//!
//! let ledger = Ledger::new(LedgerStore::open("_artifacts/swarm_state.json"));
//! let task = ledger.add("write report", "writer")?;
//! ledger.update(&task.id, TaskStatus::Done, Some("out/report.md"))?;
//! ```

pub mod cli;
pub mod config;
mod error;
mod ledger;
mod state;
mod store;

pub use error::LedgerError;
pub use ledger::Ledger;
pub use state::{LedgerState, Task, TaskStatus, derive_next_id, task_id_suffix};
pub use store::{LedgerStore, LockGuard, now_timestamp};

/// Default location of the ledger document, relative to the working directory
pub const DEFAULT_STATE_PATH: &str = "_artifacts/swarm_state.json";

/// Prefix of every allocated task ID
pub const TASK_ID_PREFIX: &str = "TKT-";

/// Counter value of the first task in a fresh ledger
pub const TASK_ID_START: u64 = 100;
