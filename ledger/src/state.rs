//! Ledger document types
//!
//! The whole ledger is one JSON document: mission metadata, a flat ordered list
//! of tasks, and the counter used to allocate the next task ID.

use clap::ValueEnum;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::num::IntErrorKind;

use crate::error::LedgerError;
use crate::{TASK_ID_PREFIX, TASK_ID_START};

/// Task status in the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, nobody has picked it up yet
    #[default]
    Todo,
    /// An agent is working on it
    #[value(name = "in_progress")]
    InProgress,
    /// Finished
    Done,
    /// Cannot progress without outside help
    Blocked,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Todo => write!(f, "todo"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Done => write!(f, "done"),
            Self::Blocked => write!(f, "blocked"),
        }
    }
}

/// A single unit of work owned by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Prefix-ID (e.g., "TKT-100"), never reassigned
    pub id: String,

    /// What needs doing
    pub description: String,

    /// Skill tag of the agent expected to pick it up
    pub assigned_skill: String,

    /// Current status
    pub status: TaskStatus,

    /// Creation timestamp (local ISO-8601)
    pub created_at: String,

    /// Path of the output produced for this task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,

    /// Fields written by other tools, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Create a new `todo` task
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        assigned_skill: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            assigned_skill: assigned_skill.into(),
            status: TaskStatus::Todo,
            created_at: created_at.into(),
            artifact: None,
            extra: Map::new(),
        }
    }

    /// Numeric suffix of the ID, if it is a recognized Prefix-ID
    pub fn suffix(&self) -> Option<u64> {
        task_id_suffix(&self.id)
    }
}

/// The persisted ledger document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerState {
    pub mission_id: String,

    /// Free-form overall status (e.g., "active")
    pub status: String,

    /// Tasks in insertion order
    pub tasks: Vec<Task>,

    /// Suffix for the next allocated task ID
    pub next_id: u64,

    /// Stamped on every save
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    /// Top-level fields written by other tools
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            mission_id: default_mission_id(),
            status: default_status(),
            tasks: Vec::new(),
            next_id: TASK_ID_START,
            last_updated: None,
            extra: Map::new(),
        }
    }
}

impl LedgerState {
    /// Hand out the next task ID and advance the counter
    ///
    /// `u64::MAX` marks an exhausted counter and is never handed out.
    pub fn allocate_id(&mut self) -> Result<String, LedgerError> {
        let following = self
            .next_id
            .checked_add(1)
            .ok_or(LedgerError::CounterOverflow { next_id: self.next_id })?;
        let id = format!("{}{}", TASK_ID_PREFIX, self.next_id);
        self.next_id = following;
        Ok(id)
    }

    /// Append a task, keeping insertion order
    pub fn push_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// First task whose ID matches exactly
    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Mutable access to the first task whose ID matches exactly
    pub fn find_task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

/// On-disk shape accepted by the loader
///
/// Older ledgers have no `next_id`, and hand-edited ones may lack the mission
/// fields, so everything except the task records is optional here.
#[derive(Debug, Deserialize)]
pub(crate) struct StoredLedger {
    #[serde(default = "default_mission_id")]
    mission_id: String,

    #[serde(default = "default_status")]
    status: String,

    #[serde(default)]
    tasks: Vec<Task>,

    #[serde(default)]
    next_id: Option<u64>,

    #[serde(default)]
    last_updated: Option<String>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl StoredLedger {
    /// Resolve the counter and produce the in-memory state
    pub(crate) fn into_state(self) -> LedgerState {
        let floor = counter_floor(&self.tasks);
        let next_id = match (self.next_id, floor) {
            (None, _) => {
                let derived = derive_next_id(&self.tasks);
                debug!("into_state: no next_id stored, backfilled {}", derived);
                derived
            }
            (Some(stored), Some(floor)) if stored < floor => {
                warn!(
                    "Stored next_id {} collides with existing task IDs, raising it to {}",
                    stored, floor
                );
                floor
            }
            (Some(stored), _) => stored,
        };

        LedgerState {
            mission_id: self.mission_id,
            status: self.status,
            tasks: self.tasks,
            next_id,
            last_updated: self.last_updated,
            extra: self.extra,
        }
    }
}

fn default_mission_id() -> String {
    "INIT".to_string()
}

fn default_status() -> String {
    "active".to_string()
}

/// Numeric suffix of a Prefix-ID, `None` for anything else
pub fn task_id_suffix(id: &str) -> Option<u64> {
    id.strip_prefix(TASK_ID_PREFIX)?.parse().ok()
}

/// Smallest counter value that cannot collide with this ID
///
/// Suffixes too large for the counter, and `u64::MAX` itself, give `u64::MAX`:
/// the counter is exhausted.
fn id_floor(id: &str) -> Option<u64> {
    let digits = id.strip_prefix(TASK_ID_PREFIX)?;
    match digits.parse::<u64>() {
        Ok(n) => Some(n.checked_add(1).unwrap_or(u64::MAX)),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(u64::MAX),
        Err(_) => None,
    }
}

fn counter_floor(tasks: &[Task]) -> Option<u64> {
    tasks.iter().filter_map(|t| id_floor(&t.id)).max()
}

/// Counter value implied by existing tasks
///
/// One past the largest recognized suffix, never below [`TASK_ID_START`].
/// Unrecognized IDs are skipped. A suffix at or beyond `u64::MAX` leaves the
/// counter exhausted, so the next allocation fails instead of reusing an ID.
pub fn derive_next_id(tasks: &[Task]) -> u64 {
    counter_floor(tasks).map_or(TASK_ID_START, |floor| floor.max(TASK_ID_START))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn task(id: &str) -> Task {
        Task::new(id, "desc", "skill", "2026-01-01T00:00:00.000000")
    }

    fn stored(json: &str) -> LedgerState {
        serde_json::from_str::<StoredLedger>(json).unwrap().into_state()
    }

    #[test]
    fn test_task_status_serialization() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in_progress\"");
        let status: TaskStatus = serde_json::from_str("\"blocked\"").unwrap();
        assert_eq!(status, TaskStatus::Blocked);
        assert_eq!(TaskStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_task_status_value_names() {
        assert_eq!(TaskStatus::from_str("in_progress", false).unwrap(), TaskStatus::InProgress);
        assert_eq!(TaskStatus::from_str("todo", false).unwrap(), TaskStatus::Todo);
        assert!(TaskStatus::from_str("finished", false).is_err());
    }

    #[test]
    fn test_task_id_suffix() {
        assert_eq!(task_id_suffix("TKT-105"), Some(105));
        assert_eq!(task_id_suffix("TKT-"), None);
        assert_eq!(task_id_suffix("TKT-abc"), None);
        assert_eq!(task_id_suffix("BUG-7"), None);
        assert_eq!(task_id_suffix("tkt-7"), None);
    }

    #[test]
    fn test_allocate_id_advances_counter() {
        let mut state = LedgerState::default();
        assert_eq!(state.allocate_id().unwrap(), "TKT-100");
        assert_eq!(state.allocate_id().unwrap(), "TKT-101");
        assert_eq!(state.next_id, 102);
    }

    #[test]
    fn test_allocate_id_stops_before_wrapping() {
        let mut state = LedgerState {
            next_id: u64::MAX - 1,
            ..Default::default()
        };
        assert_eq!(state.allocate_id().unwrap(), format!("TKT-{}", u64::MAX - 1));

        let err = state.allocate_id().unwrap_err();
        assert!(matches!(err, LedgerError::CounterOverflow { next_id } if next_id == u64::MAX));
        assert_eq!(state.next_id, u64::MAX);
    }

    #[test]
    fn test_backfill_from_largest_counter_suffix_is_exhausted() {
        let state = stored(
            r#"{"tasks":[
                {"id":"TKT-18446744073709551615","description":"a",
                 "assigned_skill":"s","status":"todo","created_at":"t"}
            ]}"#,
        );
        assert_eq!(state.next_id, u64::MAX);

        let mut state = state;
        assert!(matches!(state.allocate_id(), Err(LedgerError::CounterOverflow { .. })));
    }

    #[test]
    fn test_backfill_counts_oversized_suffix() {
        let state = stored(
            r#"{"tasks":[
                {"id":"TKT-100","description":"a","assigned_skill":"s","status":"todo","created_at":"t"},
                {"id":"TKT-100000000000000000000","description":"b",
                 "assigned_skill":"s","status":"todo","created_at":"t"}
            ]}"#,
        );
        assert_eq!(state.next_id, u64::MAX);
        assert_eq!(task_id_suffix("TKT-100000000000000000000"), None);
    }

    #[test]
    fn test_stored_counter_below_oversized_suffix_is_raised() {
        let state = stored(
            r#"{"next_id":101,"tasks":[
                {"id":"TKT-100000000000000000000","description":"a",
                 "assigned_skill":"s","status":"todo","created_at":"t"}
            ]}"#,
        );
        assert_eq!(state.next_id, u64::MAX);
    }

    #[test]
    fn test_backfill_uses_max_suffix() {
        let state = stored(
            r#"{"mission_id":"M1","status":"active","tasks":[
                {"id":"TKT-100","description":"a","assigned_skill":"s","status":"todo","created_at":"t"},
                {"id":"TKT-105","description":"b","assigned_skill":"s","status":"done","created_at":"t"},
                {"id":"TKT-103","description":"c","assigned_skill":"s","status":"todo","created_at":"t"},
                {"id":"TKT-x9","description":"d","assigned_skill":"s","status":"todo","created_at":"t"},
                {"id":"LEGACY-900","description":"e","assigned_skill":"s","status":"todo","created_at":"t"}
            ]}"#,
        );

        assert_eq!(state.next_id, 106);
        assert_eq!(state.mission_id, "M1");
        assert_eq!(state.tasks.len(), 5);
    }

    #[test]
    fn test_backfill_without_tasks() {
        let state = stored(r#"{"mission_id":"M1","status":"active","tasks":[]}"#);
        assert_eq!(state.next_id, TASK_ID_START);
    }

    #[test]
    fn test_backfill_never_below_start() {
        assert_eq!(derive_next_id(&[task("TKT-3")]), TASK_ID_START);
        assert_eq!(derive_next_id(&[task("TKT-99")]), TASK_ID_START);
        assert_eq!(derive_next_id(&[task("TKT-100")]), 101);
    }

    #[test]
    fn test_stored_counter_is_kept() {
        let state = stored(
            r#"{"mission_id":"M1","status":"active","next_id":140,"tasks":[
                {"id":"TKT-100","description":"a","assigned_skill":"s","status":"todo","created_at":"t"}
            ]}"#,
        );
        assert_eq!(state.next_id, 140);
    }

    #[test]
    fn test_stale_counter_is_raised() {
        let state = stored(
            r#"{"mission_id":"M1","status":"active","next_id":101,"tasks":[
                {"id":"TKT-100","description":"a","assigned_skill":"s","status":"todo","created_at":"t"},
                {"id":"TKT-104","description":"b","assigned_skill":"s","status":"todo","created_at":"t"}
            ]}"#,
        );
        assert_eq!(state.next_id, 105);
    }

    #[test]
    fn test_missing_mission_fields_use_defaults() {
        let state = stored("{}");
        assert_eq!(state, LedgerState::default());
    }

    #[test]
    fn test_unknown_fields_survive() {
        let state = stored(
            r#"{"mission_id":"M1","status":"active","next_id":101,"owner":"ops","tasks":[
                {"id":"TKT-100","description":"a","assigned_skill":"s","status":"todo","created_at":"t","priority":3}
            ]}"#,
        );

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["owner"], "ops");
        assert_eq!(value["tasks"][0]["priority"], 3);
        assert!(value["tasks"][0].get("artifact").is_none());
    }

    #[test]
    fn test_find_task_matches_exactly() {
        let mut state = LedgerState::default();
        state.push_task(task("TKT-100"));
        state.push_task(task("TKT-1000"));

        assert_eq!(state.find_task("TKT-1000").map(|t| t.id.as_str()), Some("TKT-1000"));
        assert!(state.find_task("TKT-10").is_none());
        assert!(state.find_task("tkt-100").is_none());
        state.find_task_mut("TKT-100").unwrap().status = TaskStatus::Done;
        assert_eq!(state.tasks[0].status, TaskStatus::Done);
    }

    proptest! {
        #[test]
        fn prop_allocation_is_gapless(count in 0usize..200) {
            let mut state = LedgerState::default();
            for i in 0..count {
                let id = state.allocate_id().unwrap();
                prop_assert_eq!(id, format!("TKT-{}", TASK_ID_START + i as u64));
            }
            prop_assert_eq!(state.next_id, TASK_ID_START + count as u64);
        }

        #[test]
        fn prop_backfill_exceeds_every_suffix(suffixes in proptest::collection::vec(0u64..1_000_000, 0..30)) {
            let tasks: Vec<Task> = suffixes.iter().map(|n| task(&format!("TKT-{}", n))).collect();
            let next = derive_next_id(&tasks);
            prop_assert!(next >= TASK_ID_START);
            for n in &suffixes {
                prop_assert!(next > *n);
            }
        }
    }
}
