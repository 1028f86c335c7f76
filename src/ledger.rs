//! Per-occurrence state: todo, done or cancelled.
//!
//! State is recorded in the task's `completed` and `cancelled` key sets
//! under both the actual and display date of the occurrence. The two sets
//! are kept mutually exclusive per occurrence. Nothing transitions on its own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::task::{OccurrenceKey, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceState {
    Todo,
    Done,
    Cancelled,
}

impl OccurrenceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OccurrenceState::Todo => "todo",
            OccurrenceState::Done => "done",
            OccurrenceState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OccurrenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OccurrenceState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" | "open" => Ok(OccurrenceState::Todo),
            "done" | "complete" | "completed" => Ok(OccurrenceState::Done),
            "cancel" | "cancelled" | "canceled" => Ok(OccurrenceState::Cancelled),
            other => Err(format!("unknown state '{other}' (expected todo|done|cancel)")),
        }
    }
}

/// Current state of an occurrence. A cancelled key wins over a completed one
/// should legacy data carry both.
pub fn state_of(task: &Task, key: &OccurrenceKey) -> OccurrenceState {
    if task.cancelled.contains(key) {
        OccurrenceState::Cancelled
    } else if task.completed.contains(key) {
        OccurrenceState::Done
    } else {
        OccurrenceState::Todo
    }
}

/// Flip done/not-done. Returns the new state.
pub fn toggle_done(task: &mut Task, key: &OccurrenceKey) -> OccurrenceState {
    if task.completed.contains(key) {
        task.completed.remove(key);
    } else {
        task.cancelled.remove(key);
        task.completed.insert(key);
    }
    state_of(task, key)
}

/// Flip cancelled/not-cancelled; cancelling also clears any completion.
pub fn toggle_cancel(task: &mut Task, key: &OccurrenceKey) -> OccurrenceState {
    if task.cancelled.contains(key) {
        task.cancelled.remove(key);
    } else {
        task.completed.remove(key);
        task.cancelled.insert(key);
    }
    state_of(task, key)
}

/// Force an occurrence into `state`, whatever it was before.
pub fn set_state(task: &mut Task, key: &OccurrenceKey, state: OccurrenceState) {
    task.completed.remove(key);
    task.cancelled.remove(key);
    match state {
        OccurrenceState::Todo => {}
        OccurrenceState::Done => task.completed.insert(key),
        OccurrenceState::Cancelled => task.cancelled.insert(key),
    }
}
