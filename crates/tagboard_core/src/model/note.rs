//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record and its task projection.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `tags` is exactly the token set extractable from `text`; edits replace
//!   the whole note, they never touch `tags` independently.
//! - A note is a task iff `task != TaskPriority::None`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for every note.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type NoteId = Uuid;

/// Priority marker turning a note into a task.
///
/// Derived from leading `!`/`!!`/`!!!` marks in the raw text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Plain note, not surfaced in the task list.
    #[default]
    None,
    Low,
    Mid,
    High,
}

impl TaskPriority {
    /// Returns whether this marker makes the note a task.
    pub fn is_task(self) -> bool {
        self != TaskPriority::None
    }
}

/// Canonical note record cached by the store.
///
/// The remote service is the durable owner of this shape; the core never
/// mutates a field in place, it swaps whole records on edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable global id used for edits, deletes and cache replacement.
    pub id: NoteId,
    /// Raw note body after task-marker stripping.
    pub text: String,
    /// Journal day this note belongs to.
    pub date: NaiveDate,
    /// Creation instant in epoch milliseconds; drives query ordering.
    pub timestamp: i64,
    /// Tag tokens derived from `text`, first-seen order, no duplicates.
    pub tags: Vec<String>,
    /// Task priority marker, `none` for plain notes.
    #[serde(default)]
    pub task: TaskPriority,
    /// Optional due date parsed from the task marker.
    pub duedate: Option<NaiveDate>,
}

impl Note {
    /// Returns whether this note carries a task marker.
    pub fn is_task(&self) -> bool {
        self.task.is_task()
    }

    /// Returns whether this note carries the given tag token.
    pub fn has_tag(&self, token: &str) -> bool {
        self.tags.iter().any(|tag| tag == token)
    }
}
