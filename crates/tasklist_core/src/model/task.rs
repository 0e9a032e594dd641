//! Task record.
//!
//! # Responsibility
//! - Define the single entity shown on the task list screen.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` carries no length or format constraint; empty text is valid.
//! - `updated_at >= created_at` for records read back from storage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a task.
pub type TaskId = Uuid;

/// One to-do item.
///
/// Timestamps are unix epoch milliseconds assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    /// Returns whether `other` is the same stored record, ignoring field values.
    pub fn same_record(&self, other: &Task) -> bool {
        self.id == other.id
    }
}

/// Generates a fresh task identity.
pub fn new_task_id() -> TaskId {
    Uuid::new_v4()
}
