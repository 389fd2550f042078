//! Task items owned by users; only the reminder-relevant fields are modelled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: u64,
    pub user_id: UserId,
    pub title: String,
    pub priority: Priority,
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl TaskItem {
    pub fn new(id: u64, user_id: UserId, title: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            title: title.into(),
            priority: Priority::Medium,
            due_at: None,
            completed: false,
            deleted: false,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    pub fn mark_completed(mut self) -> Self {
        self.completed = true;
        self
    }

    pub fn mark_deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// Not completed, not deleted, due at or after `now`.
    ///
    /// Items without a due date are never reminded about.
    pub fn is_incomplete_at(&self, now: DateTime<Utc>) -> bool {
        !self.completed && !self.deleted && self.due_at.is_some_and(|due| due >= now)
    }
}
