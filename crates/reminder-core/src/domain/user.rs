//! Users as seen by the reminder pipeline, and the per-user work item.

use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// An active (non-deleted) user returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveUser {
    pub id: UserId,
    pub email: String,
}

impl ActiveUser {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

/// The ephemeral reminder unit for one user within one batch.
///
/// Lives in the coordinator's tracking map from dispatch until its outcome is
/// recorded; the outcome itself goes to the batch counters and failure list.
#[derive(Debug, Clone)]
pub struct UserTask {
    pub user: ActiveUser,
    pub started_at: tokio::time::Instant,
}

impl UserTask {
    pub fn new(user: ActiveUser) -> Self {
        Self {
            user,
            started_at: tokio::time::Instant::now(),
        }
    }
}
