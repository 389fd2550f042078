//! Read-only views of a batch: live progress, completion summary, diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{BatchId, UserId};
use super::outcome::FailureKind;
use super::state::BatchState;

/// Point-in-time snapshot for monitoring queries.
///
/// Taken under the coordinator's lock, so the counters are mutually
/// consistent: `succeeded + failed == completed <= total`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchProgress {
    pub batch_id: Option<BatchId>,
    pub state: BatchState,
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub active_workers: usize,
}

impl BatchProgress {
    pub fn is_consistent(&self) -> bool {
        self.succeeded + self.failed == self.completed
            && self.completed <= self.total
            && self.active_workers == self.total - self.completed
    }
}

/// Aggregate result emitted once per batch when it reaches `Completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: BatchId,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchSummary {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// One user's failure, kept for logs and diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFailure {
    pub user_id: UserId,
    pub email: String,
    pub kind: FailureKind,
    pub message: String,
}
