//! Events - バッチで発生したドメインイベント
//!
//! EventSink に渡されるのはここで定義したイベントのみ。

use serde::{Deserialize, Serialize};

use super::ids::{BatchId, UserId};
use super::outcome::Outcome;
use super::progress::BatchSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    BatchStarted {
        batch_id: BatchId,
        total: usize,
    },
    UserCompleted {
        batch_id: BatchId,
        user_id: UserId,
        outcome: Outcome,
        elapsed_ms: u64,
    },
    BatchCompleted(BatchSummary),
    BatchRejected {
        running: BatchId,
    },
}

impl BatchEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BatchEvent::BatchStarted { .. } => "batch_started",
            BatchEvent::UserCompleted { .. } => "user_completed",
            BatchEvent::BatchCompleted(_) => "batch_completed",
            BatchEvent::BatchRejected { .. } => "batch_rejected",
        }
    }
}
