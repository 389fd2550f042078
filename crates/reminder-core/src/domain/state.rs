//! State - バッチとワーカーの状態

use serde::{Deserialize, Serialize};

/// Lifecycle of the coordinator's batch.
///
/// - Idle -> Running: `run_batch` accepted
/// - Running -> Completed: last outcome recorded (or no users at all)
/// - Completed -> Running: next `run_batch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Completed,
}

impl BatchState {
    pub fn is_running(self) -> bool {
        matches!(self, BatchState::Running)
    }
}

/// Per-worker state machine.
///
/// `Created -> FetchingTasks -> {NoTasks | Sending} -> Reporting -> Terminated`
///
/// Every path goes through `Reporting`, including provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPhase {
    Created,
    FetchingTasks,
    NoTasks,
    Sending,
    Reporting,
    Terminated,
}

impl WorkerPhase {
    /// Is `next` a legal successor of `self`?
    pub fn can_advance_to(self, next: WorkerPhase) -> bool {
        use WorkerPhase::*;
        matches!(
            (self, next),
            (Created, FetchingTasks)
                | (FetchingTasks, NoTasks)
                | (FetchingTasks, Sending)
                | (FetchingTasks, Reporting)
                | (NoTasks, Reporting)
                | (Sending, Reporting)
                | (Reporting, Terminated)
        )
    }
}
