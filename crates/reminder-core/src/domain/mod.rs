//! Domain model (ids, users, task items, outcomes, batch state, events, errors).

pub mod batch;
pub mod errors;
pub mod events;
pub mod ids;
pub mod outcome;
pub mod progress;
pub mod state;
pub mod task_item;
pub mod user;

pub use self::batch::{BatchRun, OutcomeAck};
pub use self::errors::{DeliveryError, DirectoryError, ProviderError, ReminderError};
pub use self::events::BatchEvent;
pub use self::ids::{BatchId, UserId};
pub use self::outcome::{FailureKind, Outcome, OutcomeKind};
pub use self::progress::{BatchProgress, BatchSummary, UserFailure};
pub use self::state::{BatchState, WorkerPhase};
pub use self::task_item::{Priority, TaskItem};
pub use self::user::{ActiveUser, UserTask};
