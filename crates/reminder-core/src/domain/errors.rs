//! Errors - エラー型と分類
//!
//! Per-user errors (provider / delivery / timeout / crash) never leave the
//! worker boundary: they are converted into a failure outcome for that user.
//! Only `BatchInProgress` and `DirectoryUnavailable` reach the caller of
//! `run_batch`.

use std::time::Duration;

use thiserror::Error;

use super::ids::{BatchId, UserId};
use super::outcome::FailureKind;

/// Task snapshot lookup failed for one user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Notification delivery failed (explicit rejection or transport failure).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DeliveryError(pub String);

impl DeliveryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The user directory could not enumerate active users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DirectoryError(pub String);

impl DirectoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderError {
    #[error("task lookup failed for {user_id}: {source}")]
    Provider {
        user_id: UserId,
        #[source]
        source: ProviderError,
    },

    #[error("reminder delivery failed for {user_id}: {source}")]
    Delivery {
        user_id: UserId,
        #[source]
        source: DeliveryError,
    },

    #[error("worker for {user_id} did not report within {}s", .timeout.as_secs())]
    Timeout { user_id: UserId, timeout: Duration },

    #[error("worker for {user_id} terminated without reporting: {message}")]
    WorkerCrashed { user_id: UserId, message: String },

    #[error("reminder batch {0} is already in progress")]
    BatchInProgress(BatchId),

    #[error("failed to enumerate active users: {0}")]
    DirectoryUnavailable(#[source] DirectoryError),
}

impl ReminderError {
    /// Classification recorded in a failure outcome.
    ///
    /// Batch-level errors never become a per-user outcome, but they still map
    /// to a kind so that logs carry a uniform label.
    pub fn kind(&self) -> FailureKind {
        match self {
            ReminderError::Provider { .. } => FailureKind::Provider,
            ReminderError::Delivery { .. } => FailureKind::Delivery,
            ReminderError::Timeout { .. } => FailureKind::Timeout,
            ReminderError::WorkerCrashed { .. } => FailureKind::Crashed,
            ReminderError::BatchInProgress(_) => FailureKind::Overlap,
            ReminderError::DirectoryUnavailable(_) => FailureKind::Directory,
        }
    }

    /// Message kept in diagnostics: the collaborator's own reason when there
    /// is one, so "SMTP timeout" stays "SMTP timeout".
    pub fn diagnostic_message(&self) -> String {
        match self {
            ReminderError::Provider { source, .. } => source.to_string(),
            ReminderError::Delivery { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_batch_level(&self) -> bool {
        matches!(
            self,
            ReminderError::BatchInProgress(_) | ReminderError::DirectoryUnavailable(_)
        )
    }
}
