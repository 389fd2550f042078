//! Outcome model: the result a worker reports back exactly once per user.

use serde::{Deserialize, Serialize};

use super::errors::ReminderError;

/// SUCCESS / FAILURE, serialized the same way job outcomes are elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    Failure,
}

/// Why a user's reminder failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Provider,
    Delivery,
    Timeout,
    Crashed,
    Overlap,
    Directory,
}

/// Result of processing one user.
///
/// - `SUCCESS` with `reminded_tasks == 0`: nothing was due, no mail sent.
/// - `SUCCESS` with `reminded_tasks > 0`: a reminder listing that many tasks was delivered.
/// - `FAILURE`: `failure` and `reason` describe what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,

    #[serde(default)]
    pub reminded_tasks: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Outcome {
    pub fn success(reminded_tasks: usize) -> Self {
        Self {
            kind: OutcomeKind::Success,
            reminded_tasks,
            failure: None,
            reason: None,
        }
    }

    pub fn nothing_due() -> Self {
        Self::success(0)
    }

    pub fn failure(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Failure,
            reminded_tasks: 0,
            failure: Some(kind),
            reason: Some(reason.into()),
        }
    }

    pub fn from_error(error: &ReminderError) -> Self {
        Self::failure(error.kind(), error.diagnostic_message())
    }

    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }
}
