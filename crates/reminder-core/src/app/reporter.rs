//! OutcomeReporter - ワーカーから coordinator への一回限りの報告
//!
//! `report` は `self` を消費するので、1 つの reporter から二度報告することは
//! 型レベルで不可能。タイムアウトとワーカー自身の報告が競合した場合は
//! coordinator 側で後着を無視する。

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{BatchId, Outcome, OutcomeAck, UserId};

/// The single update point for batch state.
#[async_trait]
pub trait OutcomeReceiver: Send + Sync {
    async fn on_worker_outcome(
        &self,
        batch_id: BatchId,
        user_id: UserId,
        outcome: Outcome,
    ) -> OutcomeAck;
}

pub struct OutcomeReporter {
    batch_id: BatchId,
    user_id: UserId,
    receiver: Arc<dyn OutcomeReceiver>,
}

impl OutcomeReporter {
    pub fn new(batch_id: BatchId, user_id: UserId, receiver: Arc<dyn OutcomeReceiver>) -> Self {
        Self {
            batch_id,
            user_id,
            receiver,
        }
    }

    pub async fn report(self, outcome: Outcome) -> OutcomeAck {
        self.receiver
            .on_worker_outcome(self.batch_id, self.user_id, outcome)
            .await
    }
}

impl std::fmt::Debug for OutcomeReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeReporter")
            .field("batch_id", &self.batch_id)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
