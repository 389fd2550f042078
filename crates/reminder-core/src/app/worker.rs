//! UserReminderWorker - 1 ユーザー分のリマインダー処理
//!
//! # フロー
//! 1. TaskSnapshotProvider で未完了タスクを取得（失敗したら送信せずに失敗を報告）
//! 2. 0 件なら何もせず成功を報告
//! 3. Notifier でタスク名一覧を送信
//! 4. 結果を OutcomeReporter で一度だけ報告して終了

use std::sync::Arc;

use crate::app::reporter::OutcomeReporter;
use crate::domain::{ActiveUser, Outcome, ReminderError, WorkerPhase};
use crate::ports::{Notifier, TaskSnapshotProvider};

pub struct UserReminderWorker {
    user: ActiveUser,
    tasks: Arc<dyn TaskSnapshotProvider>,
    notifier: Arc<dyn Notifier>,
    phase: WorkerPhase,
}

impl UserReminderWorker {
    pub fn new(
        user: ActiveUser,
        tasks: Arc<dyn TaskSnapshotProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            user,
            tasks,
            notifier,
            phase: WorkerPhase::Created,
        }
    }

    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    /// Run the whole check-and-send sequence and report exactly once.
    ///
    /// Returns the final phase, which is always `Terminated`.
    pub async fn process(mut self, reporter: OutcomeReporter) -> WorkerPhase {
        self.advance(WorkerPhase::FetchingTasks);
        let result = self.remind().await;

        self.advance(WorkerPhase::Reporting);
        let outcome = match result {
            Ok(reminded) => Outcome::success(reminded),
            Err(error) => {
                tracing::warn!(
                    user_id = %self.user.id,
                    kind = ?error.kind(),
                    "reminder failed: {error}"
                );
                Outcome::from_error(&error)
            }
        };
        reporter.report(outcome).await;

        self.advance(WorkerPhase::Terminated);
        self.phase
    }

    async fn remind(&mut self) -> Result<usize, ReminderError> {
        let user_id = self.user.id;
        let titles = self
            .tasks
            .get_incomplete_tasks(user_id)
            .await
            .map_err(|source| ReminderError::Provider { user_id, source })?;

        if titles.is_empty() {
            self.advance(WorkerPhase::NoTasks);
            return Ok(0);
        }

        self.advance(WorkerPhase::Sending);
        self.notifier
            .send(&self.user.email, &titles)
            .await
            .map_err(|source| ReminderError::Delivery { user_id, source })?;
        Ok(titles.len())
    }

    fn advance(&mut self, next: WorkerPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal worker transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::debug!(user_id = %self.user.id, from = ?self.phase, to = ?next, "worker phase");
        self.phase = next;
    }
}
