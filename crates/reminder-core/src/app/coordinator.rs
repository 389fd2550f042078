//! ReminderCoordinator - リマインダーバッチの司令塔
//!
//! # フロー
//! 1. `run_batch()`: Running 中なら `BatchInProgress` で拒否
//! 2. UserDirectory でアクティブユーザーを列挙（失敗したら total=0 で即 Completed）
//! 3. ユーザーごとに UserTask を登録し、ワーカーを 1 つずつ spawn（待たない）
//! 4. ワーカーは OutcomeReporter 経由で `on_worker_outcome` を一度だけ呼ぶ
//! 5. completed == total になった報告で Completed に遷移し、完了イベントを出す
//!
//! # 並行性
//! - バッチ状態（カウンタと追跡マップ）は `Mutex<BatchRun>` だけが持つ
//! - ロック内では await しない（ディレクトリ問い合わせ・送信はロック外）
//! - 各ワーカーは supervisor タスク配下で動き、タイムアウトまたは panic した場合は
//!   supervisor が代わりに失敗を記録する

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore, watch};

use crate::app::config::ReminderConfig;
use crate::app::reporter::{OutcomeReceiver, OutcomeReporter};
use crate::app::worker::UserReminderWorker;
use crate::domain::{
    ActiveUser, BatchEvent, BatchId, BatchProgress, BatchRun, BatchState, BatchSummary, Outcome,
    OutcomeAck, ReminderError, UserFailure, UserId,
};
use crate::ports::{Clock, EventSink, IdGenerator, Notifier, TaskSnapshotProvider, UserDirectory};

/// Returned by an accepted `run_batch` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStarted {
    pub batch_id: BatchId,
    pub total: usize,
}

/// Cheap to clone; all clones drive the same batch state.
#[derive(Clone)]
pub struct ReminderCoordinator {
    inner: Arc<Inner>,
}

pub(crate) struct Collaborators {
    pub(crate) directory: Arc<dyn UserDirectory>,
    pub(crate) tasks: Arc<dyn TaskSnapshotProvider>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) events: Arc<dyn EventSink>,
}

struct Inner {
    collaborators: Collaborators,
    config: ReminderConfig,
    run: Mutex<BatchRun>,
    completion_tx: watch::Sender<Option<BatchSummary>>,
    limiter: Option<Arc<Semaphore>>,
}

impl ReminderCoordinator {
    pub(crate) fn new(collaborators: Collaborators, config: ReminderConfig) -> Self {
        let config = config.normalized();
        let (completion_tx, _) = watch::channel(None);
        let limiter = config
            .max_in_flight
            .map(|permits| Arc::new(Semaphore::new(permits)));

        Self {
            inner: Arc::new(Inner {
                collaborators,
                config,
                run: Mutex::new(BatchRun::new()),
                completion_tx,
                limiter,
            }),
        }
    }

    pub fn config(&self) -> &ReminderConfig {
        &self.inner.config
    }

    /// Start one batch over all active users.
    ///
    /// Returns as soon as every worker has been dispatched; use
    /// [`wait_for_completion`](Self::wait_for_completion) to await the result.
    ///
    /// # Errors
    /// - `BatchInProgress` when a batch is already running (its counters are untouched).
    /// - `DirectoryUnavailable` when users cannot be listed; the batch is then
    ///   already `Completed` with all counters at zero.
    pub async fn run_batch(&self) -> Result<BatchStarted, ReminderError> {
        self.inner.run_batch().await
    }

    /// Record one worker's outcome. Duplicate or stale reports are ignored.
    pub async fn on_worker_outcome(
        &self,
        batch_id: BatchId,
        user_id: UserId,
        outcome: Outcome,
    ) -> OutcomeAck {
        self.inner.record_outcome(batch_id, user_id, outcome).await
    }

    /// Consistent point-in-time snapshot of the current (or last) batch.
    pub async fn progress(&self) -> BatchProgress {
        self.inner.run.lock().await.progress()
    }

    /// Workers dispatched but not yet accounted for.
    pub async fn active_worker_count(&self) -> usize {
        self.inner.run.lock().await.active_workers()
    }

    pub async fn state(&self) -> BatchState {
        self.inner.run.lock().await.state()
    }

    pub async fn last_summary(&self) -> Option<BatchSummary> {
        self.inner.run.lock().await.last_summary().cloned()
    }

    /// Per-user failures of the current (or last) batch, for diagnostics.
    pub async fn failures(&self) -> Vec<UserFailure> {
        self.inner.run.lock().await.failures().to_vec()
    }

    /// Users whose worker has not reported yet.
    pub async fn pending_users(&self) -> Vec<UserId> {
        let run = self.inner.run.lock().await;
        let mut users: Vec<UserId> = run.pending_users().map(|task| task.user.id).collect();
        users.sort();
        users
    }

    /// Wait until `batch_id` reaches `Completed` and return its summary.
    ///
    /// Returns `None` for a batch id that is neither running nor among the
    /// recently completed batches.
    pub async fn wait_for_completion(&self, batch_id: BatchId) -> Option<BatchSummary> {
        let mut rx = {
            let run = self.inner.run.lock().await;
            if let Some(summary) = run.summary_for(batch_id) {
                return Some(summary.clone());
            }
            if !run.is_running_batch(batch_id) {
                return None;
            }
            // Subscribed under the lock: the next completion sent is this batch's.
            self.inner.completion_tx.subscribe()
        };
        rx.changed().await.ok()?;
        self.inner.run.lock().await.summary_for(batch_id).cloned()
    }
}

impl Inner {
    async fn run_batch(self: &Arc<Self>) -> Result<BatchStarted, ReminderError> {
        let batch_id = self.collaborators.ids.generate_batch_id();

        let begun = {
            let mut run = self.run.lock().await;
            run.begin(batch_id, self.collaborators.clock.now())
        };
        if let Err(error) = begun {
            if let ReminderError::BatchInProgress(running) = &error {
                tracing::warn!(running_batch = %running, "reminder batch rejected: {error}");
                self.collaborators
                    .events
                    .emit(&BatchEvent::BatchRejected { running: *running });
            }
            return Err(error);
        }
        tracing::info!(%batch_id, "reminder batch started");

        let users = match self.collaborators.directory.get_active_users().await {
            Ok(users) => users,
            Err(source) => {
                tracing::error!(%batch_id, "failed to enumerate active users: {source}");
                let summary = {
                    let mut run = self.run.lock().await;
                    let summary = run.abort_enumeration(self.collaborators.clock.now());
                    self.completion_tx.send_replace(Some(summary.clone()));
                    summary
                };
                self.announce_completion(&summary);
                return Err(ReminderError::DirectoryUnavailable(source));
            }
        };

        let (dispatched, completed) = {
            let mut run = self.run.lock().await;
            let (dispatched, completed) = run.dispatch(users, self.collaborators.clock.now());
            if let Some(summary) = &completed {
                self.completion_tx.send_replace(Some(summary.clone()));
            }
            (dispatched, completed)
        };

        let total = dispatched.len();
        self.collaborators
            .events
            .emit(&BatchEvent::BatchStarted { batch_id, total });

        if let Some(summary) = completed {
            tracing::info!(%batch_id, "no active users; nothing to remind");
            self.announce_completion(&summary);
            return Ok(BatchStarted { batch_id, total });
        }

        tracing::info!(%batch_id, total, "dispatching reminder workers");
        for user in dispatched {
            self.spawn_worker(batch_id, user);
        }
        Ok(BatchStarted { batch_id, total })
    }

    fn spawn_worker(self: &Arc<Self>, batch_id: BatchId, user: ActiveUser) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.supervise(batch_id, user).await;
        });
    }

    /// Runs one worker under the per-worker timeout and accounts for it if it
    /// never reports (timeout or panic).
    async fn supervise(self: Arc<Self>, batch_id: BatchId, user: ActiveUser) {
        let _permit = self.acquire_permit().await;

        let user_id = user.id;
        let receiver: Arc<dyn OutcomeReceiver> = self.clone();
        let reporter = OutcomeReporter::new(batch_id, user_id, receiver);
        let worker = UserReminderWorker::new(
            user,
            Arc::clone(&self.collaborators.tasks),
            Arc::clone(&self.collaborators.notifier),
        );

        let timeout = self.config.worker_timeout();
        let mut handle = tokio::spawn(worker.process(reporter));

        let error = match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(_)) => return,
            Ok(Err(join_error)) => {
                tracing::error!(%batch_id, %user_id, "reminder worker crashed: {join_error}");
                ReminderError::WorkerCrashed {
                    user_id,
                    message: join_error.to_string(),
                }
            }
            Err(_) => {
                handle.abort();
                tracing::warn!(
                    %batch_id,
                    %user_id,
                    timeout_secs = timeout.as_secs(),
                    "reminder worker timed out"
                );
                ReminderError::Timeout { user_id, timeout }
            }
        };

        self.record_outcome(batch_id, user_id, Outcome::from_error(&error))
            .await;
    }

    async fn acquire_permit(&self) -> Option<OwnedSemaphorePermit> {
        let limiter = self.limiter.as_ref()?;
        Arc::clone(limiter).acquire_owned().await.ok()
    }

    async fn record_outcome(
        &self,
        batch_id: BatchId,
        user_id: UserId,
        outcome: Outcome,
    ) -> OutcomeAck {
        let ack = {
            let mut run = self.run.lock().await;
            let now = self.collaborators.clock.now();
            let ack = run.record(batch_id, user_id, outcome.clone(), now);
            if let OutcomeAck::Recorded {
                completed: Some(summary),
                ..
            } = &ack
            {
                self.completion_tx.send_replace(Some(summary.clone()));
            }
            ack
        };

        match &ack {
            OutcomeAck::Recorded { elapsed, completed } => {
                let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
                if outcome.is_success() {
                    tracing::debug!(
                        %batch_id,
                        %user_id,
                        reminded_tasks = outcome.reminded_tasks,
                        elapsed_ms,
                        "user reminder succeeded"
                    );
                } else {
                    tracing::warn!(
                        %batch_id,
                        %user_id,
                        kind = ?outcome.failure,
                        reason = outcome.reason.as_deref().unwrap_or(""),
                        elapsed_ms,
                        "user reminder failed"
                    );
                }
                self.collaborators.events.emit(&BatchEvent::UserCompleted {
                    batch_id,
                    user_id,
                    outcome,
                    elapsed_ms,
                });
                if let Some(summary) = completed {
                    self.announce_completion(summary);
                }
            }
            OutcomeAck::Duplicate => {
                tracing::debug!(%batch_id, %user_id, "duplicate outcome ignored");
            }
            OutcomeAck::Stale => {
                tracing::debug!(%batch_id, %user_id, "outcome for inactive batch ignored");
            }
        }
        ack
    }

    fn announce_completion(&self, summary: &BatchSummary) {
        tracing::info!(
            batch_id = %summary.batch_id,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            duration_ms = summary.duration_ms(),
            "reminder batch completed"
        );
        self.collaborators
            .events
            .emit(&BatchEvent::BatchCompleted(summary.clone()));
    }
}

#[async_trait]
impl OutcomeReceiver for Inner {
    async fn on_worker_outcome(
        &self,
        batch_id: BatchId,
        user_id: UserId,
        outcome: Outcome,
    ) -> OutcomeAck {
        self.record_outcome(batch_id, user_id, outcome).await
    }
}
