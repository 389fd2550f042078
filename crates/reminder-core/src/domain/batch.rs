//! BatchRun: the coordinator-owned state of one reminder batch.
//!
//! Design:
//! - The tracking map holds exactly one pending `UserTask` per dispatched user.
//! - Counters only move forward within a batch.
//! - Invariant: `succeeded + failed == completed <= total`, and the batch
//!   becomes `Completed` exactly once, when `completed == total`.
//!
//! The last `RECENT_SUMMARIES` summaries are kept so that a caller can still
//! look up a batch that finished before it asked.
//!
//! All methods are synchronous and never await; the coordinator calls them
//! while holding its lock.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::errors::ReminderError;
use super::ids::{BatchId, UserId};
use super::outcome::{FailureKind, Outcome};
use super::progress::{BatchProgress, BatchSummary, UserFailure};
use super::state::BatchState;
use super::user::{ActiveUser, UserTask};

/// Completed summaries retained for lookup by batch id.
pub const RECENT_SUMMARIES: usize = 16;

/// How the batch state reacted to one outcome report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeAck {
    /// Counted. `completed` is set when this report finished the batch.
    Recorded {
        elapsed: Duration,
        completed: Option<BatchSummary>,
    },
    /// The user has already been accounted for in this batch.
    Duplicate,
    /// The report belongs to a batch that is no longer running.
    Stale,
}

#[derive(Debug, Default)]
pub struct BatchRun {
    batch_id: Option<BatchId>,
    state: BatchState,
    total: usize,
    completed: usize,
    succeeded: usize,
    failed: usize,
    tracking: HashMap<UserId, UserTask>,
    failures: Vec<UserFailure>,
    started_at: Option<DateTime<Utc>>,
    recent: VecDeque<BatchSummary>,
}

impl BatchRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn last_summary(&self) -> Option<&BatchSummary> {
        self.recent.back()
    }

    /// Summary of a recently completed batch, if it is still retained.
    pub fn summary_for(&self, batch_id: BatchId) -> Option<&BatchSummary> {
        self.recent.iter().rev().find(|s| s.batch_id == batch_id)
    }

    /// True while `batch_id` is the batch currently running.
    pub fn is_running_batch(&self, batch_id: BatchId) -> bool {
        self.state.is_running() && self.batch_id == Some(batch_id)
    }

    pub fn failures(&self) -> &[UserFailure] {
        &self.failures
    }

    pub fn active_workers(&self) -> usize {
        self.tracking.len()
    }

    /// Idle/Completed -> Running. Rejected while a batch is running; the
    /// in-flight counters are left untouched in that case.
    pub fn begin(&mut self, batch_id: BatchId, now: DateTime<Utc>) -> Result<(), ReminderError> {
        if self.state.is_running() {
            let current = self.batch_id.unwrap_or(batch_id);
            return Err(ReminderError::BatchInProgress(current));
        }

        self.batch_id = Some(batch_id);
        self.state = BatchState::Running;
        self.total = 0;
        self.completed = 0;
        self.succeeded = 0;
        self.failed = 0;
        self.tracking.clear();
        self.failures.clear();
        self.started_at = Some(now);
        Ok(())
    }

    /// Register one `UserTask` per distinct user and fix the total.
    ///
    /// Returns the users that must get a worker (first occurrence wins for
    /// duplicated ids) and, when there was nobody to dispatch, the summary of
    /// the batch that completed on the spot.
    pub fn dispatch(
        &mut self,
        users: Vec<ActiveUser>,
        now: DateTime<Utc>,
    ) -> (Vec<ActiveUser>, Option<BatchSummary>) {
        let mut seen = HashSet::with_capacity(users.len());
        let mut dispatched = Vec::with_capacity(users.len());
        for user in users {
            if !seen.insert(user.id) {
                tracing::warn!(user_id = %user.id, "duplicate user in directory listing; skipped");
                continue;
            }
            self.tracking
                .insert(user.id, UserTask::new(user.clone()));
            dispatched.push(user);
        }

        self.total = dispatched.len();
        if self.total == 0 {
            let summary = self.complete(now);
            return (dispatched, Some(summary));
        }
        (dispatched, None)
    }

    /// Record one user's outcome. Duplicate and stale reports change nothing.
    pub fn record(
        &mut self,
        batch_id: BatchId,
        user_id: UserId,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> OutcomeAck {
        if !self.is_running_batch(batch_id) {
            return OutcomeAck::Stale;
        }
        let Some(task) = self.tracking.remove(&user_id) else {
            return OutcomeAck::Duplicate;
        };

        let elapsed = task.started_at.elapsed();
        self.completed += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            self.failures.push(UserFailure {
                user_id,
                email: task.user.email.clone(),
                kind: outcome.failure.unwrap_or(FailureKind::Crashed),
                message: outcome.reason.unwrap_or_default(),
            });
        }

        let completed = (self.completed == self.total).then(|| self.complete(now));
        OutcomeAck::Recorded { elapsed, completed }
    }

    /// The directory could not list users: close the batch with nothing counted.
    pub fn abort_enumeration(&mut self, now: DateTime<Utc>) -> BatchSummary {
        self.total = 0;
        self.tracking.clear();
        self.complete(now)
    }

    /// Users still waiting for an outcome.
    pub fn pending_users(&self) -> impl Iterator<Item = &UserTask> {
        self.tracking.values()
    }

    pub fn progress(&self) -> BatchProgress {
        BatchProgress {
            batch_id: self.batch_id,
            state: self.state,
            total: self.total,
            completed: self.completed,
            succeeded: self.succeeded,
            failed: self.failed,
            active_workers: self.tracking.len(),
        }
    }

    fn complete(&mut self, now: DateTime<Utc>) -> BatchSummary {
        debug_assert!(self.state.is_running());
        debug_assert!(self.tracking.is_empty());

        self.state = BatchState::Completed;
        let summary = BatchSummary {
            batch_id: self
                .batch_id
                .unwrap_or_else(|| BatchId::from_ulid(ulid::Ulid::nil())),
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            started_at: self.started_at.unwrap_or(now),
            finished_at: now,
        };
        if self.recent.len() == RECENT_SUMMARIES {
            self.recent.pop_front();
        }
        self.recent.push_back(summary.clone());
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ulid::Ulid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn user(n: u64) -> ActiveUser {
        ActiveUser::new(
            UserId::from_ulid(Ulid::from_parts(1, n as u128)),
            format!("user{n}@example.com"),
        )
    }

    fn started(users: Vec<ActiveUser>) -> (BatchRun, BatchId) {
        let mut run = BatchRun::new();
        let batch_id = BatchId::from_ulid(Ulid::new());
        run.begin(batch_id, now()).unwrap();
        let (dispatched, completed) = run.dispatch(users, now());
        assert!(completed.is_none() || dispatched.is_empty());
        (run, batch_id)
    }

    #[test]
    fn empty_dispatch_completes_immediately() {
        let mut run = BatchRun::new();
        let batch_id = BatchId::from_ulid(Ulid::new());
        run.begin(batch_id, now()).unwrap();

        let (dispatched, summary) = run.dispatch(vec![], now());

        assert!(dispatched.is_empty());
        let summary = summary.unwrap();
        assert_eq!((summary.total, summary.succeeded, summary.failed), (0, 0, 0));
        assert_eq!(run.state(), BatchState::Completed);
    }

    #[test]
    fn begin_while_running_is_rejected_without_reset() {
        let (mut run, batch_id) = started(vec![user(1), user(2)]);
        run.record(batch_id, user(1).id, Outcome::success(1), now());

        let err = run
            .begin(BatchId::from_ulid(Ulid::new()), now())
            .unwrap_err();

        assert_eq!(err, ReminderError::BatchInProgress(batch_id));
        let progress = run.progress();
        assert_eq!(progress.total, 2);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.batch_id, Some(batch_id));
    }

    #[test]
    fn duplicate_users_are_dispatched_once() {
        let (run, _) = started(vec![user(1), user(1), user(2)]);
        let progress = run.progress();
        assert_eq!(progress.total, 2);
        assert_eq!(progress.active_workers, 2);
    }

    #[test]
    fn second_report_for_same_user_is_ignored() {
        let (mut run, batch_id) = started(vec![user(1), user(2)]);

        let first = run.record(batch_id, user(1).id, Outcome::success(0), now());
        let second = run.record(
            batch_id,
            user(1).id,
            Outcome::failure(FailureKind::Delivery, "late"),
            now(),
        );

        assert!(matches!(first, OutcomeAck::Recorded { completed: None, .. }));
        assert_eq!(second, OutcomeAck::Duplicate);
        let progress = run.progress();
        assert_eq!((progress.completed, progress.succeeded, progress.failed), (1, 1, 0));
        assert!(run.failures().is_empty());
    }

    #[test]
    fn report_for_other_batch_is_stale() {
        let (mut run, _) = started(vec![user(1)]);
        let other = BatchId::from_ulid(Ulid::new());

        let ack = run.record(other, user(1).id, Outcome::success(0), now());

        assert_eq!(ack, OutcomeAck::Stale);
        assert_eq!(run.progress().completed, 0);
    }

    #[test]
    fn last_report_completes_batch_exactly_once() {
        let (mut run, batch_id) = started(vec![user(1), user(2)]);

        run.record(batch_id, user(1).id, Outcome::success(2), now());
        let ack = run.record(
            batch_id,
            user(2).id,
            Outcome::failure(FailureKind::Provider, "db down"),
            now(),
        );

        let OutcomeAck::Recorded {
            completed: Some(summary),
            ..
        } = ack
        else {
            panic!("expected completion, got {ack:?}");
        };
        assert_eq!((summary.total, summary.succeeded, summary.failed), (2, 1, 1));
        assert_eq!(run.state(), BatchState::Completed);
        assert_eq!(run.last_summary(), Some(&summary));
        assert_eq!(run.failures()[0].message, "db down");

        // Completed batches accept no further reports.
        let late = run.record(batch_id, user(2).id, Outcome::success(0), now());
        assert_eq!(late, OutcomeAck::Stale);
    }

    #[test]
    fn counters_stay_consistent_after_every_report() {
        let users: Vec<_> = (1..=5).map(user).collect();
        let (mut run, batch_id) = started(users.clone());

        for (i, u) in users.iter().enumerate() {
            let outcome = if i % 2 == 0 {
                Outcome::success(1)
            } else {
                Outcome::failure(FailureKind::Timeout, "timed out")
            };
            run.record(batch_id, u.id, outcome, now());
            assert!(run.progress().is_consistent());
        }
        assert_eq!(run.progress().completed, 5);
    }

    #[test]
    fn abort_enumeration_completes_with_zero_counts() {
        let mut run = BatchRun::new();
        run.begin(BatchId::from_ulid(Ulid::new()), now()).unwrap();

        let summary = run.abort_enumeration(now());

        assert_eq!((summary.total, summary.succeeded, summary.failed), (0, 0, 0));
        assert_eq!(run.state(), BatchState::Completed);
    }

    #[test]
    fn new_batch_after_completion_resets_counters() {
        let (mut run, batch_id) = started(vec![user(1)]);
        run.record(batch_id, user(1).id, Outcome::failure(FailureKind::Delivery, "x"), now());
        assert_eq!(run.state(), BatchState::Completed);

        let next = BatchId::from_ulid(Ulid::new());
        run.begin(next, now()).unwrap();

        let progress = run.progress();
        assert_eq!(progress.state, BatchState::Running);
        assert_eq!((progress.total, progress.completed, progress.failed), (0, 0, 0));
        assert!(run.failures().is_empty());
        // The previous summary stays queryable until the next one replaces it.
        assert_eq!(run.last_summary().map(|s| s.batch_id), Some(batch_id));
        assert!(run.summary_for(batch_id).is_some());
        assert!(run.is_running_batch(next));
        assert!(!run.is_running_batch(batch_id));
    }

    #[test]
    fn only_recent_summaries_are_retained() {
        let mut run = BatchRun::new();
        let ids: Vec<BatchId> = (0..=RECENT_SUMMARIES as u128)
            .map(|n| BatchId::from_ulid(Ulid::from_parts(2, n)))
            .collect();
        for id in &ids {
            run.begin(*id, now()).unwrap();
            run.dispatch(vec![], now());
        }

        assert!(run.summary_for(ids[0]).is_none());
        assert!(run.summary_for(ids[1]).is_some());
        assert_eq!(run.last_summary().map(|s| s.batch_id), ids.last().copied());
    }

    #[test]
    fn recorded_users_leave_the_pending_set() {
        let (mut run, batch_id) = started(vec![user(1), user(2)]);

        run.record(batch_id, user(1).id, Outcome::success(0), now());

        let pending: Vec<UserId> = run.pending_users().map(|t| t.user.id).collect();
        assert_eq!(pending, vec![user(2).id]);
    }
}
