//! InMemoryTaskStore - タスクアイテムの開発用ストア
//!
//! `get_incomplete_tasks` は「未完了・未削除・期限が今以降」のタスク名を
//! 期限の早い順に返す。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{ProviderError, TaskItem, UserId};
use crate::ports::{Clock, TaskSnapshotProvider};

#[derive(Default)]
struct StoreState {
    items: Vec<TaskItem>,
    /// Users whose lookups fail, with the error message to return.
    broken: HashMap<UserId, String>,
}

pub struct InMemoryTaskStore {
    clock: Arc<dyn Clock>,
    horizon: Option<chrono::Duration>,
    state: RwLock<StoreState>,
}

impl InMemoryTaskStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            horizon: None,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Only tasks due within `horizon` of now are reminded about.
    pub fn with_horizon(mut self, horizon: Option<chrono::Duration>) -> Self {
        self.horizon = horizon;
        self
    }

    pub async fn insert(&self, item: TaskItem) {
        self.state.write().await.items.push(item);
    }

    pub async fn extend(&self, items: impl IntoIterator<Item = TaskItem>) {
        self.state.write().await.items.extend(items);
    }

    pub async fn complete(&self, task_id: u64) -> bool {
        let mut state = self.state.write().await;
        match state.items.iter_mut().find(|t| t.id == task_id) {
            Some(item) => {
                item.completed = true;
                true
            }
            None => false,
        }
    }

    pub async fn break_user(&self, user_id: UserId, message: impl Into<String>) {
        self.state.write().await.broken.insert(user_id, message.into());
    }
}

#[async_trait]
impl TaskSnapshotProvider for InMemoryTaskStore {
    async fn get_incomplete_tasks(&self, user_id: UserId) -> Result<Vec<String>, ProviderError> {
        let now = self.clock.now();
        let state = self.state.read().await;
        if let Some(message) = state.broken.get(&user_id) {
            return Err(ProviderError::new(message.clone()));
        }

        let mut due: Vec<&TaskItem> = state
            .items
            .iter()
            .filter(|t| t.user_id == user_id && t.is_incomplete_at(now))
            .filter(|t| match (self.horizon, t.due_at) {
                (Some(horizon), Some(due_at)) => now
                    .checked_add_signed(horizon)
                    .is_none_or(|limit| due_at <= limit),
                _ => true,
            })
            .collect();
        due.sort_by_key(|t| (t.due_at, t.id));

        Ok(due.into_iter().map(|t| t.title.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use ulid::Ulid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn user(n: u128) -> UserId {
        UserId::from_ulid(Ulid::from_parts(1, n))
    }

    async fn store() -> InMemoryTaskStore {
        let store = InMemoryTaskStore::new(Arc::new(FixedClock::new(now())));
        store
            .extend(vec![
                TaskItem::new(1, user(1), "later").due(now() + Duration::days(2)),
                TaskItem::new(2, user(1), "sooner").due(now() + Duration::hours(1)),
                TaskItem::new(3, user(1), "overdue").due(now() - Duration::hours(1)),
                TaskItem::new(4, user(1), "done")
                    .due(now() + Duration::hours(1))
                    .mark_completed(),
                TaskItem::new(5, user(2), "someone else").due(now() + Duration::hours(1)),
            ])
            .await;
        store
    }

    #[tokio::test]
    async fn returns_incomplete_titles_ordered_by_due_date() {
        let store = store().await;
        let titles = store.get_incomplete_tasks(user(1)).await.unwrap();
        assert_eq!(titles, vec!["sooner".to_string(), "later".to_string()]);
    }

    #[tokio::test]
    async fn horizon_limits_how_far_ahead_we_look() {
        let store = store().await.with_horizon(Some(Duration::hours(24)));
        let titles = store.get_incomplete_tasks(user(1)).await.unwrap();
        assert_eq!(titles, vec!["sooner".to_string()]);
    }

    #[tokio::test]
    async fn horizon_past_the_calendar_limit_means_no_bound() {
        let beyond_calendar = Duration::try_days(100_000_000).unwrap();
        let store = store().await.with_horizon(Some(beyond_calendar));
        let titles = store.get_incomplete_tasks(user(1)).await.unwrap();
        assert_eq!(titles, vec!["sooner".to_string(), "later".to_string()]);
    }

    #[tokio::test]
    async fn completing_a_task_removes_it() {
        let store = store().await;
        assert!(store.complete(2).await);
        let titles = store.get_incomplete_tasks(user(1)).await.unwrap();
        assert_eq!(titles, vec!["later".to_string()]);
    }

    #[tokio::test]
    async fn broken_user_fails_lookup() {
        let store = store().await;
        store.break_user(user(2), "deadlock detected").await;

        let err = store.get_incomplete_tasks(user(2)).await.unwrap_err();
        assert_eq!(err, ProviderError::new("deadlock detected"));
        assert!(store.get_incomplete_tasks(user(1)).await.is_ok());
    }
}
