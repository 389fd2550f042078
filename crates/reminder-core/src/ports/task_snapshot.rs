//! TaskSnapshotProvider port - ユーザーごとの未完了タスク取得

use async_trait::async_trait;

use crate::domain::{ProviderError, UserId};

/// Read-only view over a user's tasks.
///
/// Implementations must be safe to call from many workers at once.
#[async_trait]
pub trait TaskSnapshotProvider: Send + Sync {
    /// Titles of tasks that are not completed, not deleted and due at or
    /// after now.
    async fn get_incomplete_tasks(&self, user_id: UserId) -> Result<Vec<String>, ProviderError>;
}
