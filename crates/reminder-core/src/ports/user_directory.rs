//! UserDirectory port - アクティブユーザーの列挙

use async_trait::async_trait;

use crate::domain::{ActiveUser, DirectoryError};

/// Source of the users a batch should visit.
///
/// Called once per batch, before any worker is dispatched.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Users not marked deleted.
    async fn get_active_users(&self) -> Result<Vec<ActiveUser>, DirectoryError>;
}
