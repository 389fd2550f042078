//! Notifier port - リマインダーの送信

use async_trait::async_trait;

use crate::domain::DeliveryError;

/// Delivers one reminder listing `task_titles` to `email`.
///
/// Both an explicit rejection and a transport failure are reported as
/// `Err(DeliveryError)`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &str, task_titles: &[String]) -> Result<(), DeliveryError>;
}
