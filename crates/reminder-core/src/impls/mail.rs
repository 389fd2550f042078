//! MailNotifier - リマインダーメールの組み立てと送信
//!
//! Notifier port の実装。本文の組み立てはここで行い、実際の送信は
//! `MailTransport` に任せる（SMTP 実装は別クレート想定、開発用は LogTransport）。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DeliveryError;
use crate::ports::Notifier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl ReminderEmail {
    /// Returns `None` when there is nothing to remind about.
    pub fn compose(to: &str, task_titles: &[String]) -> Option<Self> {
        if task_titles.is_empty() {
            return None;
        }
        let count = task_titles.len();
        let subject = if count == 1 {
            "You have 1 upcoming task".to_string()
        } else {
            format!("You have {count} upcoming tasks")
        };

        let mut body = String::from("The following tasks are still open:\n\n");
        for title in task_titles {
            body.push_str("- ");
            body.push_str(title);
            body.push('\n');
        }

        Some(Self {
            to: to.to_string(),
            subject,
            body,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("recipient rejected: {0}")]
    Rejected(String),

    #[error("{0}")]
    Unavailable(String),
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, email: &ReminderEmail) -> Result<(), TransportError>;
}

/// Writes mails to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn deliver(&self, email: &ReminderEmail) -> Result<(), TransportError> {
        tracing::info!(to = %email.to, subject = %email.subject, "reminder mail (log transport)");
        Ok(())
    }
}

pub struct MailNotifier<T> {
    transport: T,
}

impl<T: MailTransport> MailNotifier<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: MailTransport> Notifier for MailNotifier<T> {
    async fn send(&self, email: &str, task_titles: &[String]) -> Result<(), DeliveryError> {
        let mail = ReminderEmail::compose(email, task_titles)
            .ok_or_else(|| DeliveryError::new("no tasks to remind about"))?;
        self.transport
            .deliver(&mail)
            .await
            .map_err(|e| DeliveryError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingTransport {
        sent: Mutex<Vec<ReminderEmail>>,
        fail_with: Option<TransportError>,
    }

    #[async_trait]
    impl MailTransport for CapturingTransport {
        async fn deliver(&self, email: &ReminderEmail) -> Result<(), TransportError> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    #[test]
    fn compose_lists_every_title() {
        let mail = ReminderEmail::compose(
            "a@example.com",
            &["pay rent".to_string(), "call bank".to_string()],
        )
        .unwrap();
        assert_eq!(mail.subject, "You have 2 upcoming tasks");
        assert!(mail.body.contains("- pay rent\n"));
        assert!(mail.body.contains("- call bank\n"));
    }

    #[test]
    fn compose_uses_singular_subject() {
        let mail = ReminderEmail::compose("a@example.com", &["one".to_string()]).unwrap();
        assert_eq!(mail.subject, "You have 1 upcoming task");
        assert!(ReminderEmail::compose("a@example.com", &[]).is_none());
    }

    #[tokio::test]
    async fn notifier_hands_composed_mail_to_transport() {
        let notifier = MailNotifier::new(CapturingTransport::default());
        notifier
            .send("a@example.com", &["t".to_string()])
            .await
            .unwrap();

        let sent = notifier.transport().sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@example.com");
    }

    #[tokio::test]
    async fn transport_failure_becomes_delivery_error() {
        let notifier = MailNotifier::new(CapturingTransport {
            fail_with: Some(TransportError::Unavailable("SMTP timeout".into())),
            ..Default::default()
        });
        let err = notifier
            .send("a@example.com", &["t".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, DeliveryError::new("SMTP timeout"));
    }

    #[tokio::test]
    async fn empty_title_list_is_rejected() {
        let notifier = MailNotifier::new(CapturingTransport::default());
        assert!(notifier.send("a@example.com", &[]).await.is_err());
    }

    #[tokio::test]
    async fn log_transport_accepts_every_mail() {
        let notifier = MailNotifier::new(LogTransport);
        assert!(notifier.send("a@example.com", &["t".to_string()]).await.is_ok());
    }
}
