//! Recording collaborators: keep what they were given so it can be inspected.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{BatchEvent, DeliveryError};
use crate::ports::{EventSink, Notifier};

/// A `Notifier` that records every delivery and fails for configured addresses.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, Vec<String>)>>,
    failures: Mutex<HashMap<String, String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send to `email` fails with `reason`.
    pub fn fail_for(&self, email: impl Into<String>, reason: impl Into<String>) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(email.into(), reason.into());
    }

    pub fn sent(&self) -> Vec<(String, Vec<String>)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: &str, task_titles: &[String]) -> Result<(), DeliveryError> {
        let failure = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(email)
            .cloned();
        if let Some(reason) = failure {
            return Err(DeliveryError::new(reason));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((email.to_string(), task_titles.to_vec()));
        Ok(())
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<BatchEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BatchEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(BatchEvent::name).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &BatchEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}

/// Logs each event as JSON under the `reminder::events` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &BatchEvent) {
        match serde_json::to_string(event) {
            Ok(json) => tracing::trace!(target: "reminder::events", event = event.name(), %json),
            Err(e) => tracing::warn!(target: "reminder::events", "failed to encode event: {e}"),
        }
    }
}
