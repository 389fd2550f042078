//! CoordinatorBuilder - coordinator の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - UserDirectory / TaskSnapshotProvider / Notifier は必須
//! - build() 時に不足をまとめて `BuildError::MissingCollaborators` で返す
//! - Clock / IdGenerator / EventSink は省略時にデフォルト実装を使う

use std::sync::Arc;

use crate::app::config::ReminderConfig;
use crate::app::coordinator::{Collaborators, ReminderCoordinator};
use crate::impls::TracingEventSink;
use crate::ports::{
    Clock, EventSink, IdGenerator, Notifier, SystemClock, TaskSnapshotProvider, UlidGenerator,
    UserDirectory,
};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing collaborators: {0:?}. These must be supplied before build().")]
    MissingCollaborators(Vec<&'static str>),
}

/// # 使用例
/// ```ignore
/// let coordinator = CoordinatorBuilder::new()
///     .user_directory(directory)
///     .task_provider(store)
///     .notifier(mailer)
///     .config(ReminderConfig::default())
///     .build()?;
/// ```
#[derive(Default)]
pub struct CoordinatorBuilder {
    directory: Option<Arc<dyn UserDirectory>>,
    tasks: Option<Arc<dyn TaskSnapshotProvider>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    events: Option<Arc<dyn EventSink>>,
    config: ReminderConfig,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn task_provider(mut self, tasks: Arc<dyn TaskSnapshotProvider>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(mut self, config: ReminderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<ReminderCoordinator, BuildError> {
        let mut missing = Vec::new();
        if self.directory.is_none() {
            missing.push("user_directory");
        }
        if self.tasks.is_none() {
            missing.push("task_provider");
        }
        if self.notifier.is_none() {
            missing.push("notifier");
        }

        let (Some(directory), Some(tasks), Some(notifier)) =
            (self.directory, self.tasks, self.notifier)
        else {
            return Err(BuildError::MissingCollaborators(missing));
        };

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let ids = self.ids.unwrap_or_else(|| {
            Arc::new(UlidGenerator::new(Arc::clone(&clock))) as Arc<dyn IdGenerator>
        });
        let events = self
            .events
            .unwrap_or_else(|| Arc::new(TracingEventSink) as Arc<dyn EventSink>);

        Ok(ReminderCoordinator::new(
            Collaborators {
                directory,
                tasks,
                notifier,
                clock,
                ids,
                events,
            },
            self.config,
        ))
    }
}
