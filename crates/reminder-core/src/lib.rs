//! reminder-core
//!
//! Parallel reminder dispatch for the task-management backend.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, user, task_item, outcome, state, batch, progress, events, errors）
//! - **ports**: 外部コラボレーターの抽象（UserDirectory, TaskSnapshotProvider, Notifier, Clock, ...）
//! - **app**: ReminderCoordinator, UserReminderWorker, CoordinatorBuilder, ReminderConfig
//! - **impls**: 開発用・テスト用の ports 実装（in-memory ストア、MailNotifier など）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{
    BatchStarted, BuildError, ConfigError, CoordinatorBuilder, ReminderConfig,
    ReminderCoordinator,
};
pub use domain::{BatchProgress, BatchState, BatchSummary, ReminderError};
