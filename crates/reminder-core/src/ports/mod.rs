//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。ユーザーディレクトリ、タスクの読み出し、
//! 通知送信はすべて外部コラボレーターで、ここでは trait だけを定義する。
//!
//! # 設計原則
//! - すべての port は `Send + Sync`（多数のワーカーから同時に呼ばれる）
//! - coordinator が持つ共有状態は port の外側にしか存在しない

pub mod clock;
pub mod event_sink;
pub mod id_generator;
pub mod notifier;
pub mod task_snapshot;
pub mod user_directory;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::EventSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notifier::Notifier;
pub use self::task_snapshot::TaskSnapshotProvider;
pub use self::user_directory::UserDirectory;
