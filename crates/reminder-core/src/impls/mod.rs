//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryUserDirectory**: ソフトデリート付きのユーザー一覧
//! - **InMemoryTaskStore**: 未完了タスクの絞り込み
//! - **MailNotifier**: リマインダーメールの組み立て + MailTransport
//! - **RecordingNotifier / RecordingEventSink**: 渡されたものを記録する
//! - **TracingEventSink**: デフォルトの EventSink
//!
//! 本番用の実装（DB リポジトリ、SMTP）は別クレートに置く。

pub mod mail;
pub mod recording;
pub mod task_store;
pub mod user_directory;

pub use self::mail::{LogTransport, MailNotifier, MailTransport, ReminderEmail, TransportError};
pub use self::recording::{RecordingEventSink, RecordingNotifier, TracingEventSink};
pub use self::task_store::InMemoryTaskStore;
pub use self::user_directory::{InMemoryUserDirectory, UserRecord};
