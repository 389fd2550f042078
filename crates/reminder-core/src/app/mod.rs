//! App - アプリケーション層
//!
//! ports を組み合わせてリマインダーバッチを実装する。
//!
//! # 主要コンポーネント
//! - **ReminderCoordinator**: バッチ状態の唯一の持ち主。ワーカーの fan-out と集計
//! - **UserReminderWorker**: 1 ユーザー分の取得→判定→送信→報告
//! - **OutcomeReporter**: ワーカーから coordinator への一回限りの報告ハンドル
//! - **CoordinatorBuilder**: 起動時検証付きのワイヤリング
//! - **ReminderConfig**: タイムアウトと同時実行数の設定

pub mod builder;
pub mod config;
pub mod coordinator;
pub mod reporter;
pub mod worker;

pub use self::builder::{BuildError, CoordinatorBuilder};
pub use self::config::{ConfigError, ReminderConfig};
pub use self::coordinator::{BatchStarted, ReminderCoordinator};
pub use self::reporter::{OutcomeReceiver, OutcomeReporter};
pub use self::worker::UserReminderWorker;
