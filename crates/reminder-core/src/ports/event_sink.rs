//! EventSink port - バッチイベントの記録
//!
//! `emit` は coordinator のロック外から同期的に呼ばれる。重い処理は実装側で
//! spawn すること。

use crate::domain::BatchEvent;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &BatchEvent);
}
