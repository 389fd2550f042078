//! Domain identifiers (strongly-typed IDs).
//!
//! ULID ベースの ID を Phantom type でラップし、`BatchId` と `UserId` を
//! コンパイル時に区別します。
//!
//! - **時刻でソート可能**: BatchId は生成順に並ぶ（ログの突き合わせが楽）
//! - **分散生成可能**: ユーザーディレクトリ側で採番された ID をそのまま保持できる

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"batch-", "user-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData なので実行時のサイズは ULID と同じ 16 bytes。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Accepts both the bare ULID and the prefixed Display form.
impl<T: IdMarker> FromStr for Id<T> {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(T::prefix()).unwrap_or(s);
        Ulid::from_string(raw).map(Self::from_ulid)
    }
}

/// Batch のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Batch {}

impl IdMarker for Batch {
    fn prefix() -> &'static str {
        "batch-"
    }
}

/// User のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum User {}

impl IdMarker for User {
    fn prefix() -> &'static str {
        "user-"
    }
}

/// Identifier of one reminder batch run.
pub type BatchId = Id<Batch>;

/// Identifier of a user as known by the user directory.
pub type UserId = Id<User>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let ulid1 = Ulid::new();
        let ulid2 = Ulid::new();

        let batch = BatchId::from_ulid(ulid1);
        let user = UserId::from_ulid(ulid2);

        assert_eq!(batch.as_ulid(), ulid1);
        assert_eq!(user.as_ulid(), ulid2);

        assert!(batch.to_string().starts_with("batch-"));
        assert!(user.to_string().starts_with("user-"));

        // let _: BatchId = user; // <- does not compile
    }

    #[test]
    fn parse_accepts_prefixed_and_bare_forms() {
        let ulid = Ulid::new();
        let user = UserId::from_ulid(ulid);

        let prefixed: UserId = user.to_string().parse().unwrap();
        let bare: UserId = ulid.to_string().parse().unwrap();

        assert_eq!(prefixed, user);
        assert_eq!(bare, user);
        assert!("user-not-a-ulid".parse::<UserId>().is_err());
    }

    #[test]
    fn ids_can_be_serialized() {
        let batch_id = BatchId::from_ulid(Ulid::new());

        let serialized = serde_json::to_string(&batch_id).unwrap();
        let deserialized: BatchId = serde_json::from_str(&serialized).unwrap();

        assert_eq!(batch_id, deserialized);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<BatchId>(), size_of::<Ulid>());
        assert_eq!(size_of::<UserId>(), 16);
    }
}
