//! InMemoryUserDirectory - 開発・テスト用のユーザーディレクトリ

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::{ActiveUser, DirectoryError, UserId};
use crate::ports::UserDirectory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub deleted: bool,
}

impl UserRecord {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            deleted: false,
        }
    }
}

#[derive(Default)]
struct DirectoryState {
    users: Vec<UserRecord>,
    /// When set, every listing fails with this message.
    outage: Option<String>,
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            state: RwLock::new(DirectoryState {
                users,
                outage: None,
            }),
        }
    }

    pub async fn add_user(&self, user: UserRecord) {
        self.state.write().await.users.push(user);
    }

    /// Soft-delete; returns false when the user is unknown.
    pub async fn delete_user(&self, user_id: UserId) -> bool {
        let mut state = self.state.write().await;
        match state.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.deleted = true;
                true
            }
            None => false,
        }
    }

    pub async fn set_outage(&self, message: Option<String>) {
        self.state.write().await.outage = message;
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_active_users(&self) -> Result<Vec<ActiveUser>, DirectoryError> {
        let state = self.state.read().await;
        if let Some(message) = &state.outage {
            return Err(DirectoryError::new(message.clone()));
        }
        Ok(state
            .users
            .iter()
            .filter(|u| !u.deleted)
            .map(|u| ActiveUser::new(u.id, u.email.clone()))
            .collect())
    }
}
