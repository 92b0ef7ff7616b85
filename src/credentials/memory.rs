use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoreError, User, UserId, check_credentials, hash_blocking};

/// Process-local credential store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the account flag checked by `verify`. Returns `false` for unknown users.
    pub async fn set_active(&self, username: &str, is_active: bool) -> bool {
        let mut users = self.users.write().await;
        users.get_mut(username).is_some_and(|user| {
            user.is_active = is_active;
            true
        })
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, username: &str, password: &str) -> Result<UserId, StoreError> {
        // Hash outside the lock; the uniqueness check and insert happen under it.
        let password_hash = hash_blocking(password).await?;

        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(StoreError::DuplicateUsername);
        }

        let id = Uuid::new_v4();
        users.insert(
            username.to_string(),
            User {
                id,
                username: username.to_string(),
                password_hash,
                is_active: true,
            },
        );
        Ok(id)
    }

    async fn verify(&self, username: &str, password: &str) -> Result<Option<UserId>, StoreError> {
        let user = self.find(username).await?;
        check_credentials(user, password).await
    }

    async fn find(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn is_active(&self, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .any(|user| user.id == user_id && user.is_active))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
