//! Credential storage: usernames, password hashes and account flags.
//!
//! Handlers depend on [`CredentialStore`] only. Uniqueness of `username` is
//! enforced by the implementation (a `RwLock` for [`MemoryCredentialStore`],
//! the `users_username_key` constraint for [`PgCredentialStore`]), so two
//! concurrent registrations of one name yield exactly one success.

pub mod memory;
pub mod models;
pub mod password;
pub mod postgres;

pub use memory::MemoryCredentialStore;
pub use models::{User, UserId};
pub use postgres::PgCredentialStore;

use anyhow::Context;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username already exists")]
    DuplicateUsername,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create an active user with a hashed password.
    ///
    /// # Errors
    /// [`StoreError::DuplicateUsername`] when the name is taken.
    async fn create(&self, username: &str, password: &str) -> Result<UserId, StoreError>;

    /// Resolve credentials to a user id. Unknown users, wrong passwords and
    /// inactive accounts all yield `Ok(None)`.
    async fn verify(&self, username: &str, password: &str) -> Result<Option<UserId>, StoreError>;

    async fn find(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Whether the account may hold a session. Unknown ids are inactive.
    async fn is_active(&self, user_id: UserId) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Hash on the blocking pool.
pub(crate) async fn hash_blocking(password: &str) -> Result<String, StoreError> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .context("password hashing task failed")??;
    Ok(hash)
}

/// Shared tail of `verify`: check the password (or burn a dummy check) off the runtime.
pub(crate) async fn check_credentials(
    user: Option<User>,
    password: &str,
) -> Result<Option<UserId>, StoreError> {
    let password = password.to_string();
    let user_id = tokio::task::spawn_blocking(move || match user {
        Some(user) => {
            let matches = password::verify_password(&password, &user.password_hash);
            (matches && user.is_active).then_some(user.id)
        }
        None => {
            password::verify_dummy(&password);
            None
        }
    })
    .await
    .context("password verification task failed")?;
    Ok(user_id)
}
