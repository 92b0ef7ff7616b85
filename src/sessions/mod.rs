//! Server-side sessions keyed by the hash of an opaque bearer token.

pub mod memory;
pub mod postgres;
pub mod token;

pub use memory::MemorySessionManager;
pub use postgres::PgSessionManager;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::credentials::UserId;

/// Attempts before giving up on a token that collides with an existing hash.
pub(crate) const TOKEN_ATTEMPTS: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: UserId,
    pub issued_at_unix: i64,
}

#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Start a session for `user_id` and return the raw token for the cookie.
    async fn start(&self, user_id: UserId) -> Result<String>;

    /// Resolve a raw token. Unknown, expired or ended sessions are `None`.
    async fn resolve(&self, token: &str) -> Result<Option<Session>>;

    /// End a session. Returns whether one was removed.
    async fn end(&self, token: &str) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}
