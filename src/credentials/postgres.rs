use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{Instrument, info_span};
use uuid::Uuid;

use super::{CredentialStore, StoreError, User, UserId, check_credentials, hash_blocking};
use crate::db;

/// Credential store backed by the `users` table.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create(&self, username: &str, password: &str) -> Result<UserId, StoreError> {
        let password_hash = hash_blocking(password).await?;
        let id = Uuid::new_v4();

        let query = "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        match sqlx::query(query)
            .bind(id)
            .bind(username)
            .bind(&password_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
        {
            Ok(_) => Ok(id),
            Err(err) if db::is_unique_violation(&err) => Err(StoreError::DuplicateUsername),
            Err(err) => Err(StoreError::Backend(
                anyhow::Error::new(err).context("failed to insert user"),
            )),
        }
    }

    async fn verify(&self, username: &str, password: &str) -> Result<Option<UserId>, StoreError> {
        let user = self.find(username).await?;
        check_credentials(user, password).await
    }

    async fn find(&self, username: &str) -> Result<Option<User>, StoreError> {
        let query = "SELECT id, username, password_hash, is_active FROM users WHERE username = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let user = sqlx::query_as::<_, User>(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user")?;
        Ok(user)
    }

    async fn is_active(&self, user_id: UserId) -> Result<bool, StoreError> {
        let query = "SELECT is_active FROM users WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let is_active: Option<bool> = sqlx::query_scalar(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account status")?;
        Ok(is_active.unwrap_or(false))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        db::ping(&self.pool).await?;
        Ok(())
    }
}
