use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{Instrument, info_span};

use super::token::{generate_session_token, hash_session_token};
use super::{Session, SessionManager, TOKEN_ATTEMPTS};
use crate::{credentials::UserId, db};

/// Session manager backed by the `user_sessions` table.
#[derive(Debug, Clone)]
pub struct PgSessionManager {
    pool: PgPool,
    ttl_seconds: i64,
}

/// `expires_at` is computed in SQL; larger intervals overflow `timestamptz`.
const MAX_TTL_SECONDS: i64 = 2_147_483_647;

fn ttl_seconds(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).map_or(MAX_TTL_SECONDS, |secs| secs.min(MAX_TTL_SECONDS))
}

impl PgSessionManager {
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self {
            pool,
            ttl_seconds: ttl_seconds(ttl),
        }
    }
}

#[async_trait]
impl SessionManager for PgSessionManager {
    async fn start(&self, user_id: UserId) -> Result<String> {
        // Store only the hash and hand the raw value back for the cookie.
        let query = r"
            INSERT INTO user_sessions (user_id, session_hash, expires_at)
            VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );

        for _ in 0..TOKEN_ATTEMPTS {
            let token = generate_session_token()?;
            let token_hash = hash_session_token(&token);
            let result = sqlx::query(query)
                .bind(user_id)
                .bind(token_hash)
                .bind(self.ttl_seconds)
                .execute(&self.pool)
                .instrument(span.clone())
                .await;

            match result {
                Ok(_) => return Ok(token),
                Err(err) if db::is_unique_violation(&err) => {}
                Err(err) => return Err(err).context("failed to insert session"),
            }
        }

        Err(anyhow!("failed to generate unique session token"))
    }

    async fn resolve(&self, token: &str) -> Result<Option<Session>> {
        let token_hash = hash_session_token(token);

        // Account status is checked by the caller against the credential store.
        let query = r"
            SELECT user_id, EXTRACT(EPOCH FROM created_at)::BIGINT AS issued_at_unix
            FROM user_sessions
            WHERE session_hash = $1 AND expires_at > NOW()
            LIMIT 1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let Some(row) = sqlx::query(query)
            .bind(&token_hash)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup session")?
        else {
            return Ok(None);
        };

        // Record activity without extending the session TTL.
        let query = "UPDATE user_sessions SET last_seen_at = NOW() WHERE session_hash = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(&token_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update session last_seen_at")?;

        Ok(Some(Session {
            user_id: row.try_get("user_id")?,
            issued_at_unix: row.try_get("issued_at_unix")?,
        }))
    }

    async fn end(&self, token: &str) -> Result<bool> {
        let query = "DELETE FROM user_sessions WHERE session_hash = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(hash_session_token(token))
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete session")?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        db::ping(&self.pool).await
    }
}
