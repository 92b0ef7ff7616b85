use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use super::token::{generate_session_token, hash_session_token};
use super::{Session, SessionManager, TOKEN_ATTEMPTS};
use crate::credentials::UserId;

struct Entry {
    session: Session,
    created_at: Instant,
}

/// Process-local session table. Expired entries are dropped on the next `start`.
pub struct MemorySessionManager {
    ttl: Duration,
    sessions: RwLock<HashMap<Vec<u8>, Entry>>,
}

impl MemorySessionManager {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored (possibly expired) sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl std::fmt::Debug for MemorySessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionManager")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}

#[async_trait]
impl SessionManager for MemorySessionManager {
    async fn start(&self, user_id: UserId) -> Result<String> {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, entry| entry.created_at.elapsed() < self.ttl);

        for _ in 0..TOKEN_ATTEMPTS {
            let token = generate_session_token()?;
            let token_hash = hash_session_token(&token);
            if sessions.contains_key(&token_hash) {
                continue;
            }
            sessions.insert(
                token_hash,
                Entry {
                    session: Session {
                        user_id,
                        issued_at_unix: now_unix(),
                    },
                    created_at: Instant::now(),
                },
            );
            return Ok(token);
        }

        Err(anyhow!("failed to generate unique session token"))
    }

    async fn resolve(&self, token: &str) -> Result<Option<Session>> {
        let token_hash = hash_session_token(token);
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&token_hash)
            .filter(|entry| entry.created_at.elapsed() < self.ttl)
            .map(|entry| entry.session.clone()))
    }

    async fn end(&self, token: &str) -> Result<bool> {
        let token_hash = hash_session_token(token);
        Ok(self.sessions.write().await.remove(&token_hash).is_some())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
