use crate::{
    api::{
        self,
        handlers::auth::{AuthConfig, AuthState},
    },
    credentials::{CredentialStore, MemoryCredentialStore, PgCredentialStore},
    db,
    sessions::{MemorySessionManager, PgSessionManager, SessionManager},
};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

pub struct Args {
    pub port: u16,
    pub dsn: Option<SecretString>,
    pub session_ttl_seconds: u64,
    pub cookie_secure: bool,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &self.dsn.as_ref().map(|_| "***"))
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

type Backends = (Arc<dyn CredentialStore>, Arc<dyn SessionManager>);

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = AuthConfig::new()
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_session_cookie_secure(args.cookie_secure);

    let (credentials, sessions) = backends(args.dsn.as_ref(), config.session_ttl()).await?;
    let auth_state = Arc::new(AuthState::new(config, credentials, sessions));

    api::new(args.port, auth_state).await
}

async fn backends(dsn: Option<&SecretString>, session_ttl: Duration) -> Result<Backends> {
    if let Some(dsn) = dsn {
        let pool = db::connect(dsn.expose_secret()).await?;
        info!("Using Postgres credential and session stores");
        Ok((
            Arc::new(PgCredentialStore::new(pool.clone())),
            Arc::new(PgSessionManager::new(pool, session_ttl)),
        ))
    } else {
        warn!("No DSN configured: users and sessions are kept in memory and lost on restart");
        Ok((
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemorySessionManager::new(session_ttl)),
        ))
    }
}
