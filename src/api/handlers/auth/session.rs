//! Session cookie handling and the per-request authentication context.

use anyhow::anyhow;
use axum::{
    extract::FromRequestParts,
    http::{
        HeaderMap, HeaderValue,
        header::{AUTHORIZATION, COOKIE, InvalidHeaderValue},
        request::Parts,
    },
};
use std::sync::Arc;

use super::{error::AuthError, state::AuthConfig, state::AuthState};
use crate::{credentials::UserId, sessions::Session};

pub(crate) const SESSION_COOKIE_NAME: &str = "portier_session";

/// Authentication state derived from the request's session token. Never persisted.
#[derive(Clone, Debug, Default)]
pub struct AuthContext {
    active: Option<(String, Session)>,
}

impl AuthContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.active.as_ref().map(|(_, session)| session.user_id)
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|(_, session)| session)
    }

    /// Raw token of the active session.
    pub(super) fn token(&self) -> Option<&str> {
        self.active.as_ref().map(|(token, _)| token.as_str())
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = parts
            .extensions
            .get::<Arc<AuthState>>()
            .cloned()
            .ok_or_else(|| AuthError::Internal(anyhow!("auth state extension is missing")))?;

        // Missing or stale tokens are anonymous requests, not errors.
        let Some(token) = extract_session_token(&parts.headers) else {
            return Ok(Self::anonymous());
        };
        let Some(session) = auth_state.sessions().resolve(&token).await? else {
            return Ok(Self::anonymous());
        };

        // A deactivated account keeps its session row but no longer authenticates.
        if !auth_state.credentials().is_active(session.user_id).await? {
            return Ok(Self::anonymous());
        }

        Ok(Self {
            active: Some((token, session)),
        })
    }
}

/// Build a `HttpOnly` cookie for the session token.
pub(super) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl().as_secs();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Bearer header first, then the session cookie.
pub(super) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            let val = val.trim();
            if key.trim() == SESSION_COOKIE_NAME && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
