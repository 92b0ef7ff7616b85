use anyhow::Context;
use axum::{
    extract::Extension,
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    error::AuthError,
    session::{AuthContext, clear_session_cookie},
    state::AuthState,
    types::DetailResponse,
};

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 200, description = "Session ended and cookie cleared"),
        (status = 403, description = "No active session", body = DetailResponse),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(
    auth_state: Extension<Arc<AuthState>>,
    context: AuthContext,
) -> Result<Response, AuthError> {
    // Logging out twice is an error, not a no-op.
    let (Some(token), Some(user_id)) = (context.token(), context.user_id()) else {
        debug!("Logout refused: no active session");
        return Err(AuthError::NotAuthenticated);
    };

    if !auth_state.sessions().end(token).await? {
        warn!(%user_id, "Session vanished before it could be ended");
    }

    let cookie =
        clear_session_cookie(auth_state.config()).context("failed to build session cookie")?;

    info!(%user_id, "Session ended");

    Ok((StatusCode::OK, [(SET_COOKIE, cookie)]).into_response())
}
