use anyhow::Context;
use axum::{
    extract::Extension,
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    error::AuthError,
    payload::Payload,
    session::{AuthContext, session_cookie},
    state::AuthState,
    types::{Credentials, CredentialsRequest, ErrorResponse},
};

#[utoipa::path(
    post,
    path = "/login",
    request_body(
        content = CredentialsRequest,
        content_type = "application/json",
        description = "JSON or application/x-www-form-urlencoded"
    ),
    responses(
        (status = 200, description = "Session started; the session cookie is set"),
        (status = 400, description = "Invalid username or password, field errors, or an active session", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    context: AuthContext,
    payload: Result<Payload, AuthError>,
) -> Result<Response, AuthError> {
    if context.is_authenticated() {
        debug!("Login refused: request already has a session");
        return Err(AuthError::AlreadyAuthenticated);
    }

    let credentials = Credentials::for_login(&payload?)?;

    // Unknown user, wrong password and inactive account are indistinguishable here.
    let Some(user_id) = auth_state
        .credentials()
        .verify(&credentials.username, &credentials.password)
        .await?
    else {
        debug!("Invalid credentials");
        return Err(AuthError::InvalidCredentials);
    };

    let token = auth_state.sessions().start(user_id).await?;
    let cookie =
        session_cookie(auth_state.config(), &token).context("failed to build session cookie")?;

    info!(%user_id, "Session started");

    Ok((StatusCode::OK, [(SET_COOKIE, cookie)]).into_response())
}
