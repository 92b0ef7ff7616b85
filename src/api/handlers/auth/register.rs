use axum::{extract::Extension, http::StatusCode};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    error::AuthError,
    payload::Payload,
    session::AuthContext,
    state::AuthState,
    types::{Credentials, CredentialsRequest},
};

#[utoipa::path(
    post,
    path = "/register",
    request_body(
        content = CredentialsRequest,
        content_type = "application/json",
        description = "JSON or application/x-www-form-urlencoded"
    ),
    responses(
        (status = 201, description = "User created; no session is started"),
        (status = 400, description = "Field errors, duplicate username, or an active session"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    auth_state: Extension<Arc<AuthState>>,
    context: AuthContext,
    payload: Result<Payload, AuthError>,
) -> Result<StatusCode, AuthError> {
    if context.is_authenticated() {
        debug!("Register refused: request already has a session");
        return Err(AuthError::AlreadyAuthenticated);
    }

    let credentials = Credentials::for_register(&payload?)?;
    debug!("credentials: {:?}", credentials);

    // Cheap pre-check; the store still enforces uniqueness under races.
    if auth_state
        .credentials()
        .find(&credentials.username)
        .await?
        .is_some()
    {
        debug!("Username already exists");
        return Err(AuthError::DuplicateUsername);
    }

    let user_id = auth_state
        .credentials()
        .create(&credentials.username, &credentials.password)
        .await?;

    info!(%user_id, username = %credentials.username, "User registered");

    Ok(StatusCode::CREATED)
}
