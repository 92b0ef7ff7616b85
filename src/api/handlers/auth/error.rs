//! Auth failures and their HTTP rendering.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::error;

use crate::credentials::StoreError;

pub(crate) const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";
pub(crate) const NOT_AUTHENTICATED_DETAIL: &str = "Authentication credentials were not provided.";
pub(crate) const DUPLICATE_USERNAME_MESSAGE: &str = "A user with that username already exists.";
pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
pub(crate) const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field name -> messages, rendered as the JSON body of a validation failure.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("username already exists")]
    DuplicateUsername,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("request already carries an active session")]
    AlreadyAuthenticated,
    #[error("no active session")]
    NotAuthenticated,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Validation failure not tied to a single field.
    pub(crate) fn non_field(message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(NON_FIELD_ERRORS.to_string(), vec![message.into()]);
        Self::Validation(errors)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::DuplicateUsername
            | Self::InvalidCredentials
            | Self::AlreadyAuthenticated => StatusCode::BAD_REQUEST,
            Self::NotAuthenticated => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => Self::DuplicateUsername,
            StoreError::Backend(err) => Self::Internal(err),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(errors) => (status, Json(errors)).into_response(),
            Self::DuplicateUsername => (
                status,
                Json(json!({ "username": [DUPLICATE_USERNAME_MESSAGE] })),
            )
                .into_response(),
            Self::InvalidCredentials => (
                status,
                Json(json!({ "error": INVALID_CREDENTIALS_MESSAGE })),
            )
                .into_response(),
            Self::AlreadyAuthenticated => status.into_response(),
            Self::NotAuthenticated => {
                (status, Json(json!({ "detail": NOT_AUTHENTICATED_DETAIL }))).into_response()
            }
            Self::Internal(err) => {
                error!("Auth request failed: {err:#}");
                (status, Json(json!({ "error": INTERNAL_ERROR_MESSAGE }))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use axum::body::to_bytes;

    async fn body_json(err: AuthError) -> anyhow::Result<(StatusCode, serde_json::Value)> {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body)?
        };
        Ok((status, value))
    }

    #[tokio::test]
    async fn status_mapping() -> anyhow::Result<()> {
        let (status, body) = body_json(AuthError::InvalidCredentials).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid username or password" }));

        let (status, body) = body_json(AuthError::NotAuthenticated).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "detail": NOT_AUTHENTICATED_DETAIL }));

        let (status, body) = body_json(AuthError::AlreadyAuthenticated).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::Value::Null);

        let (status, body) = body_json(AuthError::DuplicateUsername).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "username": [DUPLICATE_USERNAME_MESSAGE] }));
        Ok(())
    }

    #[tokio::test]
    async fn internal_errors_hide_details() -> anyhow::Result<()> {
        let (status, body) = body_json(AuthError::Internal(anyhow!("db password leaked"))).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": INTERNAL_ERROR_MESSAGE }));
        Ok(())
    }

    #[test]
    fn store_errors_map_to_auth_errors() {
        assert!(matches!(
            AuthError::from(StoreError::DuplicateUsername),
            AuthError::DuplicateUsername
        ));
        assert!(matches!(
            AuthError::from(StoreError::Backend(anyhow!("down"))),
            AuthError::Internal(_)
        ));
    }

    #[test]
    fn non_field_errors_key() {
        let AuthError::Validation(errors) = AuthError::non_field("Malformed request body") else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get(NON_FIELD_ERRORS),
            Some(&vec!["Malformed request body".to_string()])
        );
    }
}
