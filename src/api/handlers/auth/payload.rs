//! Untyped request bodies.
//!
//! Register and login accept either JSON objects or url-encoded forms. The
//! body is kept as a loose map so that missing or mistyped fields surface as
//! field errors instead of extractor rejections.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::{Map, Value};

use super::error::AuthError;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Payload(pub Map<String, Value>);

impl Payload {
    pub(super) fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Parse a body according to its content type. Blank bodies are empty payloads.
    pub(super) fn parse(content_type: Option<&str>, body: &[u8]) -> Result<Self, AuthError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let is_form = content_type.is_some_and(|value| {
            value
                .trim()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        });

        if is_form {
            let map = url::form_urlencoded::parse(body)
                .into_owned()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            return Ok(Self(map));
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(AuthError::non_field(
                "Invalid data. Expected a dictionary.",
            )),
            Err(err) => Err(AuthError::non_field(format!("JSON parse error - {err}"))),
        }
    }
}

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AuthError::non_field(rejection.body_text()))?;
        Self::parse(content_type.as_deref(), &body)
    }
}
