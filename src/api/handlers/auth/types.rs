//! Request types for auth endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::error::{AuthError, FieldErrors};
use super::payload::Payload;
use super::utils::{USERNAME_MAX_CHARS, valid_username};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const NULL: &str = "This field may not be null.";
const NOT_A_STRING: &str = "Not a valid string.";

/// Body accepted by `/register` and `/login` (JSON or url-encoded form).
#[derive(ToSchema, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DetailResponse {
    pub detail: String,
}

/// Validated username/password pair.
pub(super) struct Credentials {
    pub(super) username: String,
    pub(super) password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    /// Registration also checks the username charset and length.
    pub(super) fn for_register(payload: &Payload) -> Result<Self, AuthError> {
        Self::from_payload(payload, true)
    }

    pub(super) fn for_login(payload: &Payload) -> Result<Self, AuthError> {
        Self::from_payload(payload, false)
    }

    fn from_payload(payload: &Payload, check_username: bool) -> Result<Self, AuthError> {
        let mut errors = FieldErrors::new();

        let username = read_field(payload, "username", true, &mut errors);
        let password = read_field(payload, "password", false, &mut errors);

        if check_username && let Some(username) = &username {
            if username.chars().count() > USERNAME_MAX_CHARS {
                push_error(
                    &mut errors,
                    "username",
                    format!("Ensure this field has no more than {USERNAME_MAX_CHARS} characters."),
                );
            } else if !valid_username(username) {
                push_error(
                    &mut errors,
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            }
        }

        match (username, password) {
            (Some(username), Some(password)) if errors.is_empty() => {
                Ok(Self { username, password })
            }
            _ => Err(AuthError::Validation(errors)),
        }
    }
}

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// Read a string field, coercing numbers and booleans like a form would.
fn read_field(
    payload: &Payload,
    field: &str,
    trim: bool,
    errors: &mut FieldErrors,
) -> Option<String> {
    let raw = match payload.get(field) {
        None => {
            push_error(errors, field, REQUIRED);
            return None;
        }
        Some(Value::Null) => {
            push_error(errors, field, NULL);
            return None;
        }
        Some(Value::String(value)) => value.clone(),
        Some(Value::Number(value)) => value.to_string(),
        Some(Value::Bool(value)) => value.to_string(),
        Some(Value::Array(_) | Value::Object(_)) => {
            push_error(errors, field, NOT_A_STRING);
            return None;
        }
    };

    if raw.trim().is_empty() {
        push_error(errors, field, BLANK);
        return None;
    }

    Some(if trim { raw.trim().to_string() } else { raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => Payload(map),
            _ => Payload::default(),
        }
    }

    fn validation_errors(result: Result<Credentials, AuthError>) -> FieldErrors {
        match result {
            Err(AuthError::Validation(errors)) => errors,
            _ => FieldErrors::new(),
        }
    }

    #[test]
    fn accepts_complete_payload() {
        let credentials = Credentials::for_register(&payload(json!({
            "username": "  newuser ",
            "password": " newpassword "
        })));
        let credentials = credentials.ok();
        assert_eq!(
            credentials.as_ref().map(|c| c.username.as_str()),
            Some("newuser")
        );
        // Passwords are taken verbatim.
        assert_eq!(
            credentials.as_ref().map(|c| c.password.as_str()),
            Some(" newpassword ")
        );
    }

    #[test]
    fn reports_every_missing_field() {
        let errors = validation_errors(Credentials::for_login(&Payload::default()));
        assert_eq!(errors.get("username"), Some(&vec![REQUIRED.to_string()]));
        assert_eq!(errors.get("password"), Some(&vec![REQUIRED.to_string()]));
    }

    #[test]
    fn blank_null_and_structured_values_are_rejected() {
        let errors = validation_errors(Credentials::for_login(&payload(json!({
            "username": "   ",
            "password": null
        }))));
        assert_eq!(errors.get("username"), Some(&vec![BLANK.to_string()]));
        assert_eq!(errors.get("password"), Some(&vec![NULL.to_string()]));

        let errors = validation_errors(Credentials::for_login(&payload(json!({
            "username": ["a"],
            "password": {"p": 1}
        }))));
        assert_eq!(errors.get("username"), Some(&vec![NOT_A_STRING.to_string()]));
        assert_eq!(errors.get("password"), Some(&vec![NOT_A_STRING.to_string()]));
    }

    #[test]
    fn numbers_are_coerced() {
        let credentials = Credentials::for_login(&payload(json!({
            "username": 1234,
            "password": true
        })))
        .ok();
        assert_eq!(credentials.as_ref().map(|c| c.username.as_str()), Some("1234"));
        assert_eq!(credentials.as_ref().map(|c| c.password.as_str()), Some("true"));
    }

    #[test]
    fn register_checks_username_format_but_login_does_not() {
        let body = payload(json!({ "username": "bad name", "password": "pw" }));
        let errors = validation_errors(Credentials::for_register(&body));
        assert_eq!(errors.get("username").map(Vec::len), Some(1));
        assert!(Credentials::for_login(&body).is_ok());
    }

    #[test]
    fn register_reports_long_usernames() {
        let body = payload(json!({ "username": "a".repeat(151), "password": "pw" }));
        let errors = validation_errors(Credentials::for_register(&body));
        assert_eq!(
            errors.get("username"),
            Some(&vec![
                "Ensure this field has no more than 150 characters.".to_string()
            ])
        );
    }

    #[test]
    fn debug_redacts_password() {
        let credentials = Credentials {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{credentials:?}").contains("hunter2"));
    }
}
