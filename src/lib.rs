//! # Portier (session-backed authentication)
//!
//! `portier` exposes three endpoints on top of a server-side session store:
//!
//! - `POST /register` creates a user with an Argon2 password hash. It never
//!   starts a session; callers log in separately.
//! - `POST /login` verifies credentials and sets the `portier_session` cookie.
//!   Unknown usernames and wrong passwords produce the same response.
//! - `GET /logout` ends the current session. Without one it answers `403`,
//!   including on a second logout with the same cookie.
//!
//! ## Collaborators
//!
//! Handlers only talk to two traits, [`credentials::CredentialStore`] and
//! [`sessions::SessionManager`]. Both ship with a Postgres implementation
//! (selected with `--dsn`) and an in-memory one used when no DSN is configured.
//! Session tokens are random 32-byte values; only their SHA-256 hash is stored.
//!
//! ## Request monitoring
//!
//! Every request passes through [`api::monitoring`], which logs the request
//! and response, logs successful (2xx) requests at `INFO`, and turns a handler
//! panic into a single `500` response instead of tearing down the connection.

pub mod api;
pub mod cli;
pub mod credentials;
pub mod db;
pub mod sessions;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
