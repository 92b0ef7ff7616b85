//! Register, login and logout.
//!
//! Every handler resolves an [`AuthContext`] from the `portier_session`
//! cookie (or a bearer token) before looking at the body, so the
//! "already authenticated" and "not authenticated" guards win over payload
//! validation.
//!
//! ## Responses
//!
//! | Handler  | Success                     | Failure                                        |
//! |----------|-----------------------------|------------------------------------------------|
//! | register | `201`, empty                | `400` field errors / duplicate / active session |
//! | login    | `200`, empty, cookie set    | `400` `{"error": "Invalid username or password"}` |
//! | logout   | `200`, empty, cookie cleared | `403` without an active session                |

pub(crate) mod error;
pub mod login;
pub mod logout;
mod payload;
pub mod register;
pub(crate) mod session;
mod state;
pub(crate) mod types;
mod utils;

pub use error::{AuthError, FieldErrors};
pub use payload::Payload;
pub use session::AuthContext;
pub use state::{AuthConfig, AuthState};
