//! Small helpers for auth validation.

use regex::Regex;
use std::sync::LazyLock;

pub(super) const USERNAME_MAX_CHARS: usize = 150;

static USERNAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").ok());

/// Letters, digits and `@ . + - _`, at most 150 characters.
pub(super) fn valid_username(username: &str) -> bool {
    username.chars().count() <= USERNAME_MAX_CHARS
        && USERNAME_RE
            .as_ref()
            .is_some_and(|regex| regex.is_match(username))
}
