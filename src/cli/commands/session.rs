use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";

/// Largest TTL accepted: fits the cookie `Max-Age` and a Postgres `INTERVAL`.
pub const MAX_SESSION_TTL_SECONDS: u64 = 2_147_483_647;

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session lifetime in seconds, also used as the cookie Max-Age")
                .env("PORTIER_SESSION_TTL_SECONDS")
                .default_value("43200")
                .value_parser(clap::value_parser!(u64).range(1..=MAX_SESSION_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long(ARG_COOKIE_SECURE)
                .help("Mark the session cookie as Secure (HTTPS only)")
                .env("PORTIER_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        )
}

#[derive(Debug)]
pub struct Options {
    pub session_ttl_seconds: u64,
    pub cookie_secure: bool,
}

impl Options {
    /// # Errors
    /// Returns an error if the session TTL is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let session_ttl_seconds = matches
            .get_one::<u64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .context("missing required argument: --session-ttl-seconds")?;
        let cookie_secure = matches.get_flag(ARG_COOKIE_SECURE);

        Ok(Self {
            session_ttl_seconds,
            cookie_secure,
        })
    }
}
