//! Log level selection: `--log-level <name>` (or `PORTIER_LOG_LEVEL`) names a
//! level outright, `-v` repeated raises it one step at a time from `ERROR`.

use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_LEVEL: &str = "log-level";

fn parse_level(value: &str) -> Result<Level, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(format!(
            "invalid log level '{value}', expected one of: error, warn, info, debug, trace"
        )),
    }
}

const fn level_from_count(count: u8) -> Option<Level> {
    match count {
        0 => None,
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

/// Level requested on the command line; `None` keeps the `ERROR` default.
/// A named level wins over `-v`.
#[must_use]
pub fn level(matches: &ArgMatches) -> Option<Level> {
    matches.get_one::<Level>(ARG_LOG_LEVEL).copied().or_else(|| {
        level_from_count(matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0))
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Raise verbosity: -v WARN, -vv INFO, -vvv DEBUG, -vvvv TRACE")
                .global(true)
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new(ARG_LOG_LEVEL)
                .long("log-level")
                .help("Log level: error, warn, info, debug, trace (default: error)")
                .env("PORTIER_LOG_LEVEL")
                .global(true)
                .value_parser(parse_level),
        )
}
