//! Command-line argument dispatch.
//!
//! Maps validated CLI arguments to the action the binary should execute.

use crate::cli::actions::Action;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(5000),
        dsn: matches
            .get_one::<String>("dsn")
            .cloned()
            .context("missing required argument: --dsn")?,
        log_errors: matches.get_flag("log-errors"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn builds_server_action() {
        let matches = commands::new().get_matches_from(vec![
            "kursoj",
            "--dsn",
            "postgres://localhost/kursoj",
            "--log-errors",
        ]);

        let action = handler(&matches).expect("action");
        let Action::Server {
            port,
            dsn,
            log_errors,
        } = action;

        assert_eq!(port, 5000);
        assert_eq!(dsn, "postgres://localhost/kursoj");
        assert!(log_errors);
    }
}
