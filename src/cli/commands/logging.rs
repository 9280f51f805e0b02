use clap::{Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: -v (WARN), -vv (INFO), -vvv (DEBUG), -vvvv (TRACE)")
            .global(true)
            .action(ArgAction::Count),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_counts_occurrences() {
        let command = with_args(Command::new("test"));
        let matches = command.get_matches_from(vec!["test", "-vvv"]);
        assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(3));
    }
}
