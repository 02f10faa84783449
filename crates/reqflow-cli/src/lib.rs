//! Reqflow CLI - Command line driver
//!
//! Runs queries, batch reviews and status reports against a JSON
//! requirement collection.

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod commands;
pub mod logging;
pub mod selection;

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Build the argument parser
#[must_use]
pub fn cli() -> Command {
    Command::new("reqflow")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Batch review and mutation engine for requirement collections")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(with_source_args(
            with_filter_args(Command::new("query").about("Print requirements matching the filters")),
        ))
        .subcommand(with_source_args(with_filter_args(
            Command::new("review")
                .about("Set a review level on every selected requirement")
                .arg(
                    Arg::new("level")
                        .long("level")
                        .required(true)
                        .value_parser(value_parser!(u8))
                        .help("Review level (1 or 2)"),
                )
                .arg(
                    Arg::new("status")
                        .long("status")
                        .required(true)
                        .help("New status: pending, approved or rejected"),
                )
                .arg(
                    Arg::new("opinion")
                        .long("opinion")
                        .help("Reviewer opinion, at most 1000 characters"),
                )
                .arg(
                    Arg::new("batch-size")
                        .long("batch-size")
                        .value_parser(value_parser!(usize))
                        .help("Items per chunk, overrides the config"),
                )
                .arg(
                    Arg::new("delay-ms")
                        .long("delay-ms")
                        .value_parser(value_parser!(u64))
                        .help("Pause between chunks, overrides the config"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the updated collection here"),
                ),
        )))
        .subcommand(with_source_args(
            Command::new("status").about("Print the overall review status of every requirement"),
        ))
}

fn with_source_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("data")
                .long("data")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON array of requirements"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration (TOML)"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .value_parser(value_parser!(PathBuf))
                .help("JSON settings file holding per-view indexed fields"),
        )
        .arg(
            Arg::new("view")
                .long("view")
                .default_value(commands::DEFAULT_VIEW)
                .help("View name used as the settings key"),
        )
}

fn with_filter_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("eq")
                .long("eq")
                .action(ArgAction::Append)
                .value_name("FIELD=VALUE")
                .help("Exact match, case-insensitive"),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .action(ArgAction::Append)
                .value_name("FIELD=VALUE")
                .help("Prefix match, case-insensitive"),
        )
        .arg(
            Arg::new("contains")
                .long("contains")
                .action(ArgAction::Append)
                .value_name("FIELD=VALUE")
                .help("Substring match, case-insensitive"),
        )
        .arg(
            Arg::new("any")
                .long("any")
                .action(ArgAction::SetTrue)
                .help("Match any condition instead of all"),
        )
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn review_requires_level_and_status() {
        let err = cli()
            .try_get_matches_from(["reqflow", "review", "--data", "reqs.json"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
