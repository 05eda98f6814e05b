//! # Shared Command Utilities
//!
//! This module provides shared validation, parsing, and utility functions
//! used across multiple command handlers to reduce code duplication.

use std::path::Path;
use std::str::FromStr;

use crate::commands::errors::ArgumentError;
use crate::{Job, Session, ValidationContext, cli_utils, config};

/// What every command handler needs: a session to the backend and validation settings.
#[derive(Debug)]
pub struct CommandContext {
    /// The backend session.
    pub session: Session,
    /// How jobs are validated before use.
    pub validation: ValidationContext,
}

/// Loads a job description from a JSON or YAML file, exiting on failure.
pub fn load_job_or_exit(path: &str) -> Job {
    config::load_file(Path::new(path)).unwrap_or_else(|e| {
        cli_utils::exit_with_handled_error(&e, &format!("Failed to load job {}", path))
    })
}

/// Parses a positional argument, exiting with a readable message on failure.
pub fn parse_arg_or_exit<T: FromStr>(value: &str, field: &str, expected: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        let err = ArgumentError {
            field: field.to_string(),
            value: value.to_string(),
            reason: format!("expected {}", expected),
        };
        cli_utils::exit_with_handled_error(&err, "Bad argument")
    })
}

/// Validates both minimum and maximum argument counts.
///
/// # Arguments
/// * `args` - The command arguments array
/// * `min_count` - The minimum number of arguments required (including subcommand)
/// * `max_count` - The maximum number of arguments allowed (including subcommand)
/// * `command` - The command name for error message
/// * `usage` - The usage string to display
pub fn validate_args_count_or_exit(
    args: &[String],
    min_count: usize,
    max_count: usize,
    command: &str,
    usage: &str,
) {
    if args.len() < min_count {
        cli_utils::exit_with_usage_error(
            &format!("{} command requires more arguments", command),
            usage,
        );
    }
    if args.len() > max_count {
        cli_utils::exit_with_usage_error(
            &format!("{} command has too many arguments", command),
            usage,
        );
    }
}

/// Macro to generate command dispatcher boilerplate.
macro_rules! dispatch_command {
    ($command_name:expr, $usage:expr, $args:expr, $ctx:expr, $output_format:expr, {
        $($subcommand:expr => $handler:expr),* $(,)?
    }) => {
        if $args.is_empty() {
            crate::cli_utils::exit_with_usage_error(
                &format!("{} command requires a subcommand", $command_name),
                $usage,
            );
        }

        match $args[0].as_str() {
            $(
                $subcommand => $handler($args, $ctx, $output_format).await,
            )*
            _ => {
                let available_subcommands = vec![$($subcommand),*];
                crate::cli_utils::exit_with_error(&format!(
                    "Unknown {} subcommand '{}'. Available subcommands: {}",
                    $command_name,
                    $args[0],
                    available_subcommands.join(", ")
                ));
            }
        }
    };
}

pub(crate) use dispatch_command;
