//! # Job Command Handler
//!
//! This module handles job-related CLI commands: validating a job description,
//! printing its wire encoding, and submitting it to the backend.

use std::io::Write;

use serde::Serialize;

use crate::{
    Validate, cli_utils,
    commands::shared::{
        CommandContext, dispatch_command, load_job_or_exit, validate_args_count_or_exit,
    },
    leaf_errors,
};

const JOB_USAGE: &str = "Usage: wisectl job <validate|encode|submit> <file.json|file.yaml>";

/// One validation problem as printed by `job validate`.
#[derive(Debug, Serialize)]
struct Problem<'a> {
    path: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    object: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
}

/// Handles all job-related commands.
///
/// # Arguments
/// * `args` - Command arguments (first element is the subcommand)
/// * `ctx` - Session and validation settings
/// * `output_format` - Output format for validation reports
pub async fn handle_job_command(
    args: &[String],
    ctx: &CommandContext,
    output_format: cli_utils::OutputFormat,
) {
    dispatch_command!("job", JOB_USAGE, args, ctx, output_format, {
        "validate" => handle_job_validate,
        "encode" => handle_job_encode,
        "submit" => handle_job_submit,
    });
}

/// Handles job validation, printing every problem found.
async fn handle_job_validate(
    args: &[String],
    ctx: &CommandContext,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "validate", "Usage: wisectl job validate <file>");
    let job = load_job_or_exit(&args[1]);
    let errors = job.check_valid(&ctx.validation);
    if errors.is_empty() {
        println!("{} is valid", args[1]);
        return;
    }
    let leaves = leaf_errors(&errors);
    let problems: Vec<Problem<'_>> = leaves
        .iter()
        .map(|leaf| Problem {
            path: &leaf.path,
            message: &leaf.error.message,
            object: leaf.error.object_id.as_deref(),
            value: leaf.error.value.as_deref(),
        })
        .collect();
    cli_utils::print_formatted_or_exit(&problems, output_format, "validation report");
    cli_utils::exit_with_error(&format!(
        "{} has {} validation problem(s)",
        args[1],
        problems.len()
    ));
}

/// Handles printing the wire records of a valid job.
async fn handle_job_encode(
    args: &[String],
    ctx: &CommandContext,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "encode", "Usage: wisectl job encode <file>");
    let job = load_job_or_exit(&args[1]);
    let message = job
        .begin_job(&ctx.validation)
        .unwrap_or_else(|e| cli_utils::exit_with_handled_error(&e, "Failed to encode job"));
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(&message.to_bytes()).and_then(|_| stdout.flush()) {
        cli_utils::exit_with_error(&format!("Failed to write job: {}", e));
    }
}

/// Handles job submission.
async fn handle_job_submit(
    args: &[String],
    ctx: &CommandContext,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "submit", "Usage: wisectl job submit <file>");
    let job = load_job_or_exit(&args[1]);
    let handle = ctx
        .session
        .submit_job(&job, &ctx.validation)
        .await
        .unwrap_or_else(|e| cli_utils::exit_with_handled_error(&e, "Failed to submit job"));
    println!("Submitted job: {}", handle);
}
