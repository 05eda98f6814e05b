//! # Lookup Command Handler
//!
//! This module handles the backend's single-line queries: timezones, forecast weather,
//! job lists, and job management (delete, stop, archive).

use chrono::NaiveDate;

use crate::{
    JobHandle, JobListKind, LookupRequest, cli_utils,
    commands::shared::{
        CommandContext, dispatch_command, parse_arg_or_exit, validate_args_count_or_exit,
    },
};

const LOOKUP_USAGE: &str =
    "Usage: wisectl lookup <timezones|cities|weather|jobs|delete|stop|tar|zip> [args...]";

/// Handles all lookup commands.
///
/// # Arguments
/// * `args` - Command arguments (first element is the subcommand)
/// * `ctx` - Session and validation settings
/// * `output_format` - Output format for the reply lines
pub async fn handle_lookup_command(
    args: &[String],
    ctx: &CommandContext,
    output_format: cli_utils::OutputFormat,
) {
    dispatch_command!("lookup", LOOKUP_USAGE, args, ctx, output_format, {
        "timezones" => handle_lookup_timezones,
        "cities" => handle_lookup_cities,
        "weather" => handle_lookup_weather,
        "jobs" => handle_lookup_jobs,
        "delete" => handle_lookup_delete,
        "stop" => handle_lookup_stop,
        "tar" => handle_lookup_tar,
        "zip" => handle_lookup_zip,
    });
}

/// Sends `request` and prints the reply lines.
async fn run_and_print(
    request: LookupRequest,
    ctx: &CommandContext,
    output_format: cli_utils::OutputFormat,
    context: &str,
) {
    let lines = ctx
        .session
        .request(&request)
        .await
        .unwrap_or_else(|e| cli_utils::exit_with_handled_error(&e, &format!("Failed to {}", context)));
    cli_utils::print_formatted_or_exit(&lines, output_format, context);
}

async fn handle_lookup_timezones(
    args: &[String],
    ctx: &CommandContext,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "timezones", "Usage: wisectl lookup timezones");
    run_and_print(LookupRequest::ListTimezones, ctx, output_format, "list timezones").await;
}

async fn handle_lookup_cities(
    args: &[String],
    ctx: &CommandContext,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        3,
        3,
        "cities",
        "Usage: wisectl lookup cities <country> <province>",
    );
    let request = LookupRequest::WeatherListCities {
        country: args[1].clone(),
        province: args[2].clone(),
    };
    run_and_print(request, ctx, output_format, "list cities").await;
}

async fn handle_lookup_weather(
    args: &[String],
    ctx: &CommandContext,
    output_format: cli_utils::OutputFormat,
) {
    const USAGE: &str =
        "Usage: wisectl lookup weather <latitude> <longitude> <YYYY-MM-DD> <days> <model>";
    validate_args_count_or_exit(args, 6, 6, "weather", USAGE);
    let request = LookupRequest::WeatherGet {
        latitude: parse_arg_or_exit(&args[1], "latitude", "a number"),
        longitude: parse_arg_or_exit(&args[2], "longitude", "a number"),
        start_date: parse_arg_or_exit::<NaiveDate>(&args[3], "start date", "YYYY-MM-DD"),
        days: parse_arg_or_exit(&args[4], "days", "a whole number"),
        model: args[5].clone(),
    };
    run_and_print(request, ctx, output_format, "fetch weather").await;
}

async fn handle_lookup_jobs(
    args: &[String],
    ctx: &CommandContext,
    output_format: cli_utils::OutputFormat,
) {
    const USAGE: &str = "Usage: wisectl lookup jobs <complete|running|queued>";
    validate_args_count_or_exit(args, 2, 2, "jobs", USAGE);
    let kind = match args[1].as_str() {
        "complete" => JobListKind::Complete,
        "running" => JobListKind::Running,
        "queued" => JobListKind::Queued,
        other => cli_utils::exit_with_usage_error(&format!("Unknown job list '{}'", other), USAGE),
    };
    run_and_print(LookupRequest::ListJobs(kind), ctx, output_format, "list jobs").await;
}

async fn handle_lookup_delete(
    args: &[String],
    ctx: &CommandContext,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "delete", "Usage: wisectl lookup delete <job>");
    let request = LookupRequest::Delete(JobHandle::new(&args[1]));
    run_and_print(request, ctx, output_format, "delete job").await;
}

async fn handle_lookup_stop(
    args: &[String],
    ctx: &CommandContext,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 3, "stop", "Usage: wisectl lookup stop <job> [priority]");
    let priority = match args.get(2) {
        Some(value) => parse_arg_or_exit(value, "priority", "an integer"),
        None => 0,
    };
    let request = LookupRequest::StopJob {
        job: JobHandle::new(&args[1]),
        priority,
    };
    run_and_print(request, ctx, output_format, "stop job").await;
}

async fn handle_lookup_tar(
    args: &[String],
    ctx: &CommandContext,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "tar", "Usage: wisectl lookup tar <job>");
    let request = LookupRequest::Tar(JobHandle::new(&args[1]));
    run_and_print(request, ctx, output_format, "archive job").await;
}

async fn handle_lookup_zip(
    args: &[String],
    ctx: &CommandContext,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "zip", "Usage: wisectl lookup zip <job>");
    let request = LookupRequest::Zip(JobHandle::new(&args[1]));
    run_and_print(request, ctx, output_format, "archive job").await;
}
