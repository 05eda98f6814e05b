use std::path::Path;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;

use wise_builder::{
    ClientConfig, ServerConfig, Session,
    cli_utils::{self, OutputFormat},
    commands::{CommandContext, handle_job_command, handle_lookup_command},
    logging,
};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Options {
    #[arrrg(optional, "Path to a JSON or YAML client configuration file")]
    config: Option<String>,
    #[arrrg(optional, "Address of the WISE builder")]
    address: Option<String>,
    #[arrrg(optional, "Port of the WISE builder")]
    port: Option<String>,
    #[arrrg(flag, "Do not check that referenced files exist")]
    skip_file_checks: bool,
    #[arrrg(optional, "Output format for reports and lists: json or yaml (default: json)")]
    output: OutputFormat,
}

const USAGE: &str = r#"Usage: wisectl [options] <command> [args...]

Options:
  --config <file>        Client configuration (.json, .yaml or .yml)
  --address <host>       Address of the WISE builder (default: 127.0.0.1, or $WISE_ADDRESS)
  --port <port>          Port of the WISE builder (default: 32479, or $WISE_PORT)
  --skip-file-checks     Do not check that referenced files exist
  --output <format>      Output format for reports and lists: json or yaml (default: json)

Commands:
  job validate <file>                          Validate a job description and list every problem
  job encode <file>                            Print the wire records of a valid job
  job submit <file>                            Validate and submit a job, printing its name
  lookup timezones                             List the timezones the builder knows
  lookup cities <country> <province>           List cities with forecast weather
  lookup weather <lat> <lon> <date> <days> <model>  Fetch forecast weather for a location
  lookup jobs <complete|running|queued>        List jobs by state
  lookup delete <job>                          Delete a job
  lookup stop <job> [priority]                 Stop a running job
  lookup tar <job>                             Archive a job's outputs as tar
  lookup zip <job>                             Archive a job's outputs as zip"#;

fn client_config(options: &Options) -> ClientConfig {
    let mut config = match &options.config {
        Some(path) => ClientConfig::load(Path::new(path)).unwrap_or_else(|e| {
            cli_utils::exit_with_handled_error(&e, &format!("Failed to load {}", path))
        }),
        None => ClientConfig {
            server: ServerConfig::from_env().unwrap_or_else(|e| {
                cli_utils::exit_with_handled_error(&e, "Bad environment")
            }),
            ..ClientConfig::default()
        },
    };
    config.server = config
        .server
        .with_overrides(options.address.clone(), options.port.clone())
        .unwrap_or_else(|e| cli_utils::exit_with_handled_error(&e, "Bad server option"));
    if options.skip_file_checks {
        config.check_files = false;
    }
    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (options, free) = Options::from_command_line_relaxed("USAGE: wisectl <command> [args...]");

    if free.is_empty() {
        cli_utils::exit_with_usage_error("No command specified", USAGE);
    }

    let config = client_config(&options);
    logging::init_logging(&config.log_level);

    let ctx = CommandContext {
        validation: config.validation_context(),
        session: Session::new(config.server),
    };

    match free[0].as_str() {
        "job" => {
            handle_job_command(&free[1..], &ctx, options.output).await;
        }
        "lookup" => {
            handle_lookup_command(&free[1..], &ctx, options.output).await;
        }
        _ => {
            cli_utils::exit_with_error(&format!(
                "Unknown command '{}'. Available commands: job, lookup",
                free[0]
            ));
        }
    }

    Ok(())
}
