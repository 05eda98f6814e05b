use std::fmt;
use std::process;
use std::str::FromStr;

use crate::commands::errors::{UserError, format_cli_error};
use handled::Handle;

/// How list and object results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(format!("unknown output format '{}': expected json or yaml", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Exits the program with an error message
pub fn exit_with_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Exits the program with an error message and usage information
pub fn exit_with_usage_error(message: &str, usage: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("{}", usage);
    process::exit(1);
}

/// Exits with the user-facing rendering of `error`
pub fn exit_with_handled_error<E>(error: &E, context: &str) -> !
where
    E: Handle<UserError> + fmt::Display,
{
    eprintln!("{}", format_cli_error(error, context));
    process::exit(1);
}

/// Renders `value` in the requested format
pub fn format_value<T>(value: &T, format: OutputFormat) -> Result<String, String>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yml::to_string(value).map_err(|e| e.to_string()),
    }
}

/// Prints a value in the requested format or exits with error
pub fn print_formatted_or_exit<T>(value: &T, format: OutputFormat, context: &str)
where
    T: serde::Serialize,
{
    match format_value(value, format) {
        Ok(text) => println!("{}", text.trim_end()),
        Err(e) => exit_with_error(&format!("Failed to format {}: {}", context, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parses() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("toml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default().to_string(), "json");
    }

    #[test]
    fn formats_values() {
        let value = vec!["a", "b"];
        assert_eq!(format_value(&value, OutputFormat::Json).unwrap(), "[\n  \"a\",\n  \"b\"\n]");
        assert_eq!(format_value(&value, OutputFormat::Yaml).unwrap(), "- a\n- b\n");
    }
}
