//! # Client configuration
//!
//! `wisectl` reads its settings from a JSON or YAML file.  The format follows the extension
//! (`.json`, `.yaml`, `.yml`); anything else is tried as JSON, then as YAML.  The same parsing
//! loads job descriptions.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::logging::DEFAULT_LEVEL;
use crate::transport::ServerConfig;
use crate::validation::ValidationContext;

/// Settings for the command line client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// The backend to talk to.
    pub server: ServerConfig,
    /// Whether validation checks that referenced files exist.
    pub check_files: bool,
    /// Log filter, e.g. `info` or `wise_builder=debug`.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            check_files: true,
            log_level: DEFAULT_LEVEL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_file(path)
    }

    /// The validation context these settings call for.
    pub fn validation_context(&self) -> ValidationContext {
        ValidationContext {
            check_files: self.check_files,
        }
    }
}

/// Reads and parses `path` as JSON or YAML.
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_content(path, &content)
}

/// Parses `content`, choosing the format from `path`'s extension.
pub fn parse_content<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, ConfigError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => serde_json::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("invalid JSON: {}", e))),
        Some("yaml") | Some("yml") => serde_yml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("invalid YAML: {}", e))),
        _ => {
            if let Ok(value) = serde_json::from_str(content) {
                Ok(value)
            } else if let Ok(value) = serde_yml::from_str(content) {
                Ok(value)
            } else {
                Err(ConfigError::Parse(
                    "content is neither valid JSON nor valid YAML".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn json_by_extension() {
        let config: ClientConfig = parse_content(
            Path::new("wise.json"),
            r#"{"server": {"address": "10.0.0.5", "port": 4000}, "check_files": false}"#,
        )
        .unwrap();
        assert_eq!(config.server, ServerConfig::new("10.0.0.5", 4000));
        assert!(!config.check_files);
        assert_eq!(config.log_level, DEFAULT_LEVEL);
        assert!(!config.validation_context().check_files);
    }

    #[test]
    fn yaml_by_extension() {
        let config: ClientConfig =
            parse_content(Path::new("wise.YML"), "log_level: debug\nserver:\n  port: 5000\n")
                .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.address, "127.0.0.1");
    }

    #[test]
    fn unknown_extension_tries_both() {
        let config: ClientConfig = parse_content(Path::new("wiserc"), "check_files: false\n").unwrap();
        assert!(!config.check_files);
        let err = parse_content::<ClientConfig>(Path::new("wiserc"), "server: [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn wrong_format_for_extension() {
        let err = parse_content::<ClientConfig>(Path::new("wise.json"), "check_files: no").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse configuration: invalid JSON"));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "server:\n  address: wise.local").unwrap();
        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.server.address, "wise.local");
        assert!(ClientConfig::load(Path::new("/nonexistent/wise.yaml")).is_err());
    }
}
