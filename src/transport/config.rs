//! Where the backend listens.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default backend address.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
/// Default backend port.
pub const DEFAULT_PORT: u16 = 32479;

/// Environment variable overriding the address.
pub const ADDRESS_VAR: &str = "WISE_ADDRESS";
/// Environment variable overriding the port.
pub const PORT_VAR: &str = "WISE_PORT";

/// The host and port a [`Session`](crate::Session) dials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host name or IP address.
    pub address: String,
    /// TCP port.
    pub port: u16,
}

impl ServerConfig {
    /// A config for `address:port`.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// The defaults, overridden by `WISE_ADDRESS` and `WISE_PORT` where set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(
            std::env::var(ADDRESS_VAR).ok(),
            std::env::var(PORT_VAR).ok(),
        )
    }

    /// Replaces the address and port with the non-empty values given.
    pub fn with_overrides(
        mut self,
        address: Option<String>,
        port: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(address) = address.filter(|a| !a.trim().is_empty()) {
            self.address = address.trim().to_string();
        }
        if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
            self.port = parse_port(&port)?;
        }
        Ok(self)
    }

    /// The `host:port` string to connect to.
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Parses a non-zero TCP port.
pub fn parse_port(port: &str) -> Result<u16, ConfigError> {
    match port.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidPort(port.to_string())),
        Ok(port) => Ok(port),
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS, DEFAULT_PORT)
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_address(), "127.0.0.1:32479");
    }

    #[test]
    fn overrides_skip_blank_values() {
        let config = ServerConfig::default()
            .with_overrides(Some("wise.example.org".to_string()), Some(" ".to_string()))
            .unwrap();
        assert_eq!(config, ServerConfig::new("wise.example.org", 32479));
    }

    #[test]
    fn bad_ports() {
        assert!(matches!(parse_port("0"), Err(ConfigError::InvalidPort(_))));
        assert!(matches!(parse_port("70000"), Err(ConfigError::InvalidPort(_))));
        assert!(matches!(parse_port("http"), Err(ConfigError::InvalidPort(_))));
        assert_eq!(parse_port(" 8080 ").unwrap(), 8080);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: ServerConfig = serde_yml::from_str("port: 4000\n").unwrap();
        assert_eq!(config, ServerConfig::new(DEFAULT_ADDRESS, 4000));
    }
}
