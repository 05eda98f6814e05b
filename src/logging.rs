//! Logging setup for the CLI.
//!
//! Events go to stderr through a `tracing_subscriber` fmt layer.  `RUST_LOG` overrides the
//! configured level when set.

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Level used when neither `RUST_LOG` nor the configuration names a valid one.
pub const DEFAULT_LEVEL: &str = "warn";

/// The filter for `level`, falling back to [`DEFAULT_LEVEL`] when it does not parse.
pub fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Installs the global subscriber.
///
/// Returns false if a subscriber was already installed, in which case nothing changes.
pub fn init_logging(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for(level));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_level_is_kept() {
        let fallback = filter_for(DEFAULT_LEVEL).to_string();
        assert_ne!(filter_for("debug").to_string(), fallback);
        assert_ne!(filter_for("wise_builder=trace").to_string(), fallback);
    }

    #[test]
    fn invalid_level_falls_back() {
        assert_eq!(
            filter_for("wise_builder=loud").to_string(),
            filter_for(DEFAULT_LEVEL).to_string()
        );
    }
}
