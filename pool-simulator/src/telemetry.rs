//! Tracing setup

use crate::{config::LoggingConfig, Error, Result};
use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber
///
/// `RUST_LOG` wins over the configured filter when set. Returns an error if
/// the filter does not parse; a subscriber that is already installed is left
/// in place.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| Error::Config(format!("Invalid log filter '{}': {}", config.filter, e)))?,
    };

    let installed = if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
    };

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init_tracing(&config).unwrap();
        init_tracing(&config).unwrap();
    }

    #[test]
    fn test_rejects_bad_filter() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            filter: "pool_simulator=notalevel[".to_string(),
            json: false,
        };
        assert!(init_tracing(&config).is_err());
    }
}
