//! Configuration for the simulator

use crate::math::{RateParams, MAX_RATE_PERCENT, MIN_SHARE_RATE};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Simulator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Protocol contract addresses
    pub contracts: ContractsConfig,

    /// Rate calculation
    pub rates: RatesConfig,

    /// Query layer limits
    pub query: QueryConfig,

    /// Logging
    pub logging: LoggingConfig,
}

/// Protocol contract addresses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractsConfig {
    /// Pool token contract. When set, events from other contracts are ignored.
    pub token: Option<Address>,

    /// Treasury receiving its part of the protocol fee
    pub treasury: Address,
}

/// Rate calculation configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    /// Clamp for the absolute annualized rate (percent)
    pub max_rate_percent: u64,

    /// Minimum meaningful pre-rebase share rate (scaled by 10^27)
    pub min_share_rate: u64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            max_rate_percent: MAX_RATE_PERCENT,
            min_share_rate: MIN_SHARE_RATE,
        }
    }
}

impl RatesConfig {
    /// Parameters for the rate calculator
    pub fn params(&self) -> RateParams {
        RateParams {
            max_rate_percent: self.max_rate_percent,
            min_share_rate: self.min_share_rate,
        }
    }
}

/// Query layer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Page size when the caller gives none
    pub default_limit: usize,

    /// Largest page size served
    pub max_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 1_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive
    pub filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load defaults, then apply environment overrides
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `POOL_SIM_*` environment overrides
    pub fn apply_env(&mut self) -> crate::Result<()> {
        if let Ok(token) = std::env::var("POOL_SIM_TOKEN") {
            self.contracts.token = Some(parse_address("POOL_SIM_TOKEN", &token)?);
        }

        if let Ok(treasury) = std::env::var("POOL_SIM_TREASURY") {
            self.contracts.treasury = parse_address("POOL_SIM_TREASURY", &treasury)?;
        }

        if let Ok(filter) = std::env::var("POOL_SIM_LOG") {
            self.logging.filter = filter;
        }

        Ok(())
    }
}

fn parse_address(var: &str, value: &str) -> crate::Result<Address> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|e| crate::Error::Config(format!("{} is not an address: {}", var, e)))
}
