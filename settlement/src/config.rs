//! Configuration for settlement engine

use serde::{Deserialize, Serialize};

/// Settlement engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Default `tracing` filter directive when `RUST_LOG` is unset
    pub log_filter: String,

    /// Settlement actor configuration
    pub actor: ActorConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "settlement-engine".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_filter: "info".to_string(),
            actor: ActorConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Settlement actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size (messages queued before senders wait)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Record settlement metrics
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(filter) = std::env::var("SETTLEMENT_LOG_FILTER") {
            config.log_filter = filter;
        }

        if let Ok(capacity) = std::env::var("SETTLEMENT_MAILBOX_CAPACITY") {
            config.actor.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid SETTLEMENT_MAILBOX_CAPACITY: {}", e))
            })?;
        }

        if let Ok(enabled) = std::env::var("SETTLEMENT_METRICS_ENABLED") {
            config.metrics.enabled = enabled.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid SETTLEMENT_METRICS_ENABLED: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the engine unusable
    pub fn validate(&self) -> crate::Result<()> {
        // tokio::sync::mpsc panics on a zero-capacity channel
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "actor.mailbox_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
