//! Operator configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Event publishing configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsConfig {
    /// Controller name events are reported under
    #[serde(default = "default_reporter")]
    pub reporter: String,
    /// Controller instance (typically the pod name)
    #[serde(default)]
    pub instance: Option<String>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            reporter: default_reporter(),
            instance: None,
        }
    }
}

fn default_reporter() -> String {
    "alb-ingress-controller".to_string()
}

/// Remote lookup cache configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// How long a subnet to VPC mapping is cached (seconds)
    #[serde(default = "default_vpc_ttl")]
    pub vpc_ttl_seconds: u64,
    /// Upper bound on cached lookups
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl CacheConfig {
    pub fn vpc_ttl(&self) -> Duration {
        Duration::from_secs(self.vpc_ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            vpc_ttl_seconds: default_vpc_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_vpc_ttl() -> u64 {
    3600 // 60 minutes
}

fn default_max_entries() -> u64 {
    crate::cache::DEFAULT_MAX_ENTRIES
}

/// Operator configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl OperatorConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: OperatorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.events.reporter.is_empty() {
            return Err(ConfigError::Invalid("events.reporter must not be empty".to_string()));
        }
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "cache.maxEntries must be greater than zero".to_string(),
            ));
        }
        if self.cache.vpc_ttl_seconds == 0 {
            return Err(ConfigError::Invalid(
                "cache.vpcTtlSeconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
