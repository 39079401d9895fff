//! `PosIndex` Configuration Module
//!
//! Provides configuration file support via `posindex.toml`, environment variables,
//! and programmatic construction.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`POSINDEX_*`, sections separated by `__`)
//! 2. Configuration file (`posindex.toml`)
//! 3. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Number of tombstones that triggers a batch purge.
pub const TOMBSTONE_CLEANUP_THRESHOLD: usize = 1000;

/// Result size from which locators are radix sorted instead of comparison sorted.
pub const RADIX_SORT_THRESHOLD: usize = 5000;

/// Result size from which locator collection fans out across workers.
pub const PARALLEL_COLLECT_THRESHOLD: usize = 10_000;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Write-path configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Tombstone count at which deleted slots are purged and recycled.
    pub tombstone_cleanup_threshold: usize,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            tombstone_cleanup_threshold: TOMBSTONE_CLEANUP_THRESHOLD,
        }
    }
}

/// Result materialization configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializeConfig {
    /// Results at or above this size are radix sorted.
    pub sort_threshold: usize,
    /// Results at or above this size are collected by several workers.
    pub parallel_threshold: usize,
    /// Upper bound on collection workers.
    pub max_workers: usize,
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            sort_threshold: RADIX_SORT_THRESHOLD,
            parallel_threshold: PARALLEL_COLLECT_THRESHOLD,
            max_workers: 4,
        }
    }
}

/// Multi-column planner configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Evaluate predicates most-selective first. When false, caller order is kept.
    pub reorder_predicates: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            reorder_predicates: true,
        }
    }
}

/// Logging configuration section.
///
/// The library only emits `tracing` events; hosts install the subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `PosIndex` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IndexConfig {
    /// Maintenance configuration.
    pub maintenance: MaintenanceConfig,
    /// Materialization configuration.
    pub materialize: MaterializeConfig,
    /// Planner configuration.
    pub planner: PlannerConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl IndexConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("posindex.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error: defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("POSINDEX_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maintenance.tombstone_cleanup_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                key: "maintenance.tombstone_cleanup_threshold".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        if self.materialize.sort_threshold < 2 {
            return Err(ConfigError::InvalidValue {
                key: "materialize.sort_threshold".to_string(),
                message: format!(
                    "value {} must be >= 2",
                    self.materialize.sort_threshold
                ),
            });
        }

        if !(1..=256).contains(&self.materialize.max_workers) {
            return Err(ConfigError::InvalidValue {
                key: "materialize.max_workers".to_string(),
                message: format!(
                    "value {} is out of range [1, 256]",
                    self.materialize.max_workers
                ),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
