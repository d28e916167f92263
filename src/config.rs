//! Range cache configuration.
//!
//! Loadable from defaults, an optional `lorc.toml` file, and `LORC_*`
//! environment variables, in that priority order — the same
//! defaults-then-file-then-env layering the teacher's own configuration
//! module builds via `figment`. spec.md scopes out a CLI and a persisted
//! *cache*; it says nothing against a config file for the library's own
//! tunables, which this ambient layer provides regardless.

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::physical_range::Layout;

/// Errors produced while loading or validating a [`RangeCacheConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `figment` failed to parse or merge a configuration source.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A loaded value failed validation.
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// The offending configuration key.
        key: String,
        /// Why the value is invalid.
        message: String,
    },
}

/// Serializable mirror of [`Layout`] for config deserialization.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutConfig {
    /// Parallel owned-string containers.
    #[default]
    Vector,
    /// Monolithic byte buffers.
    Continuous,
}

impl From<LayoutConfig> for Layout {
    fn from(value: LayoutConfig) -> Self {
        match value {
            LayoutConfig::Vector => Self::Vector,
            LayoutConfig::Continuous => Self::Continuous,
        }
    }
}

/// Tunables for a [`crate::cache::RangeCache`] instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeCacheConfig {
    /// Total bytes the cache may hold before evicting; `0` disables
    /// capacity-triggered eviction entirely.
    pub capacity_bytes: usize,
    /// Physical-range layout newly materialized ranges use.
    pub layout: LayoutConfig,
    /// Minimum `tracing` level the cache emits at.
    pub logger_level: String,
    /// Whether large evicted ranges are dropped on a background thread.
    pub background_release: bool,
}

impl Default for RangeCacheConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: 256 * 1024 * 1024,
            layout: LayoutConfig::Vector,
            logger_level: "info".to_string(),
            background_release: true,
        }
    }
}

impl RangeCacheConfig {
    /// Loads configuration layering defaults, `lorc.toml` (if present) and
    /// `LORC_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] if any source fails to parse.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("lorc.toml")
    }

    /// Loads configuration from a specific file path, still layered under
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] if any source fails to parse.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("LORC_").split("_").lowercase(false));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Builds configuration from an in-memory TOML string, still layered
    /// under defaults. Used by tests that want to avoid a filesystem fixture.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] if `toml_str` fails to parse.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates field ranges not expressible in the type system alone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `logger_level` is not a
    /// recognized `tracing` level filter name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.logger_level.to_ascii_lowercase();
        if !["off", "error", "warn", "info", "debug", "trace"].contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logger_level".to_string(),
                message: format!("'{}' is not a recognized tracing level", self.logger_level),
            });
        }
        Ok(())
    }

    /// The configured level parsed into a [`tracing::level_filters::LevelFilter`].
    #[must_use]
    pub fn level_filter(&self) -> tracing::level_filters::LevelFilter {
        self.logger_level
            .parse()
            .unwrap_or(tracing::level_filters::LevelFilter::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RangeCacheConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_toml_overrides_defaults() {
        let config = RangeCacheConfig::from_toml("capacity_bytes = 1024\nlayout = \"continuous\"").unwrap();
        assert_eq!(config.capacity_bytes, 1024);
        assert_eq!(config.layout, LayoutConfig::Continuous);
    }

    #[test]
    fn invalid_logger_level_fails_validation() {
        let mut config = RangeCacheConfig::default();
        config.logger_level = "not-a-level".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
