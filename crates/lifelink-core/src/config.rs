//! Matching configuration.
//!
//! Every field has a default, so a config file only needs the values it changes:
//!
//! ```json
//! { "default_radius_km": 25, "timeout_ms": 2000 }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matcher::DEFAULT_RESULT_LIMIT;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,lifelink_core=debug"
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tunables for a match request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Radius used when the caller supplies none
    pub default_radius_km: f64,
    /// Hard ceiling on the search radius
    pub max_radius_km: f64,
    /// Maximum number of ranked results
    pub result_limit: usize,
    /// Budget for the whole match, store reads included
    pub timeout_ms: u64,
    /// Donor history reads allowed in flight at once
    pub max_concurrent_reads: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            default_radius_km: 50.0,
            max_radius_km: 200.0,
            result_limit: DEFAULT_RESULT_LIMIT,
            timeout_ms: 5_000,
            max_concurrent_reads: 16,
        }
    }
}

impl MatchConfig {
    /// Load and validate a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_radius_km.is_finite() && self.max_radius_km > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_radius_km must be positive, got {}",
                self.max_radius_km
            )));
        }
        if !(self.default_radius_km.is_finite() && self.default_radius_km > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "default_radius_km must be positive, got {}",
                self.default_radius_km
            )));
        }
        if self.default_radius_km > self.max_radius_km {
            return Err(ConfigError::Invalid(format!(
                "default_radius_km ({}) exceeds max_radius_km ({})",
                self.default_radius_km, self.max_radius_km
            )));
        }
        if self.result_limit == 0 {
            return Err(ConfigError::Invalid("result_limit must be at least 1".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be at least 1".into()));
        }
        if self.max_concurrent_reads == 0 {
            return Err(ConfigError::Invalid("max_concurrent_reads must be at least 1".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
