//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{BinlockError, Result};
use chrono::Duration;
use std::path::Path;

impl Config {
    /// Load config from a YAML file.
    ///
    /// A missing file yields the defaults; any other read failure, parse
    /// error, or invalid value is reported.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            BinlockError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| BinlockError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            BinlockError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `lease_minutes` must be positive
    /// - `store_mutex_stale_seconds` must be positive
    /// - `admins` entries must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.lease_minutes == 0 {
            return Err(BinlockError::UserError(
                "config validation failed: lease_minutes must be greater than 0".to_string(),
            ));
        }

        if self.store_mutex_stale_seconds == 0 {
            return Err(BinlockError::UserError(
                "config validation failed: store_mutex_stale_seconds must be greater than 0"
                    .to_string(),
            ));
        }

        if self.admins.iter().any(|a| a.trim().is_empty()) {
            return Err(BinlockError::UserError(
                "config validation failed: admins entries must be non-empty".to_string(),
            ));
        }

        Ok(())
    }

    /// The lease duration as a chrono duration.
    pub fn lease_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.lease_minutes))
    }

    /// Age after which a leftover store mutex may be broken.
    pub fn store_mutex_stale_after(&self) -> Duration {
        Duration::seconds(i64::from(self.store_mutex_stale_seconds))
    }

    /// How long to wait for the store mutex.
    pub fn store_mutex_wait(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.store_mutex_wait_ms)
    }

    /// Whether `user` may force-release locks held by others.
    pub fn is_admin(&self, user: &str) -> bool {
        self.admins.iter().any(|a| a == user)
    }
}
