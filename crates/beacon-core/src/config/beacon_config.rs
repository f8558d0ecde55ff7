//! Top-level configuration with layered resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{SchedulerConfig, StorageConfig, TransmitConfig};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`BEACON_*`)
/// 2. Config file passed to [`BeaconConfig::load`]
/// 3. Compiled defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BeaconConfig {
    pub storage: StorageConfig,
    pub scheduler: SchedulerConfig,
    pub transmit: TransmitConfig,
}

impl BeaconConfig {
    /// Load configuration: defaults, then `path` if given, then env overrides,
    /// then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string. Missing keys take defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.max_pending_uploads == 0 {
            return Err(invalid(
                "scheduler.max_pending_uploads",
                "must be greater than 0",
            ));
        }
        if self.scheduler.max_records_per_upload == 0 {
            return Err(invalid(
                "scheduler.max_records_per_upload",
                "must be greater than 0",
            ));
        }
        if self.scheduler.max_upload_size_bytes == 0 {
            return Err(invalid(
                "scheduler.max_upload_size_bytes",
                "must be greater than 0",
            ));
        }
        if !self.scheduler.backoff_config.starts_with("E,") {
            return Err(invalid(
                "scheduler.backoff_config",
                "must have the form E,<initial_ms>,<max_ms>,<multiplier>,<jitter>",
            ));
        }
        if self.transmit.profile.trim().is_empty() {
            return Err(invalid("transmit.profile", "must not be empty"));
        }
        if self.transmit.clock_skew_timeout_secs == 0 {
            return Err(invalid(
                "transmit.clock_skew_timeout_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides.
    /// Pattern: `BEACON_SCHEDULER_MAX_PENDING_UPLOADS`, `BEACON_TRANSMIT_PROFILE`, etc.
    /// Unparsable values are ignored.
    fn apply_env_overrides(&mut self) {
        env_parse("BEACON_STORAGE_MAX_RETRY_COUNT", &mut self.storage.max_retry_count);

        if let Ok(val) = std::env::var("BEACON_SCHEDULER_BACKOFF_CONFIG") {
            self.scheduler.backoff_config = val;
        }
        env_parse(
            "BEACON_SCHEDULER_MIN_UPLOAD_BANDWIDTH_BPS",
            &mut self.scheduler.min_upload_bandwidth_bps,
        );
        env_parse(
            "BEACON_SCHEDULER_BANDWIDTH_RETRY_DELAY_MS",
            &mut self.scheduler.bandwidth_retry_delay_ms,
        );
        env_parse(
            "BEACON_SCHEDULER_MAX_PENDING_UPLOADS",
            &mut self.scheduler.max_pending_uploads,
        );
        env_parse(
            "BEACON_SCHEDULER_RECORD_LEASE_MS",
            &mut self.scheduler.record_lease_ms,
        );
        env_parse(
            "BEACON_SCHEDULER_MAX_RECORDS_PER_UPLOAD",
            &mut self.scheduler.max_records_per_upload,
        );
        env_parse(
            "BEACON_SCHEDULER_MAX_UPLOAD_SIZE_BYTES",
            &mut self.scheduler.max_upload_size_bytes,
        );
        env_parse(
            "BEACON_SCHEDULER_MAX_TIER_MIN_INTERVAL_MS",
            &mut self.scheduler.max_tier_min_interval_ms,
        );
        env_parse(
            "BEACON_SCHEDULER_CLOCK_SKEW_ENABLED",
            &mut self.scheduler.clock_skew_enabled,
        );

        if let Ok(val) = std::env::var("BEACON_TRANSMIT_PROFILE") {
            self.transmit.profile = val;
        }
        env_parse(
            "BEACON_TRANSMIT_CLOCK_SKEW_TIMEOUT_SECS",
            &mut self.transmit.clock_skew_timeout_secs,
        );
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(val) = std::env::var(key) {
        if let Ok(v) = val.parse::<T>() {
            *target = v;
        }
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}
