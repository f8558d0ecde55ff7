use serde::{Deserialize, Serialize};

use super::defaults;

/// Transmit profile and clock-skew configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmitConfig {
    /// Profile selected at startup.
    pub profile: String,
    pub clock_skew_timeout_secs: u64,
    /// Optional JSON document with custom profiles, loaded on top of the built-ins.
    pub profiles_json: Option<String>,
}

impl Default for TransmitConfig {
    fn default() -> Self {
        Self {
            profile: defaults::DEFAULT_TRANSMIT_PROFILE.to_string(),
            clock_skew_timeout_secs: defaults::DEFAULT_CLOCK_SKEW_TIMEOUT_SECS,
            profiles_json: None,
        }
    }
}
