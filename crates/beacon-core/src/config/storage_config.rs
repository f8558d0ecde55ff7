use serde::{Deserialize, Serialize};

use super::defaults;

/// Record store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Releases that push a record's retry count past this drop it.
    pub max_retry_count: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_retry_count: defaults::DEFAULT_MAX_RETRY_COUNT,
        }
    }
}
