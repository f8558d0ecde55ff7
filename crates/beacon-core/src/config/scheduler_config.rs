use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Upload scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Backoff policy string, `"E,<initial_ms>,<max_ms>,<multiplier>,<jitter>"`.
    pub backoff_config: String,
    /// Uploads are postponed while proposed bandwidth is below this. 0 disables the check.
    pub min_upload_bandwidth_bps: u32,
    pub bandwidth_retry_delay_ms: u64,
    /// No new rounds are scheduled while this many uploads are in flight.
    pub max_pending_uploads: usize,
    /// Lease granted to reserved records. 0 removes records on read.
    pub record_lease_ms: u64,
    pub max_records_per_upload: usize,
    pub max_upload_size_bytes: usize,
    /// Minimum spacing between two Max-tier bypass uploads.
    pub max_tier_min_interval_ms: u64,
    pub clock_skew_enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            backoff_config: defaults::DEFAULT_BACKOFF_CONFIG.to_string(),
            min_upload_bandwidth_bps: defaults::DEFAULT_MIN_UPLOAD_BANDWIDTH_BPS,
            bandwidth_retry_delay_ms: defaults::DEFAULT_BANDWIDTH_RETRY_DELAY_MS,
            max_pending_uploads: defaults::DEFAULT_MAX_PENDING_UPLOADS,
            record_lease_ms: defaults::DEFAULT_RECORD_LEASE_MS,
            max_records_per_upload: defaults::DEFAULT_MAX_RECORDS_PER_UPLOAD,
            max_upload_size_bytes: defaults::DEFAULT_MAX_UPLOAD_SIZE_BYTES,
            max_tier_min_interval_ms: defaults::DEFAULT_MAX_TIER_MIN_INTERVAL_MS,
            clock_skew_enabled: defaults::DEFAULT_CLOCK_SKEW_ENABLED,
        }
    }
}

impl SchedulerConfig {
    pub fn bandwidth_retry_delay(&self) -> Duration {
        Duration::from_millis(self.bandwidth_retry_delay_ms)
    }

    pub fn max_tier_min_interval(&self) -> Duration {
        Duration::from_millis(self.max_tier_min_interval_ms)
    }
}
