//! Compiled default values for every config key.

// Storage
pub const DEFAULT_MAX_RETRY_COUNT: u32 = 5;

// Scheduler
pub const DEFAULT_BACKOFF_CONFIG: &str = "E,3000,300000,2,1";
pub const DEFAULT_MIN_UPLOAD_BANDWIDTH_BPS: u32 = 0;
pub const DEFAULT_BANDWIDTH_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_PENDING_UPLOADS: usize = 4;
pub const DEFAULT_RECORD_LEASE_MS: u64 = 120_000;
pub const DEFAULT_MAX_RECORDS_PER_UPLOAD: usize = 500;
pub const DEFAULT_MAX_UPLOAD_SIZE_BYTES: usize = 2 * 1024 * 1024;
pub const DEFAULT_MAX_TIER_MIN_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_CLOCK_SKEW_ENABLED: bool = true;

// Transmit
pub const DEFAULT_TRANSMIT_PROFILE: &str = "REAL_TIME";
pub const DEFAULT_CLOCK_SKEW_TIMEOUT_SECS: u64 = crate::constants::CLOCK_SKEW_TIMEOUT_SECS;
