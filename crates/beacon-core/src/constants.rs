/// Beacon engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of per-tier timers in a transmit profile rule.
/// Normal, CostDeferred and RealTime are timed; Max bypasses timers.
pub const TIMER_COUNT: usize = 3;

/// Maximum number of custom transmit profiles accepted in one load.
pub const MAX_TRANSMIT_PROFILES: usize = 20;

/// Maximum number of rules in a single transmit profile.
pub const MAX_TRANSMIT_RULES: usize = 16;

/// Timer value meaning "never auto-upload this tier".
pub const TIMER_DISABLED: i32 = -1;

/// Value sent on the first outbound request asking the collector for its clock delta.
pub const CLOCK_SKEW_PING_VALUE: &str = "use-collector-delta";

/// Outbound request header carrying the clock-skew value.
pub const TIME_DELTA_REQUEST_HEADER: &str = "time-delta-to-apply-millis";

/// Collector response header carrying the millisecond clock delta.
pub const TIME_DELTA_RESPONSE_HEADER: &str = "time-delta-millis";

/// Soft timeout for the clock-skew ping/response exchange.
pub const CLOCK_SKEW_TIMEOUT_SECS: u64 = 30;
