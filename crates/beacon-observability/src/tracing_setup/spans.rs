//! Span definitions per operation: upload round, reservation, profile load.

/// Create an upload-round span.
#[macro_export]
macro_rules! upload_round_span {
    ($tier:expr) => {
        tracing::debug_span!("beacon.upload_round", tier = %$tier)
    };
}

/// Create a record-reservation span.
#[macro_export]
macro_rules! reserve_span {
    ($min_tier:expr, $max_count:expr) => {
        tracing::trace_span!("beacon.reserve", min_tier = %$min_tier, max_count = $max_count)
    };
}

/// Create a profile-load span.
#[macro_export]
macro_rules! profile_load_span {
    ($count:expr) => {
        tracing::debug_span!("beacon.profile_load", count = $count)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const UPLOAD_ROUND: &str = "beacon.upload_round";
    pub const RESERVE: &str = "beacon.reserve";
    pub const PROFILE_LOAD: &str = "beacon.profile_load";
}
