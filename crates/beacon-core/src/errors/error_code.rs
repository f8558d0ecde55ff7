//! Stable, machine-readable error codes.

pub const STORAGE_UNSUPPORTED: &str = "STORAGE_UNSUPPORTED";
pub const STORAGE_INVALID_RECORD: &str = "STORAGE_INVALID_RECORD";
pub const STORAGE_INVALID_FILTER: &str = "STORAGE_INVALID_FILTER";
pub const PROFILE_INVALID: &str = "PROFILE_INVALID";
pub const PROFILE_PARSE: &str = "PROFILE_PARSE";
pub const BACKOFF_INVALID: &str = "BACKOFF_INVALID";
pub const CONFIG_NOT_FOUND: &str = "CONFIG_NOT_FOUND";
pub const CONFIG_PARSE: &str = "CONFIG_PARSE";
pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

/// Maps an error to a stable code suitable for host-side diagnostics.
pub trait BeaconErrorCode {
    fn error_code(&self) -> &'static str;
}
