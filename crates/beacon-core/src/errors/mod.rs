//! Error handling for Beacon.
//! One error enum per subsystem, `thiserror` only, aggregated by [`BeaconError`].

pub mod backoff_error;
pub mod beacon_error;
pub mod config_error;
pub mod error_code;
pub mod profile_error;
pub mod storage_error;

pub use backoff_error::BackoffError;
pub use beacon_error::{BeaconError, BeaconResult};
pub use config_error::ConfigError;
pub use error_code::BeaconErrorCode;
pub use profile_error::ProfileError;
pub use storage_error::StorageError;
