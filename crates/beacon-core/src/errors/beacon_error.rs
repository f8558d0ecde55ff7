use super::error_code::BeaconErrorCode;
use super::{BackoffError, ConfigError, ProfileError, StorageError};

/// Top-level error aggregating all subsystem errors via `From` conversions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BeaconError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("backoff error: {0}")]
    Backoff(#[from] BackoffError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BeaconErrorCode for BeaconError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::Profile(e) => e.error_code(),
            Self::Backoff(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}

pub type BeaconResult<T> = Result<T, BeaconError>;
