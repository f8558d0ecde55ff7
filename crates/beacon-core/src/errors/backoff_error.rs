use super::error_code::{self, BeaconErrorCode};

/// Retry backoff configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackoffError {
    #[error("invalid backoff config {config:?}: {reason}")]
    InvalidConfig { config: String, reason: String },
}

impl BeaconErrorCode for BackoffError {
    fn error_code(&self) -> &'static str {
        error_code::BACKOFF_INVALID
    }
}
