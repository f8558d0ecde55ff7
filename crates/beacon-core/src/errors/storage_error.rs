use super::error_code::{self, BeaconErrorCode};

/// Record-store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("operation not supported by this store: {operation}")]
    Unsupported { operation: String },

    #[error("invalid record {record_id}: {reason}")]
    InvalidRecord { record_id: String, reason: String },

    #[error("invalid delete filter: {reason}")]
    InvalidFilter { reason: String },
}

impl BeaconErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unsupported { .. } => error_code::STORAGE_UNSUPPORTED,
            Self::InvalidRecord { .. } => error_code::STORAGE_INVALID_RECORD,
            Self::InvalidFilter { .. } => error_code::STORAGE_INVALID_FILTER,
        }
    }
}
