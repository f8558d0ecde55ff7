use super::error_code::{self, BeaconErrorCode};

/// Configuration loading errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    #[error("failed to parse config {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("invalid config value for {field}: {message}")]
    ValidationFailed { field: String, message: String },
}

impl BeaconErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => error_code::CONFIG_NOT_FOUND,
            Self::ParseError { .. } => error_code::CONFIG_PARSE,
            Self::ValidationFailed { .. } => error_code::CONFIG_INVALID,
        }
    }
}
