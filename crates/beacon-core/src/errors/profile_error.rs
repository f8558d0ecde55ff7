use super::error_code::{self, BeaconErrorCode};

/// Transmit profile validation and parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("too many transmit profiles: {count} > {max}")]
    TooManyProfiles { count: usize, max: usize },

    #[error("profile {profile}: too many rules: {count} > {max}")]
    TooManyRules {
        profile: String,
        count: usize,
        max: usize,
    },

    #[error("profile {profile} has no rules")]
    NoRules { profile: String },

    #[error("profile {profile} rule {rule}: expected {expected} timers, got {actual}")]
    TimerCount {
        profile: String,
        rule: usize,
        expected: usize,
        actual: usize,
    },

    #[error("profile {profile} has no catch-all rule")]
    MissingCatchAll { profile: String },

    #[error("profile name must not be empty")]
    EmptyName,

    #[error("profile name {name:?} is reserved")]
    ReservedName { name: String },

    #[error("profile {name} defined more than once")]
    DuplicateName { name: String },

    #[error("failed to parse transmit profiles: {message}")]
    Parse { message: String },
}

impl BeaconErrorCode for ProfileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => error_code::PROFILE_PARSE,
            _ => error_code::PROFILE_INVALID,
        }
    }
}
