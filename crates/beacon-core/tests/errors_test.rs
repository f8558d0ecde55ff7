use beacon_core::errors::*;

#[test]
fn storage_unsupported_carries_operation() {
    let err = StorageError::Unsupported {
        operation: "store_setting".into(),
    };
    assert!(err.to_string().contains("store_setting"));
    assert_eq!(err.error_code(), error_code::STORAGE_UNSUPPORTED);
}

#[test]
fn profile_timer_count_carries_values() {
    let err = ProfileError::TimerCount {
        profile: "custom".into(),
        rule: 2,
        expected: 3,
        actual: 4,
    };
    let msg = err.to_string();
    assert!(msg.contains("custom"));
    assert!(msg.contains('3'));
    assert!(msg.contains('4'));
}

#[test]
fn beacon_error_wraps_subsystem_errors() {
    let err: BeaconError = BackoffError::InvalidConfig {
        config: "E,x".into(),
        reason: "bad number".into(),
    }
    .into();
    assert!(matches!(err, BeaconError::Backoff(_)));
    assert_eq!(err.error_code(), error_code::BACKOFF_INVALID);

    let err: BeaconError = ConfigError::FileNotFound {
        path: "/nope".into(),
    }
    .into();
    assert_eq!(err.error_code(), error_code::CONFIG_NOT_FOUND);
    assert!(err.to_string().contains("/nope"));
}

#[test]
fn profile_errors_share_invalid_code_except_parse() {
    let invalid = ProfileError::MissingCatchAll {
        profile: "p".into(),
    };
    let parse = ProfileError::Parse {
        message: "eof".into(),
    };
    assert_eq!(invalid.error_code(), error_code::PROFILE_INVALID);
    assert_eq!(parse.error_code(), error_code::PROFILE_PARSE);
}
