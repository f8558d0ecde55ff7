//! Validation applied to custom profiles before they replace the current set.

use std::collections::HashSet;

use beacon_core::constants::{MAX_TRANSMIT_PROFILES, MAX_TRANSMIT_RULES, TIMER_COUNT};
use beacon_core::errors::ProfileError;
use beacon_core::models::TransmitProfileRules;

use super::defaults;

pub(crate) fn validate_profiles(profiles: &[TransmitProfileRules]) -> Result<(), ProfileError> {
    if profiles.len() > MAX_TRANSMIT_PROFILES {
        return Err(ProfileError::TooManyProfiles {
            count: profiles.len(),
            max: MAX_TRANSMIT_PROFILES,
        });
    }

    let mut seen = HashSet::new();
    for profile in profiles {
        let name = profile.name.as_str();
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if defaults::is_built_in(name) {
            return Err(ProfileError::ReservedName {
                name: name.to_string(),
            });
        }
        if !seen.insert(name) {
            return Err(ProfileError::DuplicateName {
                name: name.to_string(),
            });
        }
        validate_rules(profile)?;
    }
    Ok(())
}

fn validate_rules(profile: &TransmitProfileRules) -> Result<(), ProfileError> {
    let count = profile.rules.len();
    if count == 0 {
        return Err(ProfileError::NoRules {
            profile: profile.name.clone(),
        });
    }
    if count > MAX_TRANSMIT_RULES {
        return Err(ProfileError::TooManyRules {
            profile: profile.name.clone(),
            count,
            max: MAX_TRANSMIT_RULES,
        });
    }
    for (i, rule) in profile.rules.iter().enumerate() {
        if rule.timers.len() != TIMER_COUNT {
            return Err(ProfileError::TimerCount {
                profile: profile.name.clone(),
                rule: i,
                expected: TIMER_COUNT,
                actual: rule.timers.len(),
            });
        }
    }
    if !profile.has_catch_all() {
        return Err(ProfileError::MissingCatchAll {
            profile: profile.name.clone(),
        });
    }
    Ok(())
}
