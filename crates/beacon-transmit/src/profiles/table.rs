//! Holds the active profile and the last device state, plus the
//! timer array selected from them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use beacon_core::config::TransmitConfig;
use beacon_core::constants::{TIMER_COUNT, TIMER_DISABLED};
use beacon_core::errors::ProfileError;
use beacon_core::models::{
    DeviceState, NetworkCost, PowerSource, TimerArray, TransmitProfileRules,
};
use beacon_observability::tracing_setup::events;

use super::defaults::{self, DEFAULT_PROFILE};
use super::parse::parse_profiles;
use super::validate::validate_profiles;
use super::TransmitProfile;

#[derive(Debug)]
struct TableState {
    profiles: BTreeMap<String, TransmitProfileRules>,
    active: String,
    device: DeviceState,
    current_rule: usize,
    timers: TimerArray,
}

/// Internally synchronized profile table.
///
/// Device-state notifications may arrive on any thread while the scheduler
/// reads timers.
#[derive(Debug)]
pub struct TransmitProfileTable {
    state: RwLock<TableState>,
    timer_updated: AtomicBool,
}

impl TransmitProfileTable {
    /// Table holding only the built-in profiles, with `REAL_TIME` active.
    pub fn new() -> Self {
        let mut state = TableState {
            profiles: BTreeMap::new(),
            active: DEFAULT_PROFILE.to_string(),
            device: DeviceState::default(),
            current_rule: 0,
            timers: [TIMER_DISABLED; TIMER_COUNT],
        };
        install_built_ins(&mut state);
        select_rule(&mut state);
        Self {
            state: RwLock::new(state),
            timer_updated: AtomicBool::new(true),
        }
    }

    /// Table for `config`: custom profiles from `profiles_json` are loaded
    /// first, then `profile` is selected. Either step failing is logged and
    /// leaves the built-in state in place.
    pub fn from_config(config: &TransmitConfig) -> Self {
        let table = Self::new();
        if let Some(json) = config.profiles_json.as_deref() {
            table.load_json(json);
        }
        table.set_profile(&config.profile);
        table
    }

    /// Replace all custom profiles with `profiles`.
    ///
    /// On any validation failure nothing changes and false is returned.
    pub fn load(&self, profiles: Vec<TransmitProfileRules>) -> bool {
        let _span = beacon_observability::profile_load_span!(profiles.len()).entered();
        match self.try_load(profiles) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting transmit profiles");
                false
            }
        }
    }

    /// Parse a JSON profile document and load it.
    pub fn load_json(&self, json: &str) -> bool {
        match parse_profiles(json) {
            Ok(profiles) => self.load(profiles),
            Err(e) => {
                tracing::warn!(error = %e, "rejecting transmit profile document");
                false
            }
        }
    }

    fn try_load(&self, profiles: Vec<TransmitProfileRules>) -> Result<(), ProfileError> {
        validate_profiles(&profiles)?;

        let mut state = self.write();
        remove_custom_profiles(&mut state);
        for profile in profiles {
            state.profiles.insert(profile.name.clone(), profile);
        }
        if !state.profiles.contains_key(&state.active) {
            let previous = std::mem::replace(&mut state.active, DEFAULT_PROFILE.to_string());
            events::profile_switched(&previous, DEFAULT_PROFILE);
        }
        tracing::debug!(
            profiles = ?state.profiles.keys().collect::<Vec<_>>(),
            active = %state.active,
            "transmit profiles loaded"
        );
        self.refresh(&mut state);
        Ok(())
    }

    /// Switch the active profile. Unknown names leave the table unchanged.
    pub fn set_profile(&self, name: &str) -> bool {
        let mut state = self.write();
        if !state.profiles.contains_key(name) {
            tracing::warn!(profile = name, active = %state.active, "transmit profile not found");
            return false;
        }
        if state.active != name {
            events::profile_switched(&state.active, name);
            state.active = name.to_string();
        }
        self.refresh(&mut state);
        true
    }

    pub fn set_default_profile(&self, profile: TransmitProfile) -> bool {
        self.set_profile(profile.name())
    }

    /// Record the device state and reselect the rule of the active profile.
    /// Returns whether a rule matched.
    pub fn update_states(&self, network_cost: NetworkCost, power_source: PowerSource) -> bool {
        let mut state = self.write();
        state.device = DeviceState::new(network_cost, power_source);
        self.refresh(&mut state)
    }

    /// Per-tier wait times in seconds. Negative means never auto-upload.
    pub fn get_timers(&self) -> TimerArray {
        self.read().timers
    }

    pub fn get_profile(&self) -> String {
        self.read().active.clone()
    }

    pub fn get_device_state(&self) -> DeviceState {
        self.read().device
    }

    /// Names of every loaded profile, built-ins included.
    pub fn profile_names(&self) -> Vec<String> {
        self.read().profiles.keys().cloned().collect()
    }

    /// True once after the timer array changed; reading consumes the flag.
    pub fn is_timer_update_required(&self) -> bool {
        self.timer_updated.swap(false, Ordering::AcqRel)
    }

    /// Restore the built-in profiles and forget custom ones.
    pub fn reset(&self) {
        let mut state = self.write();
        remove_custom_profiles(&mut state);
        install_built_ins(&mut state);
        if !state.profiles.contains_key(&state.active) {
            let previous = std::mem::replace(&mut state.active, DEFAULT_PROFILE.to_string());
            events::profile_switched(&previous, DEFAULT_PROFILE);
        }
        self.refresh(&mut state);
    }

    /// Reselect the rule and raise the update flag if the timers changed.
    fn refresh(&self, state: &mut TableState) -> bool {
        let previous = state.timers;
        let matched = select_rule(state);
        if state.timers != previous {
            tracing::info!(
                profile = %state.active,
                rule = state.current_rule,
                timers = ?state.timers,
                "transmit timers updated"
            );
            self.timer_updated.store(true, Ordering::Release);
        }
        matched
    }

    fn read(&self) -> RwLockReadGuard<'_, TableState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TableState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TransmitProfileTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip everything but the built-ins. Caller holds the write lock.
fn remove_custom_profiles(state: &mut TableState) {
    state.profiles.retain(|name, _| defaults::is_built_in(name));
}

fn install_built_ins(state: &mut TableState) {
    for profile in defaults::built_in_profiles() {
        state.profiles.insert(profile.name.clone(), profile);
    }
}

/// First matching rule of the active profile wins. Without a match the first
/// (most restrictive) rule is used. Returns whether a rule matched.
fn select_rule(state: &mut TableState) -> bool {
    let Some(profile) = state.profiles.get(&state.active) else {
        state.current_rule = 0;
        state.timers = [TIMER_DISABLED; TIMER_COUNT];
        return false;
    };
    let (index, matched) = match profile.select_rule(&state.device) {
        Some(i) => (i, true),
        None => (0, false),
    };
    state.current_rule = index;
    state.timers = profile
        .rules
        .get(index)
        .map(|r| r.timer_array())
        .unwrap_or([TIMER_DISABLED; TIMER_COUNT]);
    matched
}
