use serde::{Deserialize, Serialize};

use super::device_state::{DeviceState, NetworkCost, NetworkType, PowerSource};
use crate::constants::TIMER_COUNT;

/// Per-tier wait times in seconds, indexed by [`LatencyTier::timer_index`].
/// A negative value means "never auto-upload this tier".
///
/// [`LatencyTier::timer_index`]: super::LatencyTier::timer_index
pub type TimerArray = [i32; TIMER_COUNT];

/// Timer values applying to one device condition. `None` fields match anything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransmitProfileRule {
    pub net_cost: Option<NetworkCost>,
    pub power_state: Option<PowerSource>,
    /// Reserved.
    pub net_type: Option<NetworkType>,
    /// Reserved.
    pub net_speed: u32,
    pub timers: Vec<i32>,
}

impl TransmitProfileRule {
    pub fn new(
        net_cost: Option<NetworkCost>,
        power_state: Option<PowerSource>,
        timers: Vec<i32>,
    ) -> Self {
        Self {
            net_cost,
            power_state,
            net_type: None,
            net_speed: 0,
            timers,
        }
    }

    /// A fully unconstrained rule.
    pub fn catch_all(timers: Vec<i32>) -> Self {
        Self::new(None, None, timers)
    }

    pub fn is_catch_all(&self) -> bool {
        self.net_cost.is_none() && self.power_state.is_none()
    }

    pub fn matches(&self, state: &DeviceState) -> bool {
        self.net_cost.map_or(true, |c| c == state.network_cost)
            && self.power_state.map_or(true, |p| p == state.power_source)
    }

    /// Copy the timers into a fixed array. Missing entries are disabled.
    pub fn timer_array(&self) -> TimerArray {
        let mut out = [crate::constants::TIMER_DISABLED; TIMER_COUNT];
        for (slot, value) in out.iter_mut().zip(self.timers.iter()) {
            *slot = *value;
        }
        out
    }
}

/// A named, ordered list of rules. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransmitProfileRules {
    pub name: String,
    pub rules: Vec<TransmitProfileRule>,
}

impl TransmitProfileRules {
    pub fn new(name: impl Into<String>, rules: Vec<TransmitProfileRule>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }

    /// Index of the first rule matching `state`.
    pub fn select_rule(&self, state: &DeviceState) -> Option<usize> {
        self.rules.iter().position(|r| r.matches(state))
    }

    pub fn has_catch_all(&self) -> bool {
        self.rules.iter().any(TransmitProfileRule::is_catch_all)
    }
}
