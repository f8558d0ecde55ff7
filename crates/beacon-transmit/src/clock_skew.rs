//! One-shot exchange that learns the collector's clock delta.
//!
//! The first outbound request carries [`CLOCK_SKEW_PING_VALUE`]; the collector
//! answers with a millisecond delta in [`TIME_DELTA_RESPONSE_HEADER`]. Until
//! then the scheduler holds back further uploads. A soft timeout, sampled on
//! query, resolves the exchange with an empty delta.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use beacon_core::config::TransmitConfig;
use beacon_core::constants::{
    CLOCK_SKEW_PING_VALUE, CLOCK_SKEW_TIMEOUT_SECS, TIME_DELTA_RESPONSE_HEADER,
};
use beacon_observability::tracing_setup::events;

/// Coarse progress of the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSkewPhase {
    NotStarted,
    AwaitingDelta,
    DeltaKnown,
}

#[derive(Debug, Clone, Default)]
pub struct ClockSkewState {
    /// Last known delta in milliseconds, as sent by the collector. Empty means no skew.
    pub delta: String,
    pub ping_sent: bool,
    pub delta_received: bool,
    pub ping_send_time: Option<Instant>,
    /// One-shot flag consumed by the scheduler to restart uploads.
    pub resume_transmission: bool,
}

impl ClockSkewState {
    fn phase(&self) -> ClockSkewPhase {
        match (self.ping_sent, self.delta_received) {
            (false, _) => ClockSkewPhase::NotStarted,
            (true, false) => ClockSkewPhase::AwaitingDelta,
            (true, true) => ClockSkewPhase::DeltaKnown,
        }
    }
}

#[derive(Debug)]
pub struct ClockSkewGate {
    state: Mutex<ClockSkewState>,
    timeout: Duration,
}

impl ClockSkewGate {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: Mutex::new(ClockSkewState::default()),
            timeout,
        }
    }

    pub fn from_config(config: &TransmitConfig) -> Self {
        Self::new(Duration::from_secs(config.clock_skew_timeout_secs))
    }

    /// True before the ping is sent, or once a non-empty delta has been received.
    pub fn is_clock_skew_on(&self) -> bool {
        let state = self.sampled();
        !state.ping_sent || (state.delta_received && !state.delta.is_empty())
    }

    /// True only while awaiting the delta and before the timeout.
    pub fn is_waiting_for_clock_skew(&self) -> bool {
        self.sampled().phase() == ClockSkewPhase::AwaitingDelta
    }

    /// Value for the outbound clock-skew header.
    ///
    /// The first call starts the exchange and returns the ping value; later
    /// calls return the last known delta.
    pub fn get_delta(&self) -> String {
        let mut state = self.sampled();
        if !state.ping_sent {
            state.ping_sent = true;
            state.ping_send_time = Some(Instant::now());
            tracing::debug!("clock skew ping sent");
            return CLOCK_SKEW_PING_VALUE.to_string();
        }
        state.delta.clone()
    }

    /// Record the collector's delta and allow transmission to resume.
    pub fn set_delta(&self, value: &str) {
        let mut state = self.lock();
        resolve(&mut state, value.to_string(), false);
    }

    /// Extract the delta header (case-insensitive) from a response.
    /// An absent header means no skew.
    pub fn handle_response(&self, headers: &HashMap<String, String>) {
        let delta = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(TIME_DELTA_RESPONSE_HEADER))
            .map(|(_, value)| value.trim().to_string())
            .unwrap_or_default();
        let mut state = self.lock();
        resolve(&mut state, delta, false);
    }

    pub fn get_resume_transmission_after_clock_skew(&self) -> bool {
        self.sampled().resume_transmission
    }

    pub fn set_resume_transmission_after_clock_skew(&self, value: bool) {
        self.lock().resume_transmission = value;
    }

    /// Consume the resume flag. Returns whether it was set.
    pub fn take_resume_transmission(&self) -> bool {
        let mut state = self.sampled();
        std::mem::take(&mut state.resume_transmission)
    }

    pub fn state(&self) -> ClockSkewPhase {
        self.sampled().phase()
    }

    /// Copy of the current state, after sampling the timeout.
    pub fn snapshot(&self) -> ClockSkewState {
        self.sampled().clone()
    }

    /// Lock the state after applying the soft timeout.
    fn sampled(&self) -> MutexGuard<'_, ClockSkewState> {
        let mut state = self.lock();
        let expired = state.phase() == ClockSkewPhase::AwaitingDelta
            && state
                .ping_send_time
                .is_some_and(|sent| sent.elapsed() >= self.timeout);
        if expired {
            resolve(&mut state, String::new(), true);
        }
        state
    }

    fn lock(&self) -> MutexGuard<'_, ClockSkewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ClockSkewGate {
    fn default() -> Self {
        Self::new(Duration::from_secs(CLOCK_SKEW_TIMEOUT_SECS))
    }
}

fn resolve(state: &mut ClockSkewState, delta: String, timed_out: bool) {
    events::clock_skew_resolved(&delta, timed_out);
    state.delta = delta;
    state.delta_received = true;
    state.resume_transmission = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order() {
        let gate = ClockSkewGate::default();
        assert_eq!(gate.state(), ClockSkewPhase::NotStarted);
        gate.get_delta();
        assert_eq!(gate.state(), ClockSkewPhase::AwaitingDelta);
        gate.set_delta("12");
        assert_eq!(gate.state(), ClockSkewPhase::DeltaKnown);
    }

    #[test]
    fn take_resume_consumes_flag() {
        let gate = ClockSkewGate::default();
        gate.get_delta();
        gate.set_delta("5");
        assert!(gate.take_resume_transmission());
        assert!(!gate.take_resume_transmission());
    }
}
