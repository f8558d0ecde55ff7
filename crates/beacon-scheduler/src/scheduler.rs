//! Upload policy: turns record arrivals, timer firings, and upload
//! outcomes into upload rounds.
//!
//! All mutable state sits behind one mutex. It is never held while calling
//! the transport, observers, or the record store. Timer tasks hold a weak
//! reference and carry a sequence number; a firing whose number no longer
//! matches the armed timer is stale and ignored.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use uuid::Uuid;

use beacon_core::config::SchedulerConfig;
use beacon_core::errors::BackoffError;
use beacon_core::models::{
    EventsUploadContext, LatencyTier, NetworkCost, PowerSource, TimerArray, UploadOutcome,
};
use beacon_core::traits::{RecordStorage, UploadObserver, UploadTransport};
use beacon_observability::tracing_setup::events;
use beacon_transmit::{BandwidthAdmission, ClockSkewGate, ConfiguredBackoff, TransmitProfileTable};

use crate::dispatcher::{TaskDispatcher, TaskHandle};

/// Everything the scheduler talks to. Supplied by the host.
pub struct Collaborators {
    pub storage: Arc<dyn RecordStorage>,
    pub profiles: Arc<TransmitProfileTable>,
    pub clock_skew: Arc<ClockSkewGate>,
    pub bandwidth: BandwidthAdmission,
    pub dispatcher: Arc<dyn TaskDispatcher>,
    pub transport: Arc<dyn UploadTransport>,
    pub observers: Vec<Arc<dyn UploadObserver>>,
}

#[derive(Debug, Clone, Copy)]
struct ArmedTimer {
    seq: u64,
    handle: TaskHandle,
    due: Instant,
    tier: LatencyTier,
}

#[derive(Debug, Clone, Copy)]
struct ActiveUpload {
    tier: LatencyTier,
    /// Max-tier uploads started outside the timer cycle.
    bypass: bool,
}

struct SchedulerState {
    running: bool,
    paused: bool,
    /// A stop or finish request is waiting for the active set to drain.
    finish_pending: bool,
    timer: Option<ArmedTimer>,
    next_seq: u64,
    timers: TimerArray,
    running_latency: LatencyTier,
    active: HashMap<Uuid, ActiveUpload>,
    backoff: ConfiguredBackoff,
    backoff_config: String,
    last_max_bypass: Option<Instant>,
}

impl SchedulerState {
    fn round_in_flight(&self) -> bool {
        self.active.values().any(|u| !u.bypass)
    }
}

struct Inner {
    config: SchedulerConfig,
    storage: Arc<dyn RecordStorage>,
    profiles: Arc<TransmitProfileTable>,
    clock_skew: Arc<ClockSkewGate>,
    bandwidth: BandwidthAdmission,
    dispatcher: Arc<dyn TaskDispatcher>,
    transport: Arc<dyn UploadTransport>,
    observers: Vec<Arc<dyn UploadObserver>>,
    state: Mutex<SchedulerState>,
}

/// Upload orchestrator. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct UploadScheduler {
    inner: Arc<Inner>,
}

impl UploadScheduler {
    /// Build a stopped scheduler. Fails if the backoff config is invalid.
    pub fn new(config: SchedulerConfig, collaborators: Collaborators) -> Result<Self, BackoffError> {
        let backoff = ConfiguredBackoff::new(&config.backoff_config)?;
        let timers = collaborators.profiles.get_timers();
        let state = SchedulerState {
            running: false,
            paused: false,
            finish_pending: false,
            timer: None,
            next_seq: 0,
            timers,
            running_latency: LatencyTier::Normal,
            active: HashMap::new(),
            backoff_config: config.backoff_config.clone(),
            backoff,
            last_max_bypass: None,
        };
        let Collaborators {
            storage,
            profiles,
            clock_skew,
            bandwidth,
            dispatcher,
            transport,
            observers,
        } = collaborators;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                storage,
                profiles,
                clock_skew,
                bandwidth,
                dispatcher,
                transport,
                observers,
                state: Mutex::new(state),
            }),
        })
    }

    // ---- Lifecycle ----

    /// Begin scheduling. Clears a previous stop and arms a Normal round now.
    pub fn start(&self) {
        {
            let mut state = self.inner.lock();
            state.running = true;
            state.paused = false;
            state.finish_pending = false;
        }
        tracing::info!("upload scheduler started");
        self.inner.schedule_upload(0, LatencyTier::Normal, false);
    }

    /// Cancel the pending timer and block further rounds. Observers hear
    /// `on_all_uploads_finished` once the in-flight uploads drain.
    pub fn stop(&self) {
        let fire_now = {
            let mut state = self.inner.lock();
            state.running = false;
            self.inner.disarm(&mut state);
            request_finish(&mut state)
        };
        tracing::info!(fire_now, "upload scheduler stopped");
        if fire_now {
            self.inner.emit(|o| o.on_all_uploads_finished());
        }
    }

    /// Stop starting rounds. The armed timer is kept.
    pub fn pause(&self) {
        self.inner.lock().paused = true;
        tracing::info!("upload scheduler paused");
    }

    /// Resume after [`pause`](Self::pause). Arms a round if none is pending.
    pub fn resume(&self) {
        let reschedule = {
            let mut state = self.inner.lock();
            state.paused = false;
            state.running && state.timer.is_none()
        };
        tracing::info!(reschedule, "upload scheduler resumed");
        if reschedule {
            self.inner.schedule_upload(0, LatencyTier::Normal, false);
        }
    }

    /// Pause, then notify observers once nothing is in flight.
    pub fn finish_all_uploads(&self) {
        let fire_now = {
            let mut state = self.inner.lock();
            state.paused = true;
            request_finish(&mut state)
        };
        if fire_now {
            self.inner.emit(|o| o.on_all_uploads_finished());
        }
    }

    // ---- Inputs ----

    /// A record of `tier` was staged.
    pub fn event_arrived(&self, tier: LatencyTier) {
        self.inner.event_arrived(tier);
    }

    /// Arm a round after `delay_ms`. Negative delays are suppressed.
    pub fn schedule_upload(&self, delay_ms: i64, tier: LatencyTier, force: bool) {
        self.inner.schedule_upload(delay_ms, tier, force);
    }

    /// Run a round now, as if the timer fired.
    pub fn upload_async(&self, tier: LatencyTier) {
        self.inner.upload_async(None, tier);
    }

    pub fn on_device_state_changed(&self, network_cost: NetworkCost, power_source: PowerSource) {
        self.inner.profiles.update_states(network_cost, power_source);
    }

    pub fn set_transmit_profile(&self, name: &str) -> bool {
        self.inner.profiles.set_profile(name)
    }

    /// Replace the backoff policy string. Applied before the next backoff step.
    pub fn set_backoff_config(&self, config: &str) {
        self.inner.lock().backoff_config = config.to_string();
    }

    // ---- Terminal callbacks ----

    pub fn nothing_to_upload(&self, ctx: &EventsUploadContext) {
        self.inner.finish_upload(ctx, UploadOutcome::NothingToUpload);
    }

    pub fn packaging_failed(&self, ctx: &EventsUploadContext) {
        self.inner.finish_upload(ctx, UploadOutcome::PackagingFailed);
    }

    pub fn events_upload_successful(&self, ctx: &EventsUploadContext) {
        self.inner.finish_upload(ctx, UploadOutcome::Succeeded);
    }

    pub fn events_upload_rejected(&self, ctx: &EventsUploadContext) {
        self.inner.finish_upload(ctx, UploadOutcome::Rejected);
    }

    pub fn events_upload_failed(&self, ctx: &EventsUploadContext) {
        self.inner.finish_upload(ctx, UploadOutcome::Failed);
    }

    pub fn events_upload_aborted(&self, ctx: &EventsUploadContext) {
        self.inner.finish_upload(ctx, UploadOutcome::Aborted);
    }

    // ---- Queries ----

    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// True while a timer is armed or any upload awaits its terminal callback.
    pub fn is_upload_in_progress(&self) -> bool {
        let state = self.inner.lock();
        state.timer.is_some() || !state.active.is_empty()
    }

    pub fn active_upload_count(&self) -> usize {
        self.inner.lock().active.len()
    }

    /// Tier of the most recent round.
    pub fn running_latency(&self) -> LatencyTier {
        self.inner.lock().running_latency
    }
}

impl std::fmt::Debug for UploadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("UploadScheduler")
            .field("running", &state.running)
            .field("paused", &state.paused)
            .field("active", &state.active.len())
            .field("timer_armed", &state.timer.is_some())
            .finish()
    }
}

/// Mark a finish request. Returns true when it can be honoured immediately.
fn request_finish(state: &mut SchedulerState) -> bool {
    if state.active.is_empty() {
        state.finish_pending = false;
        true
    } else {
        state.finish_pending = true;
        false
    }
}

/// Lower the armed round's tier to cover `tier`. Returns the tier to re-arm
/// with when this record is due sooner than the armed timer.
fn merge_into_armed(state: &mut SchedulerState, delay_ms: i64, tier: LatencyTier) -> Option<LatencyTier> {
    let timer = state.timer.as_mut()?;
    if timer.tier > tier {
        timer.tier = tier;
    }
    (Instant::now() + ms(delay_ms) < timer.due).then_some(timer.tier)
}

fn seconds_to_ms(seconds: i32) -> i64 {
    i64::from(seconds) * 1000
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pull fresh timers if the profile table changed them.
    fn refresh_timers(&self, state: &mut SchedulerState) -> bool {
        if !self.profiles.is_timer_update_required() {
            return false;
        }
        state.timers = self.profiles.get_timers();
        tracing::debug!(timers = ?state.timers, "scheduler timers refreshed");
        true
    }

    /// Normal when the Normal and RealTime timers match, RealTime when Normal
    /// is disabled, otherwise alternate with the previous round.
    fn calculate_new_priority(&self, state: &mut SchedulerState) -> LatencyTier {
        self.refresh_timers(state);
        if state.timers[0] == state.timers[2] {
            LatencyTier::Normal
        } else if state.timers[0] < 0 {
            LatencyTier::RealTime
        } else if state.running_latency == LatencyTier::RealTime {
            LatencyTier::Normal
        } else {
            LatencyTier::RealTime
        }
    }

    fn disarm(&self, state: &mut SchedulerState) {
        if let Some(timer) = state.timer.take() {
            if !self.dispatcher.cancel(timer.handle) {
                tracing::trace!(seq = timer.seq, "armed timer already fired");
            }
        }
    }

    fn event_arrived(self: &Arc<Self>, tier: LatencyTier) {
        if tier == LatencyTier::Off {
            return;
        }
        if tier == LatencyTier::Max {
            self.max_bypass();
            return;
        }

        let (delay_ms, tier, force) = {
            let mut state = self.lock();
            if !state.running || state.paused {
                return;
            }
            let changed = self.refresh_timers(&mut state);
            let Some(slot) = tier.timer_index() else {
                return;
            };
            let delay_ms = seconds_to_ms(state.timers[slot]);
            if delay_ms < 0 {
                tracing::trace!(%tier, "tier suppressed by transmit profile");
                return;
            }
            if state.timer.is_some() && !changed {
                // Lower the armed round's tier so this record rides along.
                match merge_into_armed(&mut state, delay_ms, tier) {
                    Some(tier) => (delay_ms, tier, true),
                    None => return,
                }
            } else {
                (delay_ms, tier, changed)
            }
        };
        self.schedule_upload(delay_ms, tier, force);
    }

    fn max_bypass(self: &Arc<Self>) {
        let admitted = {
            let mut state = self.lock();
            if !state.running || state.paused {
                return;
            }
            let interval = self.config.max_tier_min_interval();
            let now = Instant::now();
            let limited = state
                .last_max_bypass
                .is_some_and(|last| now.duration_since(last) < interval);
            if !limited {
                state.last_max_bypass = Some(now);
            }
            !limited
        };
        if !admitted {
            tracing::trace!("max-tier bypass rate limited, records wait for the next round");
            return;
        }
        self.initiate(LatencyTier::Max, true);
    }

    fn schedule_upload(self: &Arc<Self>, delay_ms: i64, tier: LatencyTier, force: bool) {
        if delay_ms < 0 {
            tracing::trace!(delay_ms, %tier, "negative delay, no upload");
            return;
        }
        let scheduled = {
            let mut state = self.lock();
            if !state.running || state.paused {
                return;
            }
            if state.active.len() >= self.config.max_pending_uploads {
                tracing::trace!(active = state.active.len(), "maximum pending uploads reached");
                return;
            }
            self.refresh_timers(&mut state);
            let mut tier = tier;
            if state.timers[0] < 0 {
                tier = tier.max(LatencyTier::RealTime);
            }

            if !force {
                if let Some(timer) = state.timer.as_mut() {
                    if timer.tier > tier {
                        timer.tier = tier;
                    }
                    if timer.due <= Instant::now() + ms(delay_ms) {
                        tracing::trace!(%tier, "armed timer is due sooner, keeping it");
                        return;
                    }
                }
            }
            self.arm(&mut state, delay_ms, tier);
            tier
        };
        self.emit(|o| o.on_upload_scheduled(delay_ms as u64, scheduled));
    }

    /// Replace any armed timer with one firing after `delay_ms`.
    fn arm(self: &Arc<Self>, state: &mut SchedulerState, delay_ms: i64, tier: LatencyTier) {
        self.disarm(state);
        state.next_seq += 1;
        let seq = state.next_seq;
        let weak: Weak<Inner> = Arc::downgrade(self);
        let delay = ms(delay_ms);
        let handle = self.dispatcher.schedule(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.upload_async(Some(seq), tier);
                }
            }),
        );
        state.timer = Some(ArmedTimer {
            seq,
            handle,
            due: Instant::now() + delay,
            tier,
        });
        tracing::trace!(seq, delay_ms, %tier, "upload timer armed");
    }

    /// Timer entry point. `seq` is `None` for direct calls.
    fn upload_async(self: &Arc<Self>, seq: Option<u64>, tier: LatencyTier) {
        let tier = {
            let mut state = self.lock();
            let tier = match (seq, state.timer) {
                (Some(seq), Some(timer)) if timer.seq == seq => {
                    state.timer = None;
                    timer.tier
                }
                (Some(seq), _) => {
                    tracing::trace!(seq, "stale timer ignored");
                    return;
                }
                (None, _) => tier,
            };
            if !state.running || state.paused {
                return;
            }
            if state.round_in_flight() {
                // Rounds never overlap: push this one back instead of dropping it.
                let delay_ms = self.retry_delay_ms(&state.timers, tier);
                tracing::trace!(%tier, delay_ms, "round already in flight, rescheduling");
                drop(state);
                self.schedule_upload(delay_ms, tier, false);
                return;
            }
            state.running_latency = tier;
            tier
        };
        let _span = beacon_observability::upload_round_span!(tier).entered();

        if self.config.clock_skew_enabled && self.clock_skew.is_waiting_for_clock_skew() {
            let timers = self.lock().timers;
            let delay_ms = self.retry_delay_ms(&timers, tier);
            tracing::debug!(delay_ms, "waiting for clock skew, postponing round");
            self.schedule_upload(delay_ms, tier, false);
            return;
        }
        if !self.bandwidth.admit() {
            let delay_ms = self.config.bandwidth_retry_delay_ms as i64;
            tracing::info!(
                min_bps = self.bandwidth.min_bandwidth_bps(),
                delay_ms,
                "insufficient bandwidth, postponing round"
            );
            self.schedule_upload(delay_ms, tier, false);
            return;
        }
        if self.config.clock_skew_enabled {
            self.clock_skew.take_resume_transmission();
        }
        self.initiate(tier, false);
    }

    /// The round's own timer, or the bandwidth retry delay if that tier's
    /// timer is zero or suppressed.
    fn retry_delay_ms(&self, timers: &TimerArray, tier: LatencyTier) -> i64 {
        tier.timer_index()
            .map(|slot| seconds_to_ms(timers[slot]))
            .filter(|delay| *delay > 0)
            .unwrap_or(self.config.bandwidth_retry_delay_ms as i64)
    }

    /// Reserve records into a new context and hand it to the transport.
    fn initiate(self: &Arc<Self>, tier: LatencyTier, bypass: bool) {
        let mut ctx = EventsUploadContext::new(tier);
        let max_records = self.config.max_records_per_upload;
        let max_bytes = self.config.max_upload_size_bytes;
        {
            let _span = beacon_observability::reserve_span!(tier, max_records).entered();
            self.storage.get_and_reserve_records(
                &mut |record| {
                    ctx.push_record(record);
                    ctx.payload_bytes < max_bytes
                },
                self.config.record_lease_ms,
                tier,
                max_records,
            );
        }

        if !ctx.is_empty() && self.config.clock_skew_enabled && self.clock_skew.is_clock_skew_on() {
            ctx.clock_skew_header = Some(self.clock_skew.get_delta());
        }

        self.lock().active.insert(ctx.id, ActiveUpload { tier, bypass });

        if ctx.is_empty() {
            tracing::trace!(%tier, "no stored records to send");
            self.finish_upload(&ctx, UploadOutcome::NothingToUpload);
            return;
        }

        events::upload_initiated(&ctx.id, tier, ctx.record_count(), ctx.payload_bytes);
        self.emit(|o| o.on_upload_initiated(&ctx));
        self.transport.initiate_upload(ctx);
    }

    fn finish_upload(self: &Arc<Self>, ctx: &EventsUploadContext, outcome: UploadOutcome) {
        let Some(upload) = self.lock().active.remove(&ctx.id) else {
            tracing::warn!(ctx_id = %ctx.id, outcome = outcome.as_str(), "terminal callback for unknown upload");
            return;
        };

        if !ctx.record_ids.is_empty() {
            match outcome {
                UploadOutcome::Succeeded | UploadOutcome::Rejected => {
                    self.storage.delete_records(&ctx.record_ids);
                }
                UploadOutcome::Failed => {
                    self.storage.release_records(&ctx.record_ids, true);
                }
                UploadOutcome::PackagingFailed
                | UploadOutcome::Aborted
                | UploadOutcome::NothingToUpload => {
                    self.storage.release_records(&ctx.record_ids, false);
                }
            }
        }

        let mut resumed = false;
        if self.config.clock_skew_enabled {
            if self.clock_skew.is_waiting_for_clock_skew() {
                self.clock_skew.handle_response(&ctx.response_headers);
            }
            resumed = self.clock_skew.take_resume_transmission();
        }

        let (next, fire_all) = {
            let mut state = self.lock();
            let mut next = match outcome {
                UploadOutcome::NothingToUpload => {
                    state.backoff.reset();
                    // A Normal round already covered every tier. With Normal
                    // disabled by the profile there is nothing lower to sweep.
                    let sweep = upload.tier != LatencyTier::Normal && state.timers[0] >= 0;
                    sweep.then_some((0, LatencyTier::Normal))
                }
                UploadOutcome::Succeeded => {
                    state.backoff.reset();
                    Some((0, self.calculate_new_priority(&mut state)))
                }
                UploadOutcome::PackagingFailed | UploadOutcome::Rejected | UploadOutcome::Failed => {
                    let config = state.backoff_config.clone();
                    let delay = state.backoff.advance(&config);
                    let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
                    Some((delay_ms, self.calculate_new_priority(&mut state)))
                }
                UploadOutcome::Aborted => None,
            };
            if resumed && next.is_none() && outcome != UploadOutcome::Aborted {
                tracing::debug!("clock skew resolved, resuming transmission");
                next = Some((0, LatencyTier::Normal));
            }
            let fire_all = state.finish_pending && state.active.is_empty();
            if fire_all {
                state.finish_pending = false;
            }
            (next, fire_all)
        };

        events::upload_finished(&ctx.id, outcome, ctx.record_count());
        self.emit(|o| o.on_upload_finished(ctx, outcome));

        if let Some((delay_ms, tier)) = next {
            if outcome.is_failure() {
                events::upload_backoff(delay_ms as u64, tier);
            }
            self.schedule_upload(delay_ms, tier, false);
        }
        if fire_all {
            tracing::info!("all uploads finished");
            self.emit(|o| o.on_all_uploads_finished());
        }
    }

    /// Notify every observer. A panicking observer does not stop the others.
    fn emit<F: Fn(&dyn UploadObserver)>(&self, f: F) {
        for observer in &self.observers {
            let result = panic::catch_unwind(AssertUnwindSafe(|| f(observer.as_ref())));
            if result.is_err() {
                tracing::warn!("upload observer panicked");
            }
        }
    }
}

fn ms(delay_ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(delay_ms).unwrap_or(0))
}
