//! Shared harness: a hand-cranked dispatcher, a recording transport, and a
//! recording observer around a real MemoryRecordStore.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use beacon_core::config::SchedulerConfig;
use beacon_core::models::{
    EventPersistence, EventsUploadContext, LatencyTier, StorageRecord, UploadOutcome,
};
use beacon_core::traits::{RecordStorage, UploadObserver, UploadTransport};
use beacon_scheduler::{Collaborators, Task, TaskDispatcher, TaskHandle, UploadScheduler};
use beacon_storage::MemoryRecordStore;
use beacon_transmit::{BandwidthAdmission, ClockSkewGate, TransmitProfileTable};

// ---- ManualDispatcher ----

struct Entry {
    id: u64,
    delay: Duration,
    task: Task,
}

#[derive(Default)]
struct ManualState {
    next_id: u64,
    queue: Vec<Entry>,
    delays: Vec<Duration>,
}

/// Records requested delays and runs tasks only when told to.
#[derive(Default)]
pub struct ManualDispatcher {
    state: Mutex<ManualState>,
    ignore_cancel: bool,
}

impl ManualDispatcher {
    /// A dispatcher whose `cancel` always misses, as if the task had already
    /// been dequeued.
    pub fn ignoring_cancel() -> Self {
        Self {
            ignore_cancel: true,
            ..Self::default()
        }
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.state.lock().unwrap().delays.clone()
    }

    pub fn last_delay(&self) -> Option<Duration> {
        self.state.lock().unwrap().delays.last().copied()
    }

    pub fn pending(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }

    /// Run the task with the shortest delay. Returns false if none is queued.
    pub fn fire_next(&self) -> bool {
        let entry = {
            let mut state = self.state.lock().unwrap();
            let Some(pos) = state
                .queue
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| (e.delay, e.id))
                .map(|(i, _)| i)
            else {
                return false;
            };
            state.queue.remove(pos)
        };
        (entry.task)();
        true
    }
}

impl TaskDispatcher for ManualDispatcher {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.delays.push(delay);
        state.queue.push(Entry { id, delay, task });
        TaskHandle::new(id)
    }

    fn cancel(&self, handle: TaskHandle) -> bool {
        if self.ignore_cancel {
            return false;
        }
        let mut state = self.state.lock().unwrap();
        let before = state.queue.len();
        state.queue.retain(|e| e.id != handle.id());
        state.queue.len() != before
    }
}

// ---- RecordingTransport ----

#[derive(Default)]
pub struct RecordingTransport {
    uploads: Mutex<Vec<EventsUploadContext>>,
}

impl RecordingTransport {
    pub fn count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn take(&self) -> Vec<EventsUploadContext> {
        std::mem::take(&mut *self.uploads.lock().unwrap())
    }
}

impl UploadTransport for RecordingTransport {
    fn initiate_upload(&self, ctx: EventsUploadContext) {
        self.uploads.lock().unwrap().push(ctx);
    }
}

// ---- RecordingObserver ----

#[derive(Default)]
pub struct RecordingObserver {
    pub scheduled: Mutex<Vec<(u64, LatencyTier)>>,
    pub initiated: AtomicUsize,
    pub finished: Mutex<Vec<UploadOutcome>>,
    pub all_finished: AtomicUsize,
}

impl RecordingObserver {
    pub fn all_finished_count(&self) -> usize {
        self.all_finished.load(Ordering::SeqCst)
    }

    pub fn outcomes(&self) -> Vec<UploadOutcome> {
        self.finished.lock().unwrap().clone()
    }
}

impl UploadObserver for RecordingObserver {
    fn on_upload_scheduled(&self, delay_ms: u64, tier: LatencyTier) {
        self.scheduled.lock().unwrap().push((delay_ms, tier));
    }

    fn on_upload_initiated(&self, _ctx: &EventsUploadContext) {
        self.initiated.fetch_add(1, Ordering::SeqCst);
    }

    fn on_upload_finished(&self, _ctx: &EventsUploadContext, outcome: UploadOutcome) {
        self.finished.lock().unwrap().push(outcome);
    }

    fn on_all_uploads_finished(&self) {
        self.all_finished.fetch_add(1, Ordering::SeqCst);
    }
}

// ---- Harness ----

pub struct Harness {
    pub scheduler: UploadScheduler,
    pub store: Arc<MemoryRecordStore>,
    pub profiles: Arc<TransmitProfileTable>,
    pub clock_skew: Arc<ClockSkewGate>,
    pub dispatcher: Arc<ManualDispatcher>,
    pub transport: Arc<RecordingTransport>,
    pub observer: Arc<RecordingObserver>,
}

/// Defaults with zero backoff jitter and the clock-skew exchange disabled.
pub fn test_config() -> SchedulerConfig {
    SchedulerConfig {
        backoff_config: "E,3000,300000,2,0".to_string(),
        clock_skew_enabled: false,
        ..SchedulerConfig::default()
    }
}

pub struct HarnessBuilder {
    config: SchedulerConfig,
    bandwidth: BandwidthAdmission,
    clock_skew: Arc<ClockSkewGate>,
    dispatcher: Arc<ManualDispatcher>,
}

impl HarnessBuilder {
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bandwidth(mut self, bandwidth: BandwidthAdmission) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    pub fn clock_skew(mut self, gate: ClockSkewGate) -> Self {
        self.clock_skew = Arc::new(gate);
        self
    }

    pub fn dispatcher(mut self, dispatcher: ManualDispatcher) -> Self {
        self.dispatcher = Arc::new(dispatcher);
        self
    }

    pub fn build(self) -> Harness {
        let store = Arc::new(MemoryRecordStore::default());
        let profiles = Arc::new(TransmitProfileTable::new());
        let transport = Arc::new(RecordingTransport::default());
        let observer = Arc::new(RecordingObserver::default());
        let scheduler = UploadScheduler::new(
            self.config,
            Collaborators {
                storage: store.clone(),
                profiles: profiles.clone(),
                clock_skew: self.clock_skew.clone(),
                bandwidth: self.bandwidth,
                dispatcher: self.dispatcher.clone(),
                transport: transport.clone(),
                observers: vec![observer.clone()],
            },
        )
        .unwrap();
        Harness {
            scheduler,
            store,
            profiles,
            clock_skew: self.clock_skew,
            dispatcher: self.dispatcher,
            transport,
            observer,
        }
    }
}

pub fn harness() -> HarnessBuilder {
    HarnessBuilder {
        config: test_config(),
        bandwidth: BandwidthAdmission::unrestricted(),
        clock_skew: Arc::new(ClockSkewGate::default()),
        dispatcher: Arc::new(ManualDispatcher::default()),
    }
}

impl Harness {
    pub fn stage(&self, id: &str, tier: LatencyTier) {
        assert!(self.store.store_record(StorageRecord::new(
            id,
            "tenant",
            tier,
            EventPersistence::Normal,
            vec![0; 16],
        )));
    }

    /// Fire queued timers until the transport receives an upload.
    pub fn fire_until_upload(&self) -> EventsUploadContext {
        for _ in 0..10 {
            if !self.dispatcher.fire_next() {
                break;
            }
            if let Some(ctx) = self.transport.take().pop() {
                return ctx;
            }
        }
        panic!("no upload was initiated");
    }

    pub fn last_delay_ms(&self) -> u128 {
        self.dispatcher.last_delay().expect("nothing scheduled").as_millis()
    }
}
