//! In-memory `RecordStorage` built on two independently locked
//! regions: the reserved set and the tier queues.
//!
//! Lock order is always reserved set, then tier queues. Neither lock is held
//! while the reservation consumer runs.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use beacon_core::config::StorageConfig;
use beacon_core::errors::StorageError;
use beacon_core::models::{LatencyTier, RecordFilter, StorageRecord, StorageRecordId};
use beacon_core::traits::{RecordConsumer, RecordStorage};
use beacon_observability::tracing_setup::events;

use crate::queues::TierQueues;
use crate::reserved::ReservedSet;

/// In-memory record store with lease-based reservation.
pub struct MemoryRecordStore {
    reserved: Mutex<ReservedSet>,
    queues: Mutex<TierQueues>,
    max_retry_count: u32,
    last_read_count: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            reserved: Mutex::new(ReservedSet::default()),
            queues: Mutex::new(TierQueues::default()),
            max_retry_count: config.max_retry_count,
            last_read_count: AtomicUsize::new(0),
        }
    }

    pub fn max_retry_count(&self) -> u32 {
        self.max_retry_count
    }

    /// Whether `id` is currently reserved. Diagnostic only.
    pub fn is_reserved(&self, id: &str) -> bool {
        lock(&self.reserved, "reserved").contains(id)
    }

    /// Whether `id` is currently queued. Diagnostic only.
    pub fn is_queued(&self, id: &str) -> bool {
        lock(&self.queues, "queues").contains(id)
    }

    /// Move expired leases back to their queues, counting the lapse as a retry.
    fn reclaim_expired(&self, now_ms: i64) {
        let mut reserved = lock(&self.reserved, "reserved");
        let expired = reserved.take_expired(now_ms);
        if expired.is_empty() {
            return;
        }
        let mut queues = lock(&self.queues, "queues");
        tracing::debug!(count = expired.len(), "reclaiming expired leases");
        let dropped = self.requeue(&mut queues, expired, true);
        if dropped > 0 {
            events::records_dropped(dropped, "retry limit exceeded after lease expiry");
        }
    }

    /// Requeue records, dropping those past the retry limit. Returns the drop count.
    fn requeue(
        &self,
        queues: &mut TierQueues,
        records: Vec<StorageRecord>,
        increment_retry: bool,
    ) -> usize {
        let mut dropped = 0;
        for mut record in records {
            record.reserved_until = None;
            if increment_retry {
                record.retry_count += 1;
                if record.retry_count > self.max_retry_count {
                    tracing::warn!(
                        record_id = %record.id,
                        retry_count = record.retry_count,
                        "dropping record past retry limit"
                    );
                    dropped += 1;
                    continue;
                }
            }
            queues.push(record);
        }
        dropped
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new(&StorageConfig::default())
    }
}

impl RecordStorage for MemoryRecordStore {
    fn store_record(&self, record: StorageRecord) -> bool {
        if record.latency == LatencyTier::Off {
            tracing::warn!(record_id = %record.id, "rejecting record with latency off");
            return false;
        }
        let reserved = lock(&self.reserved, "reserved");
        let mut queues = lock(&self.queues, "queues");
        if reserved.contains(&record.id) || queues.contains(&record.id) {
            tracing::warn!(record_id = %record.id, "rejecting record already staged");
            return false;
        }
        queues.push(record);
        true
    }

    fn store_records(&self, records: Vec<StorageRecord>) -> usize {
        records
            .into_iter()
            .map(|r| self.store_record(r))
            .filter(|stored| *stored)
            .count()
    }

    fn get_and_reserve_records(
        &self,
        consumer: &mut RecordConsumer<'_>,
        lease_ms: u64,
        min_tier: LatencyTier,
        max_count: usize,
    ) -> bool {
        if min_tier == LatencyTier::Off {
            tracing::warn!("refusing to reserve records of latency off");
            return false;
        }
        let now_ms = Utc::now().timestamp_millis();
        self.reclaim_expired(now_ms);

        tracing::trace!(
            %min_tier,
            max_count,
            lease_ms,
            "reserving records"
        );

        let limit = if max_count == 0 { usize::MAX } else { max_count };
        let mut handed_out = 0;
        while handed_out < limit {
            let next = {
                let mut reserved = lock(&self.reserved, "reserved");
                let mut queues = lock(&self.queues, "queues");
                match queues.pop(min_tier) {
                    Some(mut record) if lease_ms > 0 => {
                        let lease_ms = i64::try_from(lease_ms).unwrap_or(i64::MAX);
                        record.reserved_until = Some(now_ms.saturating_add(lease_ms));
                        reserved.insert(record.clone());
                        Some(record)
                    }
                    other => other,
                }
            };
            let Some(record) = next else {
                break;
            };
            handed_out += 1;
            if !consumer(record) {
                break;
            }
        }

        self.last_read_count.store(handed_out, Ordering::Relaxed);
        true
    }

    fn get_records(
        &self,
        shutdown: bool,
        min_tier: LatencyTier,
        max_count: usize,
    ) -> Vec<StorageRecord> {
        tracing::trace!(shutdown, "draining records without lease");
        let mut records = Vec::new();
        self.get_and_reserve_records(
            &mut |record| {
                records.push(record);
                true
            },
            0,
            min_tier,
            max_count,
        );
        records
    }

    fn delete_records(&self, ids: &[StorageRecordId]) -> usize {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut reserved = lock(&self.reserved, "reserved");
        let from_reserved = reserved.remove_ids(&wanted).len();
        let from_queues = lock(&self.queues, "queues").remove_ids(&wanted);
        tracing::trace!(from_reserved, from_queues, "deleted records by id");
        from_reserved + from_queues
    }

    fn delete_records_matching(&self, filter: &RecordFilter) -> usize {
        if filter.is_empty() {
            tracing::warn!("refusing to delete with an empty filter");
            return 0;
        }
        let mut reserved = lock(&self.reserved, "reserved");
        let from_reserved = reserved.remove_where(|r| filter.matches(r)).len();
        let from_queues = lock(&self.queues, "queues")
            .remove_where(|r| filter.matches(r))
            .len();
        tracing::debug!(from_reserved, from_queues, "deleted records by filter");
        from_reserved + from_queues
    }

    fn delete_all_records(&self) {
        let mut reserved = lock(&self.reserved, "reserved");
        let reserved_count = reserved.drain().len();
        let queued_count = lock(&self.queues, "queues").clear();
        tracing::info!(reserved_count, queued_count, "deleted all records");
    }

    fn release_records(&self, ids: &[StorageRecordId], increment_retry: bool) -> usize {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut reserved = lock(&self.reserved, "reserved");
        let released = reserved.remove_ids(&wanted);
        let count = released.len();
        let mut queues = lock(&self.queues, "queues");
        let dropped = self.requeue(&mut queues, released, increment_retry);
        drop(queues);
        drop(reserved);
        if dropped > 0 {
            events::records_dropped(dropped, "retry limit exceeded");
        }
        count - dropped
    }

    fn release_all_records(&self) -> usize {
        let mut reserved = lock(&self.reserved, "reserved");
        let released = reserved.drain();
        let count = released.len();
        let mut queues = lock(&self.queues, "queues");
        self.requeue(&mut queues, released, false);
        if count > 0 {
            tracing::debug!(count, "released all reserved records");
        }
        count
    }

    fn get_size(&self) -> usize {
        lock(&self.queues, "queues").size()
    }

    fn get_reserved_size(&self) -> usize {
        lock(&self.reserved, "reserved").size()
    }

    fn get_record_count(&self, tier: Option<LatencyTier>) -> usize {
        let queues = lock(&self.queues, "queues");
        match tier {
            Some(tier) => queues.count(tier),
            None => queues.len(),
        }
    }

    fn get_reserved_count(&self) -> usize {
        lock(&self.reserved, "reserved").len()
    }

    fn last_read_record_count(&self) -> usize {
        self.last_read_count.load(Ordering::Relaxed)
    }

    fn is_last_read_from_memory(&self) -> bool {
        true
    }

    fn flush(&self) {
        tracing::debug!("flush is a no-op for the memory store");
    }

    fn resize_db(&self) -> bool {
        true
    }

    fn shutdown(&self) {
        let reserved_count = lock(&self.reserved, "reserved").len();
        let queues = lock(&self.queues, "queues");
        for tier in LatencyTier::uploadable_desc() {
            let count = queues.count(tier);
            if count > 0 {
                tracing::warn!(%tier, count, "discarding unflushed records at shutdown");
            }
        }
        if reserved_count > 0 {
            tracing::warn!(reserved_count, "discarding reserved records at shutdown");
        }
    }

    fn store_setting(&self, name: &str, _value: &str) -> Result<(), StorageError> {
        Err(unsupported("store_setting", name))
    }

    fn get_setting(&self, name: &str) -> Result<Option<String>, StorageError> {
        Err(unsupported("get_setting", name))
    }

    fn delete_setting(&self, name: &str) -> Result<(), StorageError> {
        Err(unsupported("delete_setting", name))
    }
}

fn unsupported(operation: &str, name: &str) -> StorageError {
    tracing::warn!(operation, setting = name, "settings are not supported by the memory store");
    StorageError::Unsupported {
        operation: operation.to_string(),
    }
}

/// Lock a region, recovering the guard if a previous holder panicked.
fn lock<'a, T>(mutex: &'a Mutex<T>, region: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        tracing::warn!(region, "recovering poisoned lock");
        poisoned.into_inner()
    })
}
