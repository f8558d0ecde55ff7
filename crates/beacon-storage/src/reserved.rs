//! Records checked out to an upload attempt, keyed by id.

use std::collections::{HashMap, HashSet};

use beacon_core::models::StorageRecord;

#[derive(Debug, Default)]
pub(crate) struct ReservedSet {
    records: HashMap<String, StorageRecord>,
    size: usize,
}

impl ReservedSet {
    pub fn insert(&mut self, record: StorageRecord) {
        self.size += record.approximate_size();
        if let Some(previous) = self.records.insert(record.id.clone(), record) {
            self.size = self.size.saturating_sub(previous.approximate_size());
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<StorageRecord> {
        let record = self.records.remove(id)?;
        self.size = self.size.saturating_sub(record.approximate_size());
        Some(record)
    }

    pub fn remove_ids(&mut self, ids: &HashSet<&str>) -> Vec<StorageRecord> {
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    pub fn remove_where<F>(&mut self, mut pred: F) -> Vec<StorageRecord>
    where
        F: FnMut(&StorageRecord) -> bool,
    {
        let ids: Vec<String> = self
            .records
            .values()
            .filter(|r| pred(r))
            .map(|r| r.id.clone())
            .collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Remove every record whose lease ran out at `now_ms`.
    pub fn take_expired(&mut self, now_ms: i64) -> Vec<StorageRecord> {
        self.remove_where(|r| r.is_lease_expired(now_ms))
    }

    pub fn drain(&mut self) -> Vec<StorageRecord> {
        self.size = 0;
        self.records.drain().map(|(_, r)| r).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}
