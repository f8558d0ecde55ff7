//! Per-tier queues of unreserved records.

use std::collections::HashSet;

use beacon_core::models::{LatencyTier, StorageRecord};

#[derive(Debug, Default)]
pub(crate) struct TierQueues {
    queues: [Vec<StorageRecord>; LatencyTier::COUNT],
    ids: HashSet<String>,
    size: usize,
}

impl TierQueues {
    pub fn push(&mut self, record: StorageRecord) {
        self.size += record.approximate_size();
        self.ids.insert(record.id.clone());
        self.queues[record.latency.index()].push(record);
    }

    /// Pop the most recent record of the highest non-empty tier at or above `min_tier`.
    pub fn pop(&mut self, min_tier: LatencyTier) -> Option<StorageRecord> {
        for tier in LatencyTier::uploadable_desc().filter(|t| *t >= min_tier) {
            if let Some(record) = self.queues[tier.index()].pop() {
                self.size = self.size.saturating_sub(record.approximate_size());
                self.ids.remove(&record.id);
                return Some(record);
            }
        }
        None
    }

    pub fn remove_ids(&mut self, ids: &HashSet<&str>) -> usize {
        self.remove_where(|r| ids.contains(r.id.as_str())).len()
    }

    pub fn remove_where<F>(&mut self, mut pred: F) -> Vec<StorageRecord>
    where
        F: FnMut(&StorageRecord) -> bool,
    {
        let mut removed = Vec::new();
        for queue in self.queues.iter_mut() {
            let mut i = 0;
            while i < queue.len() {
                if pred(&queue[i]) {
                    removed.push(queue.remove(i));
                } else {
                    i += 1;
                }
            }
        }
        for record in &removed {
            self.size = self.size.saturating_sub(record.approximate_size());
            self.ids.remove(&record.id);
        }
        removed
    }

    pub fn clear(&mut self) -> usize {
        let count = self.len();
        for queue in self.queues.iter_mut() {
            queue.clear();
        }
        self.ids.clear();
        self.size = 0;
        count
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn count(&self, tier: LatencyTier) -> usize {
        self.queues[tier.index()].len()
    }

    pub fn len(&self) -> usize {
        self.queues.iter().map(Vec::len).sum()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}
