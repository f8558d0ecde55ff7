use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::latency::LatencyTier;
use super::storage_record::{StorageRecord, StorageRecordId};

/// One in-flight upload attempt.
///
/// Created by the scheduler on admission, handed to the transport, and handed
/// back through exactly one terminal callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsUploadContext {
    pub id: Uuid,
    pub requested_min_latency: LatencyTier,
    /// Ids of the records reserved for this attempt.
    pub record_ids: Vec<StorageRecordId>,
    /// The reserved records themselves, for the transport to encode.
    pub records: Vec<StorageRecord>,
    pub payload_bytes: usize,
    /// Value for the outbound clock-skew request header, when enabled.
    pub clock_skew_header: Option<String>,
    /// Response headers filled in by the transport before the terminal callback.
    pub response_headers: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl EventsUploadContext {
    pub fn new(requested_min_latency: LatencyTier) -> Self {
        Self {
            id: Uuid::new_v4(),
            requested_min_latency,
            record_ids: Vec::new(),
            records: Vec::new(),
            payload_bytes: 0,
            clock_skew_header: None,
            response_headers: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Take ownership of a reserved record.
    pub fn push_record(&mut self, record: StorageRecord) {
        self.payload_bytes += record.payload.len();
        self.record_ids.push(record.id.clone());
        self.records.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.record_ids.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.record_ids.len()
    }
}
