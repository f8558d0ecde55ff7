use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::latency::{EventPersistence, LatencyTier};

/// Opaque, stable record identifier.
pub type StorageRecordId = String;

/// Fixed per-record overhead counted on top of the payload when sizing the store.
const RECORD_OVERHEAD_BYTES: usize = std::mem::size_of::<StorageRecord>();

/// A telemetry record staged for upload.
///
/// The payload is opaque to the engine. Cloning deep-copies it; moving transfers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub id: StorageRecordId,
    pub tenant_token: String,
    pub latency: LatencyTier,
    pub persistence: EventPersistence,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub retry_count: u32,
    pub payload: Vec<u8>,
    /// Lease expiry while reserved, milliseconds since the Unix epoch.
    pub reserved_until: Option<i64>,
}

impl StorageRecord {
    pub fn new(
        id: impl Into<String>,
        tenant_token: impl Into<String>,
        latency: LatencyTier,
        persistence: EventPersistence,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            tenant_token: tenant_token.into(),
            latency,
            persistence,
            timestamp: Utc::now().timestamp_millis(),
            retry_count: 0,
            payload,
            reserved_until: None,
        }
    }

    /// Approximate in-memory footprint used by the store's size counters.
    pub fn approximate_size(&self) -> usize {
        self.payload.len() + RECORD_OVERHEAD_BYTES
    }

    /// Whether the record's lease has run out at `now_ms`.
    pub fn is_lease_expired(&self, now_ms: i64) -> bool {
        matches!(self.reserved_until, Some(until) if until <= now_ms)
    }
}
