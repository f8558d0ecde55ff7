use crate::errors::StorageError;
use crate::models::{LatencyTier, RecordFilter, StorageRecord, StorageRecordId};

/// Callback receiving records from [`RecordStorage::get_and_reserve_records`].
/// Returning `false` stops the iteration.
pub type RecordConsumer<'a> = dyn FnMut(StorageRecord) -> bool + 'a;

/// Staging area for records awaiting upload.
///
/// A staged record is either queued (eligible for reservation) or reserved
/// (checked out to an upload attempt), never both.
pub trait RecordStorage: Send + Sync {
    // --- Staging ---
    fn store_record(&self, record: StorageRecord) -> bool;
    fn store_records(&self, records: Vec<StorageRecord>) -> usize;

    // --- Reservation ---
    fn get_and_reserve_records(
        &self,
        consumer: &mut RecordConsumer<'_>,
        lease_ms: u64,
        min_tier: LatencyTier,
        max_count: usize,
    ) -> bool;
    fn get_records(
        &self,
        shutdown: bool,
        min_tier: LatencyTier,
        max_count: usize,
    ) -> Vec<StorageRecord>;

    // --- Completion ---
    fn delete_records(&self, ids: &[StorageRecordId]) -> usize;
    fn delete_records_matching(&self, filter: &RecordFilter) -> usize;
    fn delete_all_records(&self);
    fn release_records(&self, ids: &[StorageRecordId], increment_retry: bool) -> usize;
    fn release_all_records(&self) -> usize;

    // --- Accounting ---
    fn get_size(&self) -> usize;
    fn get_reserved_size(&self) -> usize;
    fn get_record_count(&self, tier: Option<LatencyTier>) -> usize;
    fn get_reserved_count(&self) -> usize;
    fn last_read_record_count(&self) -> usize;
    /// Whether the last delete/release/read was served from memory.
    fn is_last_read_from_memory(&self) -> bool;

    // --- Maintenance ---
    fn flush(&self);
    fn resize_db(&self) -> bool;
    fn shutdown(&self);

    // --- Persisted settings ---
    fn store_setting(&self, name: &str, value: &str) -> Result<(), StorageError>;
    fn get_setting(&self, name: &str) -> Result<Option<String>, StorageError>;
    fn delete_setting(&self, name: &str) -> Result<(), StorageError>;
}
