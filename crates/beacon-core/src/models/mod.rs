//! Shared data model.

pub mod device_state;
pub mod latency;
pub mod record_filter;
pub mod storage_record;
pub mod transmit_rule;
pub mod upload_context;
pub mod upload_outcome;

pub use device_state::{DeviceState, NetworkCost, NetworkType, PowerSource};
pub use latency::{EventPersistence, LatencyTier};
pub use record_filter::RecordFilter;
pub use storage_record::{StorageRecord, StorageRecordId};
pub use transmit_rule::{TimerArray, TransmitProfileRule, TransmitProfileRules};
pub use upload_context::EventsUploadContext;
pub use upload_outcome::UploadOutcome;
