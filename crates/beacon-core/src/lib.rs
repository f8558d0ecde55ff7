//! # beacon-core
//!
//! Foundation crate for the Beacon upload engine.
//! Defines the shared data model, collaborator traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::BeaconConfig;
pub use errors::{BeaconError, BeaconResult};
pub use models::{
    DeviceState, EventPersistence, EventsUploadContext, LatencyTier, NetworkCost, PowerSource,
    RecordFilter, StorageRecord, TimerArray, TransmitProfileRule, TransmitProfileRules, UploadOutcome,
};
