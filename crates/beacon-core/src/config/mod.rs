//! Configuration for the upload engine.
//! TOML-based, resolved as: env (`BEACON_*`) > file > compiled defaults.

pub mod beacon_config;
pub mod defaults;
pub mod scheduler_config;
pub mod storage_config;
pub mod transmit_config;

pub use beacon_config::BeaconConfig;
pub use scheduler_config::SchedulerConfig;
pub use storage_config::StorageConfig;
pub use transmit_config::TransmitConfig;
