//! # beacon-storage
//!
//! In-memory staging for records awaiting upload.
//! Records sit in per-tier queues until reserved for an upload attempt; a
//! reservation is a lease that ends in delete (uploaded), release (retry), or
//! expiry (reclaimed on the next reservation).

pub mod engine;
mod queues;
mod reserved;

pub use engine::MemoryRecordStore;
