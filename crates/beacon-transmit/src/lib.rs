//! # beacon-transmit
//!
//! Upload policy inputs consulted by the scheduler:
//! - [`TransmitProfileTable`]: device conditions to per-tier wait times.
//! - [`ClockSkewGate`]: one-shot clock-delta exchange with the collector.
//! - [`ExponentialBackoff`]: retry delays after failed uploads.
//! - [`BandwidthAdmission`]: gates uploads on proposed bandwidth.

pub mod backoff;
pub mod bandwidth;
pub mod clock_skew;
pub mod profiles;

pub use backoff::{ConfiguredBackoff, ExponentialBackoff};
pub use bandwidth::BandwidthAdmission;
pub use clock_skew::{ClockSkewGate, ClockSkewPhase, ClockSkewState};
pub use profiles::{TransmitProfile, TransmitProfileTable};
