//! Transmit profiles: named rule lists mapping device conditions to timers.

pub mod defaults;
pub mod parse;
pub mod table;
mod validate;

pub use table::TransmitProfileTable;

/// The built-in profiles, selectable without knowing their names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransmitProfile {
    RealTime,
    NearRealTime,
    BestEffort,
}

impl TransmitProfile {
    pub fn name(self) -> &'static str {
        match self {
            TransmitProfile::RealTime => defaults::REAL_TIME,
            TransmitProfile::NearRealTime => defaults::NEAR_REAL_TIME,
            TransmitProfile::BestEffort => defaults::BEST_EFFORT,
        }
    }
}
