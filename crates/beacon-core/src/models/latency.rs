use std::fmt;

use serde::{Deserialize, Serialize};

/// Urgency classification of a telemetry record.
///
/// Ordering is total: `Off < Normal < CostDeferred < RealTime < Max`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum LatencyTier {
    /// Never staged, never uploaded.
    Off = 0,
    #[default]
    Normal = 1,
    CostDeferred = 2,
    RealTime = 3,
    /// Bypasses timers and uploads immediately.
    Max = 4,
}

impl LatencyTier {
    /// All tiers in ascending order.
    pub const ALL: [LatencyTier; 5] = [
        LatencyTier::Off,
        LatencyTier::Normal,
        LatencyTier::CostDeferred,
        LatencyTier::RealTime,
        LatencyTier::Max,
    ];

    /// Number of tiers, including `Off`.
    pub const COUNT: usize = 5;

    /// Tiers that can be staged and uploaded, highest urgency first.
    pub fn uploadable_desc() -> impl Iterator<Item = LatencyTier> {
        Self::ALL.into_iter().rev().filter(|t| *t != LatencyTier::Off)
    }

    /// Position of this tier's wait time inside a profile timer array.
    /// `Off` and `Max` have no timer.
    pub fn timer_index(self) -> Option<usize> {
        match self {
            LatencyTier::Normal => Some(0),
            LatencyTier::CostDeferred => Some(1),
            LatencyTier::RealTime => Some(2),
            LatencyTier::Off | LatencyTier::Max => None,
        }
    }

    /// Dense index usable for per-tier arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(LatencyTier::Off),
            1 => Some(LatencyTier::Normal),
            2 => Some(LatencyTier::CostDeferred),
            3 => Some(LatencyTier::RealTime),
            4 => Some(LatencyTier::Max),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LatencyTier::Off => "off",
            LatencyTier::Normal => "normal",
            LatencyTier::CostDeferred => "cost_deferred",
            LatencyTier::RealTime => "real_time",
            LatencyTier::Max => "max",
        }
    }

    /// Parse the name used in filters and config (`"real_time"`, `"3"`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        if let Ok(n) = value.parse::<i32>() {
            return Self::from_i32(n);
        }
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for LatencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistence hint carried by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPersistence {
    #[default]
    Normal,
    Critical,
}

impl EventPersistence {
    pub fn as_str(self) -> &'static str {
        match self {
            EventPersistence::Normal => "normal",
            EventPersistence::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "normal" | "1" => Some(EventPersistence::Normal),
            "critical" | "2" => Some(EventPersistence::Critical),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_totally_ordered() {
        for pair in LatencyTier::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn uploadable_desc_skips_off() {
        let tiers: Vec<_> = LatencyTier::uploadable_desc().collect();
        assert_eq!(
            tiers,
            vec![
                LatencyTier::Max,
                LatencyTier::RealTime,
                LatencyTier::CostDeferred,
                LatencyTier::Normal
            ]
        );
    }

    #[test]
    fn parse_accepts_names_and_numbers() {
        assert_eq!(LatencyTier::parse("real_time"), Some(LatencyTier::RealTime));
        assert_eq!(LatencyTier::parse("MAX"), Some(LatencyTier::Max));
        assert_eq!(LatencyTier::parse("2"), Some(LatencyTier::CostDeferred));
        assert_eq!(LatencyTier::parse("9"), None);
        assert_eq!(LatencyTier::parse("urgent"), None);
    }
}
