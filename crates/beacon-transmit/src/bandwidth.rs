//! Bandwidth admission control.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use beacon_core::config::SchedulerConfig;
use beacon_core::traits::BandwidthSource;

/// Admits an upload when the proposed bandwidth meets the configured floor.
///
/// A missing source, an unknown (zero) proposal, or a zero floor always admits.
#[derive(Clone)]
pub struct BandwidthAdmission {
    source: Option<Arc<dyn BandwidthSource>>,
    min_bps: Arc<AtomicU32>,
}

impl BandwidthAdmission {
    pub fn new(source: Option<Arc<dyn BandwidthSource>>, min_bps: u32) -> Self {
        Self {
            source,
            min_bps: Arc::new(AtomicU32::new(min_bps)),
        }
    }

    pub fn from_config(source: Option<Arc<dyn BandwidthSource>>, config: &SchedulerConfig) -> Self {
        Self::new(source, config.min_upload_bandwidth_bps)
    }

    /// No source and no floor.
    pub fn unrestricted() -> Self {
        Self::new(None, 0)
    }

    pub fn set_min_bandwidth_bps(&self, min_bps: u32) {
        self.min_bps.store(min_bps, Ordering::Relaxed);
    }

    pub fn min_bandwidth_bps(&self) -> u32 {
        self.min_bps.load(Ordering::Relaxed)
    }

    pub fn admit(&self) -> bool {
        let min = self.min_bandwidth_bps();
        if min == 0 {
            return true;
        }
        let proposed = match self.source.as_ref().and_then(|s| s.proposed_bandwidth_bps()) {
            None | Some(0) => return true,
            Some(bps) => bps,
        };
        if proposed < min {
            tracing::info!(
                proposed_bps = proposed,
                min_bps = min,
                "proposed bandwidth below minimum"
            );
            return false;
        }
        tracing::trace!(proposed_bps = proposed, min_bps = min, "bandwidth admitted");
        true
    }
}

impl std::fmt::Debug for BandwidthAdmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BandwidthAdmission")
            .field("has_source", &self.source.is_some())
            .field("min_bps", &self.min_bandwidth_bps())
            .finish()
    }
}
