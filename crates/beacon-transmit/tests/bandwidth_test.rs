use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use beacon_core::traits::BandwidthSource;
use beacon_transmit::BandwidthAdmission;

struct FixedBandwidth(AtomicU32);

impl BandwidthSource for FixedBandwidth {
    fn proposed_bandwidth_bps(&self) -> Option<u32> {
        Some(self.0.load(Ordering::Relaxed))
    }
}

struct UnknownBandwidth;

impl BandwidthSource for UnknownBandwidth {
    fn proposed_bandwidth_bps(&self) -> Option<u32> {
        None
    }
}

#[test]
fn zero_floor_always_admits() {
    let source = Arc::new(FixedBandwidth(AtomicU32::new(1)));
    assert!(BandwidthAdmission::new(Some(source), 0).admit());
    assert!(BandwidthAdmission::unrestricted().admit());
}

#[test]
fn unknown_or_zero_proposal_admits() {
    assert!(BandwidthAdmission::new(Some(Arc::new(UnknownBandwidth)), 5000).admit());
    let zero = Arc::new(FixedBandwidth(AtomicU32::new(0)));
    assert!(BandwidthAdmission::new(Some(zero), 5000).admit());
    assert!(BandwidthAdmission::new(None, 5000).admit());
}

#[test]
fn proposal_below_floor_is_refused() {
    let source = Arc::new(FixedBandwidth(AtomicU32::new(1000)));
    let admission = BandwidthAdmission::new(Some(source.clone()), 5000);
    assert!(!admission.admit());

    source.0.store(5000, Ordering::Relaxed);
    assert!(admission.admit());

    admission.set_min_bandwidth_bps(6000);
    assert!(!admission.admit());
    assert_eq!(admission.min_bandwidth_bps(), 6000);
}
