/// Reports the bandwidth currently available for uploads.
pub trait BandwidthSource: Send + Sync {
    /// Proposed bandwidth in bytes per second. `None` or `Some(0)` means unknown.
    fn proposed_bandwidth_bps(&self) -> Option<u32>;
}
