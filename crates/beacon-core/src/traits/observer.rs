use crate::models::{EventsUploadContext, LatencyTier, UploadOutcome};

/// Receives scheduler lifecycle notifications. All methods default to no-ops.
pub trait UploadObserver: Send + Sync {
    fn on_upload_scheduled(&self, _delay_ms: u64, _tier: LatencyTier) {}

    fn on_upload_initiated(&self, _ctx: &EventsUploadContext) {}

    fn on_upload_finished(&self, _ctx: &EventsUploadContext, _outcome: UploadOutcome) {}

    /// Fired exactly once per stop or finish request, after in-flight uploads drain.
    fn on_all_uploads_finished(&self) {}
}
