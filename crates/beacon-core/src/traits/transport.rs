use crate::models::EventsUploadContext;

/// Performs the network side of an upload.
///
/// The transport owns the context until it reports a terminal outcome back to
/// the scheduler through exactly one of its completion callbacks.
pub trait UploadTransport: Send + Sync {
    fn initiate_upload(&self, ctx: EventsUploadContext);
}
