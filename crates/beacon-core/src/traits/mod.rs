//! Collaborator seams. The host injects implementations of these.

pub mod bandwidth;
pub mod observer;
pub mod storage;
pub mod transport;

pub use bandwidth::BandwidthSource;
pub use observer::UploadObserver;
pub use storage::{RecordConsumer, RecordStorage};
pub use transport::UploadTransport;
