//! # beacon-scheduler
//!
//! Decides when staged records are uploaded.
//! - [`WorkerDispatcher`]: single-threaded timer sequencer.
//! - [`UploadScheduler`]: arrival, timer, and completion handling.

pub mod dispatcher;
pub mod scheduler;

pub use dispatcher::{Task, TaskDispatcher, TaskHandle, WorkerDispatcher};
pub use scheduler::{Collaborators, UploadScheduler};
