//! # beacon-observability
//!
//! Structured tracing for the upload engine: subscriber setup, span macros,
//! and event helpers with stable field names.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, init_tracing_with_filter};
