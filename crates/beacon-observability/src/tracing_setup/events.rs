//! Structured log events with stable field names.
//!
//! Each helper emits exactly one `tracing` event under the `beacon` target.

use beacon_core::models::{LatencyTier, UploadOutcome};
use std::fmt::Display;

/// An upload attempt was handed to the transport.
pub fn upload_initiated(ctx_id: &impl Display, tier: LatencyTier, records: usize, bytes: usize) {
    tracing::info!(
        target: "beacon",
        event = "upload_initiated",
        ctx_id = %ctx_id,
        tier = %tier,
        records,
        bytes,
        "upload initiated"
    );
}

/// An upload attempt reached a terminal outcome.
pub fn upload_finished(ctx_id: &impl Display, outcome: UploadOutcome, records: usize) {
    if outcome.is_failure() {
        tracing::warn!(
            target: "beacon",
            event = "upload_finished",
            ctx_id = %ctx_id,
            outcome = outcome.as_str(),
            records,
            "upload finished"
        );
    } else {
        tracing::info!(
            target: "beacon",
            event = "upload_finished",
            ctx_id = %ctx_id,
            outcome = outcome.as_str(),
            records,
            "upload finished"
        );
    }
}

/// The next round was pushed out by the failure backoff.
pub fn upload_backoff(delay_ms: u64, tier: LatencyTier) {
    tracing::warn!(
        target: "beacon",
        event = "upload_backoff",
        delay_ms,
        tier = %tier,
        "upload backing off"
    );
}

/// Records left the store without being uploaded.
pub fn records_dropped(count: usize, reason: &str) {
    tracing::warn!(
        target: "beacon",
        event = "records_dropped",
        count,
        reason,
        "records dropped"
    );
}

/// The active transmit profile changed.
pub fn profile_switched(from: &str, to: &str) {
    tracing::info!(
        target: "beacon",
        event = "profile_switched",
        from,
        to,
        "transmit profile switched"
    );
}

/// The clock-skew exchange completed, by response or by timeout.
pub fn clock_skew_resolved(delta: &str, timed_out: bool) {
    tracing::info!(
        target: "beacon",
        event = "clock_skew_resolved",
        delta,
        timed_out,
        "clock skew resolved"
    );
}
