use serde::{Deserialize, Serialize};

/// Terminal outcome of one upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadOutcome {
    NothingToUpload,
    PackagingFailed,
    Succeeded,
    Rejected,
    Failed,
    Aborted,
}

impl UploadOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadOutcome::NothingToUpload => "nothing_to_upload",
            UploadOutcome::PackagingFailed => "packaging_failed",
            UploadOutcome::Succeeded => "succeeded",
            UploadOutcome::Rejected => "rejected",
            UploadOutcome::Failed => "failed",
            UploadOutcome::Aborted => "aborted",
        }
    }

    /// Whether the outcome advances the failure backoff.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            UploadOutcome::PackagingFailed | UploadOutcome::Rejected | UploadOutcome::Failed
        )
    }
}
