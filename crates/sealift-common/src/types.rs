use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one upload session. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    Initiated,
    InProgress,
    Completing,
    Completed,
    Aborting,
    Aborted,
    Failed,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Failed)
    }

    /// Caller-triggered abort is only accepted while work is still in flight.
    pub fn accepts_abort(self) -> bool {
        matches!(self, Self::InProgress | Self::Completing)
    }
}

/// One successfully uploaded part, as submitted to the finalize call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    #[serde(rename = "PartNumber")]
    pub part_number: i32,
    #[serde(rename = "ETag")]
    pub etag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    pub key: String,
    pub file_name: String,
    pub size: i64,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
}

#[cfg(test)]
mod tests {
    use super::UploadStatus;

    #[test]
    fn terminal_states_reject_abort() {
        for status in [
            UploadStatus::Completed,
            UploadStatus::Aborted,
            UploadStatus::Failed,
        ] {
            assert!(status.is_terminal());
            assert!(!status.accepts_abort());
        }
        assert!(UploadStatus::InProgress.accepts_abort());
        assert!(UploadStatus::Completing.accepts_abort());
    }
}
