use thiserror::Error;

/// Maximum number of parts a single multipart upload may carry. Hard ceiling
/// imposed by the S3 multipart protocol.
pub const MAX_PARTS: usize = 10_000;

#[derive(Debug, Error)]
pub enum SealiftError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("file requires {parts} parts, the store allows at most {max_parts}")]
    TooManyParts { parts: usize, max_parts: usize },
    #[error("credential issuance failed: {0}")]
    Signing(String),
    #[error("transient upload failure for part {part_number}: {reason}")]
    TransientUpload { part_number: i32, reason: String },
    #[error("permanent upload failure for part {part_number}: {reason}")]
    PermanentUpload { part_number: i32, reason: String },
    #[error("{} parts could not be uploaded (parts {parts:?})", parts.len())]
    PartsFailed { parts: Vec<i32> },
    #[error("part set incomplete: {0}")]
    PartSetIncomplete(String),
    #[error("the store rejected the final manifest: {0}")]
    Finalize(String),
    #[error("abort failed: {0}")]
    Abort(String),
    #[error("upload was aborted by the caller")]
    Aborted,
    #[error("store request failed: {0}")]
    Store(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SealiftError {
    pub fn api_error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::TooManyParts { .. } => "TooManyPartsError",
            Self::Signing(_) => "SigningError",
            Self::TransientUpload { .. } => "TransientUploadError",
            Self::PermanentUpload { .. } => "PermanentUploadError",
            Self::PartsFailed { .. } => "PartsFailedError",
            Self::PartSetIncomplete(_) => "PartSetIncompleteError",
            Self::Finalize(_) => "FinalizeError",
            Self::Abort(_) => "AbortError",
            Self::Aborted => "UploadAborted",
            Self::Store(_) => "StoreError",
            Self::Io(_) => "InternalError",
        }
    }

    /// Whether a fresh attempt against a fresh credential may still succeed.
    /// Permanent per-attempt failures stay retryable at the part level because
    /// the next attempt re-requests a credential; only the retry budget ends
    /// the cycle.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransientUpload { .. } | Self::PermanentUpload { .. } | Self::Signing(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SealiftError>;
