pub mod error;
pub mod media;
pub mod types;

pub use error::{Result, SealiftError};
pub use types::{CompletedPart, ObjectSummary, UploadStatus};
