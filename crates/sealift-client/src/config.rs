use sealift_common::error::{Result, SealiftError};

/// 20 MiB parts keep a 100 GB file comfortably under the 10000-part ceiling.
pub const DEFAULT_CHUNK_SIZE: u64 = 20 * 1024 * 1024;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;
pub const DEFAULT_RETRY_BUDGET: u32 = 3;

/// Per-session tuning for the orchestrator. Passed in explicitly rather than
/// read from globals so sessions and tests can configure themselves
/// independently.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Bytes per part; every part but the last has exactly this size.
    pub chunk_size: u64,
    /// Maximum number of parts in flight simultaneously.
    pub concurrency_limit: usize,
    /// Additional sequential attempts per part after its batch attempt fails.
    pub retry_budget: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

impl UploadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(SealiftError::Validation(
                "chunk size must be at least one byte".to_string(),
            ));
        }
        if self.concurrency_limit == 0 {
            return Err(SealiftError::Validation(
                "concurrency limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
