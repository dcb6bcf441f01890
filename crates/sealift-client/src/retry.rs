use std::sync::Arc;

use sealift_common::error::{Result, SealiftError};
use sealift_common::types::CompletedPart;
use tracing::{info, warn};

use crate::chunk::Chunk;
use crate::gateway::SignerGateway;
use crate::source::ChunkSource;
use crate::uploader::PartUploader;

/// Governs the sequential re-attempts a part gets after its batch attempt
/// failed. Every attempt re-fetches a fresh signed URL (the previous one may
/// be single-use or expired) and resends the whole chunk.
pub struct RetryPolicy {
    budget: u32,
}

impl RetryPolicy {
    pub fn new(budget: u32) -> Self {
        Self { budget }
    }

    /// Runs up to the budgeted attempts for one failed part. Returns the
    /// number of attempts consumed alongside the outcome.
    pub async fn retry_part(
        &self,
        gateway: &dyn SignerGateway,
        uploader: &dyn PartUploader,
        source: &dyn ChunkSource,
        key: &str,
        upload_id: &str,
        chunk: &Chunk,
    ) -> (u32, Result<CompletedPart>) {
        let part_number = chunk.part_number();
        let mut last_error = SealiftError::TransientUpload {
            part_number,
            reason: "no retry attempts configured".to_string(),
        };

        for attempt in 1..=self.budget {
            match self
                .attempt(gateway, uploader, source, key, upload_id, chunk)
                .await
            {
                Ok(part) => {
                    info!(part_number, attempt, "part retry succeeded");
                    return (attempt, Ok(part));
                }
                Err(err) => {
                    warn!(part_number, attempt, error = %err, "part retry failed");
                    last_error = err;
                }
            }
        }

        warn!(part_number, budget = self.budget, "all retries exhausted");
        (self.budget, Err(last_error))
    }

    async fn attempt(
        &self,
        gateway: &dyn SignerGateway,
        uploader: &dyn PartUploader,
        source: &dyn ChunkSource,
        key: &str,
        upload_id: &str,
        chunk: &Chunk,
    ) -> Result<CompletedPart> {
        let part_number = chunk.part_number();
        let url = gateway
            .signed_part_url(key, upload_id, part_number)
            .await?;
        let body = source.read_chunk(chunk).await?;
        let etag = uploader
            .upload_part(&url, part_number, body, Arc::new(|_| {}))
            .await?;
        Ok(CompletedPart { part_number, etag })
    }
}
