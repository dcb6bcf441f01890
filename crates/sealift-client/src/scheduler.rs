//! Batch-barrier scheduling: parts go out in consecutive batches of K, the
//! whole batch settles (including sequential retries) before the next one
//! starts. Results live in a slot array indexed by part number, so aggregation
//! is race-free no matter the completion order within a batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sealift_common::error::{Result, SealiftError};
use tracing::{debug, warn};

use crate::chunk::Chunk;
use crate::config::UploadConfig;
use crate::gateway::SignerGateway;
use crate::progress::ProgressTracker;
use crate::retry::RetryPolicy;
use crate::source::ChunkSource;
use crate::uploader::{PartProgressFn, PartUploader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartState {
    Pending,
    Uploading,
    Succeeded,
    Failed,
}

/// Outcome slot for one part. Each slot has a single writer (the scheduler
/// loop); upload futures only return values, they never touch shared state.
#[derive(Debug, Clone)]
pub struct PartResult {
    pub part_number: i32,
    pub etag: Option<String>,
    pub state: PartState,
    pub attempts: u32,
}

pub struct BatchScheduler {
    gateway: Arc<dyn SignerGateway>,
    uploader: Arc<dyn PartUploader>,
    retry: RetryPolicy,
    concurrency_limit: usize,
}

impl BatchScheduler {
    pub fn new(
        gateway: Arc<dyn SignerGateway>,
        uploader: Arc<dyn PartUploader>,
        config: &UploadConfig,
    ) -> Self {
        Self {
            gateway,
            uploader,
            retry: RetryPolicy::new(config.retry_budget),
            concurrency_limit: config.concurrency_limit.max(1),
        }
    }

    /// Uploads every chunk and returns the filled slot array. Parts that
    /// exhaust their retries stay Failed; the remaining chunks are still
    /// evaluated and the aggregate failure surfaces only at the end, naming
    /// every failed part.
    pub async fn run(
        &self,
        source: &dyn ChunkSource,
        key: &str,
        upload_id: &str,
        chunks: &[Chunk],
        progress: &ProgressTracker,
        abort: &AtomicBool,
    ) -> Result<Vec<PartResult>> {
        let mut slots: Vec<PartResult> = chunks
            .iter()
            .map(|chunk| PartResult {
                part_number: chunk.part_number(),
                etag: None,
                state: PartState::Pending,
                attempts: 0,
            })
            .collect();

        let total_batches = chunks.len().div_ceil(self.concurrency_limit);
        for (batch_index, batch) in chunks.chunks(self.concurrency_limit).enumerate() {
            if abort.load(Ordering::Relaxed) {
                debug!(batch = batch_index + 1, "abort observed, stopping batch submission");
                return Err(SealiftError::Aborted);
            }
            debug!(
                batch = batch_index + 1,
                total_batches,
                parts = batch.len(),
                "processing batch"
            );

            for chunk in batch {
                slots[chunk.index].state = PartState::Uploading;
            }

            // Everything in the batch runs concurrently and the whole batch
            // settles before any retry begins.
            let settled = futures::future::join_all(batch.iter().map(|chunk| async {
                let outcome = self
                    .attempt_part(source, key, upload_id, chunk, progress)
                    .await;
                (*chunk, outcome)
            }))
            .await;

            let mut failed_in_batch = Vec::new();
            for (chunk, outcome) in settled {
                let slot = &mut slots[chunk.index];
                slot.attempts += 1;
                match outcome {
                    Ok(etag) => {
                        slot.etag = Some(etag);
                        slot.state = PartState::Succeeded;
                    }
                    Err(err) => {
                        warn!(part_number = slot.part_number, error = %err, "part failed in batch");
                        slot.state = PartState::Failed;
                        failed_in_batch.push(chunk);
                    }
                }
            }

            // One at a time, to avoid amplifying load while recovering.
            for chunk in failed_in_batch {
                let (attempts, outcome) = self
                    .retry
                    .retry_part(
                        self.gateway.as_ref(),
                        self.uploader.as_ref(),
                        source,
                        key,
                        upload_id,
                        &chunk,
                    )
                    .await;
                let slot = &mut slots[chunk.index];
                slot.attempts += attempts;
                if let Ok(part) = outcome {
                    slot.etag = Some(part.etag);
                    slot.state = PartState::Succeeded;
                    progress.part_progress(chunk.index, 1.0);
                }
            }
        }

        let failed_parts: Vec<i32> = slots
            .iter()
            .filter(|slot| slot.state != PartState::Succeeded)
            .map(|slot| slot.part_number)
            .collect();
        if !failed_parts.is_empty() {
            return Err(SealiftError::PartsFailed {
                parts: failed_parts,
            });
        }
        Ok(slots)
    }

    async fn attempt_part(
        &self,
        source: &dyn ChunkSource,
        key: &str,
        upload_id: &str,
        chunk: &Chunk,
        progress: &ProgressTracker,
    ) -> Result<String> {
        let part_number = chunk.part_number();
        let url = self
            .gateway
            .signed_part_url(key, upload_id, part_number)
            .await?;
        let body = source.read_chunk(chunk).await?;

        let tracker = progress.clone();
        let index = chunk.index;
        let on_progress: PartProgressFn =
            Arc::new(move |fraction| tracker.part_progress(index, fraction));
        self.uploader
            .upload_part(&url, part_number, body, on_progress)
            .await
    }
}
