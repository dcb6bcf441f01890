//! The upload session: ties chunking, scheduling and completion together and
//! owns the session state machine.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use sealift_common::error::{Result, SealiftError};
use sealift_common::media::infer_content_type;
use sealift_common::types::{CompletedPart, UploadStatus};
use tracing::{error, info, warn};

use crate::chunk::plan_chunks;
use crate::complete::validate_part_set;
use crate::config::UploadConfig;
use crate::gateway::{HttpSignerGateway, InitiatedUpload, SignerGateway};
use crate::progress::{ProgressFn, ProgressTracker};
use crate::scheduler::BatchScheduler;
use crate::source::{ChunkSource, FileSource};
use crate::uploader::{HttpPartUploader, PartUploader};

#[derive(Debug, Clone)]
pub struct UploadedObject {
    pub key: String,
    pub location: String,
}

/// Requests cancellation of a running upload. The scheduler observes the flag
/// between batches; parts already in flight are not force-terminated, their
/// results are simply discarded.
#[derive(Clone)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn request_abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

pub struct Uploader {
    gateway: Arc<dyn SignerGateway>,
    parts: Arc<dyn PartUploader>,
    config: UploadConfig,
    status: Mutex<UploadStatus>,
    abort: Arc<AtomicBool>,
}

impl Uploader {
    pub fn new(
        gateway: Arc<dyn SignerGateway>,
        parts: Arc<dyn PartUploader>,
        config: UploadConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            gateway,
            parts,
            config,
            status: Mutex::new(UploadStatus::Initiated),
            abort: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Wires the HTTP gateway and part uploader for a gateway base URL.
    pub fn for_gateway(base_url: impl Into<String>, config: UploadConfig) -> Result<Self> {
        Self::new(
            Arc::new(HttpSignerGateway::new(base_url)?),
            Arc::new(HttpPartUploader::new()?),
            config,
        )
    }

    pub fn status(&self) -> UploadStatus {
        *self.status.lock().unwrap()
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            flag: Arc::clone(&self.abort),
        }
    }

    pub async fn upload_file(
        &self,
        path: &Path,
        progress: Option<ProgressFn>,
    ) -> Result<UploadedObject> {
        let size = tokio::fs::metadata(path).await?.len();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                SealiftError::Validation(format!("path has no usable file name: {}", path.display()))
            })?;
        let source = FileSource::new(path);
        self.upload(&source, size, file_name, None, progress).await
    }

    /// Runs one full upload session. The chunk plan is computed and checked
    /// against the part ceiling before initiate, so an oversized file costs
    /// no round trips at all.
    pub async fn upload(
        &self,
        source: &dyn ChunkSource,
        size: u64,
        file_name: &str,
        content_type: Option<&str>,
        progress: Option<ProgressFn>,
    ) -> Result<UploadedObject> {
        if size == 0 {
            return Err(SealiftError::Validation(
                "cannot upload an empty file: a multipart upload needs at least one part"
                    .to_string(),
            ));
        }
        let chunks = plan_chunks(size, self.config.chunk_size)?;

        let content_type = match content_type {
            Some(value) if !value.is_empty() => value,
            _ => infer_content_type(file_name),
        };

        let initiated = self.gateway.initiate(file_name, content_type).await?;
        self.set_status(UploadStatus::Initiated);
        info!(
            file_name,
            content_type,
            key = %initiated.key,
            upload_id = %initiated.upload_id,
            parts = chunks.len(),
            "upload initiated"
        );

        self.set_status(UploadStatus::InProgress);
        let tracker = ProgressTracker::new(chunks.len(), progress);
        let scheduler = BatchScheduler::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.parts),
            &self.config,
        );
        let results = match scheduler
            .run(
                source,
                &initiated.key,
                &initiated.upload_id,
                &chunks,
                &tracker,
                &self.abort,
            )
            .await
        {
            Ok(results) => results,
            Err(SealiftError::Aborted) => {
                self.abort_session(&initiated).await;
                return Err(SealiftError::Aborted);
            }
            Err(err) => {
                error!(
                    progress = tracker.current(),
                    error = %err,
                    "upload failed before completion"
                );
                self.fail_session(&initiated).await;
                return Err(err);
            }
        };

        let mut parts: Vec<CompletedPart> = results
            .into_iter()
            .filter_map(|slot| {
                slot.etag.map(|etag| CompletedPart {
                    part_number: slot.part_number,
                    etag,
                })
            })
            .collect();
        if let Err(err) = validate_part_set(&mut parts, chunks.len()) {
            error!(error = %err, "part set validation failed, finalize will not be attempted");
            self.fail_session(&initiated).await;
            return Err(err);
        }

        if self.abort.load(Ordering::Relaxed) {
            self.abort_session(&initiated).await;
            return Err(SealiftError::Aborted);
        }

        self.set_status(UploadStatus::Completing);
        match self
            .gateway
            .complete(&initiated.key, &initiated.upload_id, &parts)
            .await
        {
            Ok(location) => {
                tracker.finished();
                self.set_status(UploadStatus::Completed);
                info!(key = %initiated.key, location, "upload completed");
                Ok(UploadedObject {
                    key: initiated.key,
                    location,
                })
            }
            Err(err) => {
                error!(key = %initiated.key, error = %err, "finalize failed, aborting upload");
                self.fail_session(&initiated).await;
                Err(err)
            }
        }
    }

    fn set_status(&self, status: UploadStatus) {
        *self.status.lock().unwrap() = status;
    }

    /// Failure path: Failed, then one compensating abort so the store does
    /// not keep charging for an orphaned upload. An abort failure is logged
    /// and never masks the error that got us here.
    async fn fail_session(&self, initiated: &InitiatedUpload) {
        self.set_status(UploadStatus::Failed);
        self.set_status(UploadStatus::Aborting);
        match self
            .gateway
            .abort(&initiated.key, &initiated.upload_id)
            .await
        {
            Ok(()) => self.set_status(UploadStatus::Aborted),
            Err(abort_err) => {
                warn!(
                    key = %initiated.key,
                    upload_id = %initiated.upload_id,
                    error = %abort_err,
                    "compensating abort failed"
                );
                self.set_status(UploadStatus::Failed);
            }
        }
    }

    /// Caller-triggered abort path.
    async fn abort_session(&self, initiated: &InitiatedUpload) {
        self.set_status(UploadStatus::Aborting);
        if let Err(abort_err) = self
            .gateway
            .abort(&initiated.key, &initiated.upload_id)
            .await
        {
            warn!(
                key = %initiated.key,
                upload_id = %initiated.upload_id,
                error = %abort_err,
                "abort request failed"
            );
        }
        self.set_status(UploadStatus::Aborted);
        info!(key = %initiated.key, "upload aborted by caller");
    }
}
