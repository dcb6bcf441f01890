//! Mock collaborators shared by the scheduler and session tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sealift_common::error::{Result, SealiftError};
use sealift_common::types::CompletedPart;

use crate::chunk::Chunk;
use crate::gateway::{InitiatedUpload, SignerGateway};
use crate::source::ChunkSource;
use crate::uploader::{PartProgressFn, PartUploader};

pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    pub fn with_len(len: usize) -> Self {
        Self {
            data: Bytes::from(vec![0xabu8; len]),
        }
    }
}

#[async_trait]
impl ChunkSource for MemorySource {
    async fn read_chunk(&self, chunk: &Chunk) -> Result<Bytes> {
        let start = chunk.offset as usize;
        Ok(self.data.slice(start..start + chunk.len as usize))
    }
}

#[derive(Default)]
pub struct MockGateway {
    issued: Mutex<Vec<i32>>,
    pub completed_parts: Mutex<Option<Vec<CompletedPart>>>,
    pub aborts: AtomicUsize,
    pub fail_complete: bool,
}

impl MockGateway {
    pub fn failing_finalize() -> Self {
        Self {
            fail_complete: true,
            ..Self::default()
        }
    }

    pub fn issued_urls(&self) -> Vec<i32> {
        self.issued.lock().unwrap().clone()
    }

    pub fn abort_count(&self) -> usize {
        self.aborts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SignerGateway for MockGateway {
    async fn initiate(&self, _file_name: &str, _content_type: &str) -> Result<InitiatedUpload> {
        Ok(InitiatedUpload {
            upload_id: "upload-1".to_string(),
            key: "ab12cd34/test.bin".to_string(),
        })
    }

    async fn signed_part_url(
        &self,
        _key: &str,
        _upload_id: &str,
        part_number: i32,
    ) -> Result<String> {
        self.issued.lock().unwrap().push(part_number);
        Ok(format!("mock://part/{part_number}"))
    }

    async fn complete(
        &self,
        _key: &str,
        _upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<String> {
        if self.fail_complete {
            return Err(SealiftError::Finalize("manifest rejected".to_string()));
        }
        *self.completed_parts.lock().unwrap() = Some(parts.to_vec());
        Ok("http://store/bucket/ab12cd34/test.bin".to_string())
    }

    async fn abort(&self, _key: &str, _upload_id: &str) -> Result<()> {
        // aborting twice, or an unknown upload, is always fine
        self.aborts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[derive(Default)]
pub struct ScriptedUploader {
    failures: Mutex<HashMap<i32, u32>>,
    attempts: Mutex<HashMap<i32, u32>>,
    concurrent: AtomicUsize,
    pub max_concurrent: AtomicUsize,
    delay: Duration,
}

impl ScriptedUploader {
    pub fn with_delay_ms(millis: u64) -> Self {
        Self {
            delay: Duration::from_millis(millis),
            ..Self::default()
        }
    }

    /// The next `times` attempts for `part_number` fail with a transient
    /// error before attempts start succeeding.
    pub fn fail_times(&self, part_number: i32, times: u32) {
        self.failures.lock().unwrap().insert(part_number, times);
    }

    pub fn attempts_for(&self, part_number: i32) -> u32 {
        self.attempts
            .lock()
            .unwrap()
            .get(&part_number)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PartUploader for ScriptedUploader {
    async fn upload_part(
        &self,
        _url: &str,
        part_number: i32,
        _body: Bytes,
        on_progress: PartProgressFn,
    ) -> Result<String> {
        let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.concurrent.fetch_sub(1, Ordering::SeqCst);

        *self
            .attempts
            .lock()
            .unwrap()
            .entry(part_number)
            .or_insert(0) += 1;

        let should_fail = {
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(&part_number) {
                Some(remaining) if *remaining > 0 => {
                    *remaining = remaining.saturating_sub(1);
                    true
                }
                _ => false,
            }
        };
        if should_fail {
            return Err(SealiftError::TransientUpload {
                part_number,
                reason: "scripted failure".to_string(),
            });
        }

        on_progress(1.0);
        Ok(format!("\"etag-{part_number}\""))
    }
}
