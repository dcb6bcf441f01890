//! Transfers one chunk to its presigned URL, streaming the body so byte-level
//! progress is observable.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sealift_common::error::{Result, SealiftError};

/// Observer for one part's upload progress, called with a fraction in 0..=1
/// that never decreases for that part.
pub type PartProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// Part uploads get a longer timeout than the control-plane calls; a 20 MiB
/// body on a slow uplink legitimately takes minutes.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Granularity of progress reporting.
const PROGRESS_FRAME: usize = 64 * 1024;

#[async_trait]
pub trait PartUploader: Send + Sync {
    /// Sends the full chunk body to `url` and returns the ETag the store
    /// assigned. There is no partial resume: any failure discards progress
    /// and a retry resends the entire chunk.
    async fn upload_part(
        &self,
        url: &str,
        part_number: i32,
        body: Bytes,
        on_progress: PartProgressFn,
    ) -> Result<String>;
}

pub struct HttpPartUploader {
    client: reqwest::Client,
}

impl HttpPartUploader {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|err| {
                SealiftError::Store(format!("failed to build upload client: {err}"))
            })?;
        Ok(Self { client })
    }

    /// Wraps the chunk in a frame stream that reports cumulative bytes handed
    /// to the transport. Cumulative counting keeps the fraction monotone.
    fn progress_body(body: Bytes, on_progress: PartProgressFn) -> reqwest::Body {
        let total = body.len().max(1);
        let sent = Arc::new(AtomicUsize::new(0));
        let frames: Vec<Bytes> = (0..body.len())
            .step_by(PROGRESS_FRAME)
            .map(|start| body.slice(start..(start + PROGRESS_FRAME).min(body.len())))
            .collect();

        let stream = futures::stream::iter(frames.into_iter().map(move |frame| {
            let done = sent.fetch_add(frame.len(), Ordering::Relaxed) + frame.len();
            on_progress(done as f64 / total as f64);
            Ok::<_, std::io::Error>(frame)
        }));
        reqwest::Body::wrap_stream(stream)
    }
}

#[async_trait]
impl PartUploader for HttpPartUploader {
    async fn upload_part(
        &self,
        url: &str,
        part_number: i32,
        body: Bytes,
        on_progress: PartProgressFn,
    ) -> Result<String> {
        let content_length = body.len() as u64;
        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header(reqwest::header::CONTENT_LENGTH, content_length)
            .body(Self::progress_body(body, on_progress))
            .send()
            .await
            .map_err(|err| SealiftError::TransientUpload {
                part_number,
                reason: err.to_string(),
            })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(SealiftError::TransientUpload {
                part_number,
                reason: format!("store returned status {status}"),
            });
        }
        if !status.is_success() {
            // 4xx: typically an expired or invalid credential. The attempt is
            // dead, but a retry with a fresh URL may still succeed.
            return Err(SealiftError::PermanentUpload {
                part_number,
                reason: format!("store returned status {status}"),
            });
        }

        response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|value| value.to_str().ok())
            .filter(|etag| !etag.is_empty())
            .map(str::to_string)
            .ok_or_else(|| SealiftError::PermanentUpload {
                part_number,
                reason: "upload response carried no ETag".to_string(),
            })
    }
}
