use async_trait::async_trait;
use sealift_common::error::Result;
use sealift_common::types::{CompletedPart, ObjectSummary};

/// Backend object-store operations the gateway brokers. One implementation
/// speaks the S3 REST protocol; tests substitute in-memory fakes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Opens a multipart upload and returns its upload id.
    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> Result<String>;

    /// Issues a short-lived URL authorizing one part upload. Valid ~24h and
    /// never reused across attempts.
    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
    ) -> Result<String>;

    /// Finalizes the upload from a pre-sorted, contiguous part manifest and
    /// returns the object location.
    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<String>;

    /// Releases server-side resources held by an open upload. Idempotent:
    /// aborting an unknown or already-aborted upload succeeds.
    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<()>;

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>>;

    /// Issues a short-lived download URL, valid ~72h.
    async fn presign_download(&self, key: &str) -> Result<String>;

    async fn delete_object(&self, key: &str) -> Result<()>;

    /// Applies the permissive bucket CORS rules browser uploads require.
    async fn configure_cors(&self) -> Result<()>;
}
