//! HTTP client for the gateway's signing and lifecycle endpoints.

use std::time::Duration;

use async_trait::async_trait;
use sealift_common::error::{Result, SealiftError};
use sealift_common::types::CompletedPart;
use serde::{Deserialize, Serialize};

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct InitiatedUpload {
    pub upload_id: String,
    pub key: String,
}

/// The credential-issuance and lifecycle operations the orchestrator consumes.
/// A signed URL is requested per attempt and never reused: it may be
/// single-use or expired by the time a retry runs.
#[async_trait]
pub trait SignerGateway: Send + Sync {
    async fn initiate(&self, file_name: &str, content_type: &str) -> Result<InitiatedUpload>;

    async fn signed_part_url(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
    ) -> Result<String>;

    async fn complete(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<String>;

    async fn abort(&self, key: &str, upload_id: &str) -> Result<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitiateRequest<'a> {
    file_name: &'a str,
    content_type: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiateResponse {
    upload_id: String,
    key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedUrlResponse {
    signed_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteRequest<'a> {
    key: &'a str,
    upload_id: &'a str,
    parts: &'a [CompletedPart],
}

#[derive(Deserialize)]
struct CompleteResponse {
    location: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AbortRequest<'a> {
    key: &'a str,
    upload_id: &'a str,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: String,
}

pub struct HttpSignerGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSignerGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|err| SealiftError::Signing(format!("failed to build http client: {err}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Reads the gateway's `{"error": ...}` body, falling back to the status code.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ApiErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("gateway returned status {status}"),
    }
}

#[async_trait]
impl SignerGateway for HttpSignerGateway {
    async fn initiate(&self, file_name: &str, content_type: &str) -> Result<InitiatedUpload> {
        let response = self
            .client
            .post(self.endpoint("/api/initiate-upload"))
            .json(&InitiateRequest {
                file_name,
                content_type,
            })
            .send()
            .await
            .map_err(|err| SealiftError::Signing(format!("initiate request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(SealiftError::Signing(error_detail(response).await));
        }
        let body: InitiateResponse = response
            .json()
            .await
            .map_err(|err| SealiftError::Signing(format!("invalid initiate response: {err}")))?;
        Ok(InitiatedUpload {
            upload_id: body.upload_id,
            key: body.key,
        })
    }

    async fn signed_part_url(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
    ) -> Result<String> {
        let response = self
            .client
            .get(self.endpoint("/api/get-signed-url"))
            .query(&[
                ("key", key),
                ("uploadId", upload_id),
                ("partNumber", &part_number.to_string()),
            ])
            .send()
            .await
            .map_err(|err| SealiftError::Signing(format!("signed url request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(SealiftError::Signing(error_detail(response).await));
        }
        let body: SignedUrlResponse = response
            .json()
            .await
            .map_err(|err| SealiftError::Signing(format!("invalid signed url response: {err}")))?;
        Ok(body.signed_url)
    }

    async fn complete(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint("/api/complete-upload"))
            .json(&CompleteRequest {
                key,
                upload_id,
                parts,
            })
            .send()
            .await
            .map_err(|err| SealiftError::Finalize(format!("complete request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(SealiftError::Finalize(error_detail(response).await));
        }
        let body: CompleteResponse = response
            .json()
            .await
            .map_err(|err| SealiftError::Finalize(format!("invalid complete response: {err}")))?;
        Ok(body.location)
    }

    async fn abort(&self, key: &str, upload_id: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("/api/abort-upload"))
            .json(&AbortRequest { key, upload_id })
            .send()
            .await
            .map_err(|err| SealiftError::Abort(format!("abort request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(SealiftError::Abort(error_detail(response).await));
        }
        Ok(())
    }
}
