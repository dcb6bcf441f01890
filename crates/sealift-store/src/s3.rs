//! S3 REST client: signed requests for the multipart lifecycle and presigned
//! URLs for the browser-facing part upload and download paths.

use std::time::Duration;

use base64::Engine;
use bytes::Bytes;
use chrono::Utc;
use md5::{Digest, Md5};
use quick_xml::{de::from_str as xml_from_str, se::to_string as xml_to_string};
use reqwest::Method;
use sealift_common::error::{MAX_PARTS, Result, SealiftError};
use sealift_common::types::{CompletedPart, ObjectSummary};
use tracing::{debug, info};
use url::Url;

use crate::config::StoreConfig;
use crate::sign::{
    SigningTime, UNSIGNED_PAYLOAD, canonical_query_string, canonical_request, canonical_uri,
    host_header_value, presign_url, sha256_hex, signature, signing_key, string_to_sign,
};
use crate::traits::ObjectStore;
use crate::types::{
    CompleteMultipartUpload, CompleteMultipartUploadResult, CorsConfiguration, ErrorResponse,
    InitiateMultipartUploadResult, ListBucketResult,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const PART_URL_EXPIRY_SECS: u64 = 86_400;
const DOWNLOAD_URL_EXPIRY_SECS: u64 = 259_200;

pub struct S3Store {
    config: StoreConfig,
    endpoint: Url,
    client: reqwest::Client,
}

impl S3Store {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|err| SealiftError::Validation(format!("invalid store endpoint: {err}")))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| SealiftError::Store(format!("failed to build http client: {err}")))?;
        Ok(Self {
            config,
            endpoint,
            client,
        })
    }

    fn bucket_url(&self) -> Result<Url> {
        self.endpoint
            .join(&self.config.bucket)
            .map_err(|err| SealiftError::Store(format!("invalid bucket url: {err}")))
    }

    fn object_url(&self, key: &str) -> Result<Url> {
        self.endpoint
            .join(&format!("{}/{key}", self.config.bucket))
            .map_err(|err| SealiftError::Store(format!("invalid object url for {key}: {err}")))
    }

    /// Sends a header-signed request. Host, payload hash and timestamp make up
    /// the signed header set.
    async fn send_signed(
        &self,
        method: Method,
        url: Url,
        body: Bytes,
        content_type: Option<&str>,
        content_md5: Option<String>,
    ) -> Result<reqwest::Response> {
        let host = host_header_value(&url)
            .ok_or_else(|| SealiftError::Store(format!("store url has no host: {url}")))?;
        let time = SigningTime::at(Utc::now());
        let payload_hash = if body.is_empty() {
            sha256_hex(b"")
        } else {
            sha256_hex(&body)
        };

        let canonical_headers = format!(
            "host:{host}\nx-amz-content-sha256:{payload_hash}\nx-amz-date:{}\n",
            time.amz_date
        );
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";
        let canonical_query = url.query().map(canonical_query_string).unwrap_or_default();
        let request = canonical_request(
            method.as_str(),
            &canonical_uri(url.path()),
            &canonical_query,
            &canonical_headers,
            signed_headers,
            &payload_hash,
        );

        let scope = format!(
            "{}/{}/s3/aws4_request",
            time.short_date, self.config.region
        );
        let to_sign = string_to_sign(&request, &time.amz_date, &scope);
        let key = signing_key(&self.config.secret_key, &time.short_date, &self.config.region);
        let computed = signature(&key, &to_sign);
        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={computed}",
            self.config.access_key
        );

        let mut builder = self
            .client
            .request(method, url)
            .header("Host", host)
            .header("x-amz-date", time.amz_date)
            .header("x-amz-content-sha256", payload_hash)
            .header("Authorization", authorization);
        if let Some(content_type) = content_type {
            builder = builder.header("Content-Type", content_type);
        }
        if let Some(md5) = content_md5 {
            builder = builder.header("Content-MD5", md5);
        }
        if !body.is_empty() {
            builder = builder.body(body);
        }

        builder
            .send()
            .await
            .map_err(|err| SealiftError::Store(format!("store request failed: {err}")))
    }

    /// Pulls the S3 error code out of a failure response body, falling back to
    /// the raw status when the body is not the standard error document.
    async fn failure_details(response: reqwest::Response) -> (u16, String) {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let detail = xml_from_str::<ErrorResponse>(&body)
            .map(|err| {
                if err.message.is_empty() {
                    err.code
                } else {
                    format!("{}: {}", err.code, err.message)
                }
            })
            .unwrap_or_else(|_| format!("status {status}"));
        (status, detail)
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> Result<String> {
        let mut url = self.object_url(key)?;
        url.query_pairs_mut().append_pair("uploads", "");

        let response = self
            .send_signed(Method::POST, url, Bytes::new(), Some(content_type), None)
            .await?;
        if !response.status().is_success() {
            let (_, detail) = Self::failure_details(response).await;
            return Err(SealiftError::Store(format!(
                "create multipart upload failed for {key}: {detail}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| SealiftError::Store(format!("unreadable initiate response: {err}")))?;
        let parsed: InitiateMultipartUploadResult = xml_from_str(&body)
            .map_err(|err| SealiftError::Store(format!("invalid initiate response: {err}")))?;
        info!(key, upload_id = %parsed.upload_id, content_type, "multipart upload created");
        Ok(parsed.upload_id)
    }

    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
    ) -> Result<String> {
        if part_number < 1 || part_number as usize > MAX_PARTS {
            return Err(SealiftError::Validation(format!(
                "partNumber must be between 1 and {MAX_PARTS}, got {part_number}"
            )));
        }

        let mut url = self.object_url(key)?;
        url.query_pairs_mut()
            .append_pair("partNumber", &part_number.to_string())
            .append_pair("uploadId", upload_id);
        presign_url(&self.config, "PUT", &mut url, PART_URL_EXPIRY_SECS, Utc::now())
            .ok_or_else(|| SealiftError::Signing(format!("cannot presign url for {key}")))?;
        debug!(key, part_number, "issued part upload url");
        Ok(url.into())
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<String> {
        let manifest = CompleteMultipartUpload {
            parts: parts.into_iter().map(Into::into).collect(),
        };
        let xml = xml_to_string(&manifest).map_err(|err| {
            SealiftError::Finalize(format!("failed to serialize part manifest: {err}"))
        })?;
        let body = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{xml}");

        let mut url = self.object_url(key)?;
        url.query_pairs_mut().append_pair("uploadId", upload_id);

        let response = self
            .send_signed(
                Method::POST,
                url,
                Bytes::from(body),
                Some("application/xml"),
                None,
            )
            .await?;
        if !response.status().is_success() {
            let (_, detail) = Self::failure_details(response).await;
            return Err(SealiftError::Finalize(detail));
        }

        let body = response
            .text()
            .await
            .map_err(|err| SealiftError::Finalize(format!("unreadable complete response: {err}")))?;
        let parsed: CompleteMultipartUploadResult = xml_from_str(&body)
            .map_err(|err| SealiftError::Finalize(format!("invalid complete response: {err}")))?;
        info!(key, upload_id, "multipart upload completed");
        Ok(parsed.location)
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<()> {
        let mut url = self.object_url(key)?;
        url.query_pairs_mut().append_pair("uploadId", upload_id);

        let response = self
            .send_signed(Method::DELETE, url, Bytes::new(), None, None)
            .await?;
        if response.status().is_success() {
            info!(key, upload_id, "multipart upload aborted");
            return Ok(());
        }

        let (status, detail) = Self::failure_details(response).await;
        // Aborting an unknown or already-aborted upload is a success for the
        // caller; the server-side resources are gone either way.
        if status == 404 || detail.starts_with("NoSuchUpload") {
            debug!(key, upload_id, "abort on unknown upload ignored");
            return Ok(());
        }
        Err(SealiftError::Abort(format!(
            "abort failed for {key} ({upload_id}): {detail}"
        )))
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut url = self.bucket_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("list-type", "2");
            if !prefix.is_empty() {
                pairs.append_pair("prefix", prefix);
            }
        }

        let response = self
            .send_signed(Method::GET, url, Bytes::new(), None, None)
            .await?;
        if !response.status().is_success() {
            let (_, detail) = Self::failure_details(response).await;
            return Err(SealiftError::Store(format!("list objects failed: {detail}")));
        }

        let body = response
            .text()
            .await
            .map_err(|err| SealiftError::Store(format!("unreadable list response: {err}")))?;
        let listing: ListBucketResult = xml_from_str(&body)
            .map_err(|err| SealiftError::Store(format!("invalid list response: {err}")))?;

        Ok(listing
            .contents
            .into_iter()
            .map(|entry| {
                let file_name = entry
                    .key
                    .rsplit('/')
                    .next()
                    .unwrap_or(entry.key.as_str())
                    .to_string();
                ObjectSummary {
                    key: entry.key,
                    file_name,
                    size: entry.size,
                    last_modified: entry.last_modified,
                    etag: entry.etag,
                }
            })
            .collect())
    }

    async fn presign_download(&self, key: &str) -> Result<String> {
        let mut url = self.object_url(key)?;
        presign_url(
            &self.config,
            "GET",
            &mut url,
            DOWNLOAD_URL_EXPIRY_SECS,
            Utc::now(),
        )
        .ok_or_else(|| SealiftError::Signing(format!("cannot presign download for {key}")))?;
        debug!(key, "issued download url");
        Ok(url.into())
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        let url = self.object_url(key)?;
        let response = self
            .send_signed(Method::DELETE, url, Bytes::new(), None, None)
            .await?;
        if !response.status().is_success() {
            let (_, detail) = Self::failure_details(response).await;
            return Err(SealiftError::Store(format!(
                "delete failed for {key}: {detail}"
            )));
        }
        info!(key, "object deleted");
        Ok(())
    }

    async fn configure_cors(&self) -> Result<()> {
        let xml = xml_to_string(&CorsConfiguration::permissive())
            .map_err(|err| SealiftError::Store(format!("failed to serialize cors rules: {err}")))?;
        let body = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{xml}");
        let content_md5 =
            base64::engine::general_purpose::STANDARD.encode(Md5::digest(body.as_bytes()));

        let mut url = self.bucket_url()?;
        url.query_pairs_mut().append_pair("cors", "");

        let response = self
            .send_signed(
                Method::PUT,
                url,
                Bytes::from(body),
                Some("application/xml"),
                Some(content_md5),
            )
            .await?;
        if !response.status().is_success() {
            let (_, detail) = Self::failure_details(response).await;
            return Err(SealiftError::Store(format!("cors configuration failed: {detail}")));
        }
        info!(bucket = %self.config.bucket, "bucket cors configured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> S3Store {
        S3Store::new(StoreConfig {
            endpoint: "https://s3.us-east-1.amazonaws.com".to_string(),
            region: "us-east-1".to_string(),
            bucket: "media".to_string(),
            access_key: "AKIDEXAMPLE".to_string(),
            secret_key: "secret".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn presigned_part_url_targets_the_object_with_part_query() {
        let url = store()
            .presign_upload_part("ab12cd34/video.mp4", "upload-1", 3)
            .await
            .unwrap();
        assert!(url.starts_with("https://s3.us-east-1.amazonaws.com/media/ab12cd34/video.mp4?"));
        assert!(url.contains("partNumber=3"));
        assert!(url.contains("uploadId=upload-1"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    async fn presign_rejects_out_of_range_part_numbers() {
        let store = store();
        assert!(matches!(
            store.presign_upload_part("k", "u", 0).await,
            Err(SealiftError::Validation(_))
        ));
        assert!(matches!(
            store.presign_upload_part("k", "u", 10_001).await,
            Err(SealiftError::Validation(_))
        ));
    }
}
