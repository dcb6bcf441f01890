use sealift_common::error::{Result, SealiftError};

/// Connection settings for the backing object store. Credentials come from the
/// environment, matching the usual AWS variable names; `S3_ENDPOINT` overrides
/// the public endpoint for S3-compatible stores.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let region =
            std::env::var("AWS_REGION").unwrap_or_else(|_| "ap-northeast-1".to_string());
        let endpoint = std::env::var("S3_ENDPOINT")
            .unwrap_or_else(|_| format!("https://s3.{region}.amazonaws.com"));
        let bucket = require_env("S3_BUCKET")?;
        let access_key = require_env("AWS_ACCESS_KEY_ID")?;
        let secret_key = require_env("AWS_SECRET_ACCESS_KEY")?;

        Ok(Self {
            endpoint,
            region,
            bucket,
            access_key,
            secret_key,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| SealiftError::Validation(format!("{name} is not set")))
}
