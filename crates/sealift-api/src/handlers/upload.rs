use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use sealift_common::error::SealiftError;
use sealift_common::media::infer_content_type;
use sealift_store::traits::ObjectStore;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::require;
use crate::types::{
    AbortUploadRequest, CompleteUploadRequest, CompleteUploadResponse, InitiateUploadRequest,
    InitiateUploadResponse, MessageResponse, SignedUrlQuery, SignedUrlResponse,
};

/// Builds the object key: a randomized prefix in front of the file name
/// spreads keys across storage partitions.
fn prefixed_key(file_name: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}/{file_name}", &id[..8])
}

pub async fn initiate_upload(
    State(store): State<Arc<dyn ObjectStore>>,
    Json(payload): Json<InitiateUploadRequest>,
) -> Result<Json<InitiateUploadResponse>, ApiError> {
    require(&payload.file_name, "fileName")?;
    let content_type = match payload.content_type.as_deref() {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => infer_content_type(&payload.file_name).to_string(),
    };

    let key = prefixed_key(&payload.file_name);
    let upload_id = store.create_multipart_upload(&key, &content_type).await?;
    info!(file_name = %payload.file_name, key, content_type, "upload initiated");

    Ok(Json(InitiateUploadResponse {
        upload_id,
        key,
        message: "multipart upload initiated",
    }))
}

pub async fn get_signed_url(
    State(store): State<Arc<dyn ObjectStore>>,
    Query(query): Query<SignedUrlQuery>,
) -> Result<Json<SignedUrlResponse>, ApiError> {
    require(&query.key, "key")?;
    require(&query.upload_id, "uploadId")?;
    let part_number = query
        .part_number
        .ok_or_else(|| SealiftError::Validation("partNumber is required".to_string()))?;

    let signed_url = store
        .presign_upload_part(&query.key, &query.upload_id, part_number)
        .await?;
    Ok(Json(SignedUrlResponse {
        signed_url,
        part_number,
    }))
}

pub async fn complete_upload(
    State(store): State<Arc<dyn ObjectStore>>,
    Json(payload): Json<CompleteUploadRequest>,
) -> Result<Json<CompleteUploadResponse>, ApiError> {
    require(&payload.key, "key")?;
    require(&payload.upload_id, "uploadId")?;
    if payload.parts.is_empty() {
        return Err(SealiftError::Validation(
            "no parts provided for completion".to_string(),
        )
        .into());
    }
    for part in &payload.parts {
        if part.etag.is_empty() || part.part_number < 1 {
            return Err(SealiftError::Validation(
                "each part must carry an ETag and a positive PartNumber".to_string(),
            )
            .into());
        }
    }

    info!(
        key = %payload.key,
        upload_id = %payload.upload_id,
        parts = payload.parts.len(),
        "completing upload"
    );
    let location = store
        .complete_multipart_upload(&payload.key, &payload.upload_id, payload.parts)
        .await?;

    Ok(Json(CompleteUploadResponse {
        location,
        message: "upload completed",
    }))
}

pub async fn abort_upload(
    State(store): State<Arc<dyn ObjectStore>>,
    Json(payload): Json<AbortUploadRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&payload.key, "key")?;
    require(&payload.upload_id, "uploadId")?;

    store
        .abort_multipart_upload(&payload.key, &payload.upload_id)
        .await?;
    Ok(Json(MessageResponse {
        message: "upload aborted",
    }))
}
