use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use sealift_store::traits::ObjectStore;
use tracing::info;

use crate::error::ApiError;
use crate::handlers::require;
use crate::types::{
    DeleteFileRequest, DeleteFileResponse, DownloadUrlQuery, DownloadUrlResponse, ListFilesQuery,
    ListFilesResponse, MessageResponse,
};

pub async fn list_files(
    State(store): State<Arc<dyn ObjectStore>>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ListFilesResponse>, ApiError> {
    let files = store.list_objects(&query.prefix).await?;
    let count = files.len();
    Ok(Json(ListFilesResponse { files, count }))
}

pub async fn download_url(
    State(store): State<Arc<dyn ObjectStore>>,
    Query(query): Query<DownloadUrlQuery>,
) -> Result<Json<DownloadUrlResponse>, ApiError> {
    require(&query.key, "key")?;
    let download_url = store.presign_download(&query.key).await?;
    Ok(Json(DownloadUrlResponse { download_url }))
}

pub async fn delete_file(
    State(store): State<Arc<dyn ObjectStore>>,
    Json(payload): Json<DeleteFileRequest>,
) -> Result<Json<DeleteFileResponse>, ApiError> {
    require(&payload.key, "key")?;
    store.delete_object(&payload.key).await?;
    info!(key = %payload.key, "file deleted");
    Ok(Json(DeleteFileResponse {
        success: true,
        message: "file deleted",
    }))
}

pub async fn configure_cors(
    State(store): State<Arc<dyn ObjectStore>>,
) -> Result<Json<MessageResponse>, ApiError> {
    store.configure_cors().await?;
    Ok(Json(MessageResponse {
        message: "cors configured",
    }))
}
