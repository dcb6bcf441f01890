use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use sealift_common::error::SealiftError;

pub struct ApiError(pub SealiftError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SealiftError::Validation(_)
            | SealiftError::TooManyParts { .. }
            | SealiftError::PartSetIncomplete(_) => StatusCode::BAD_REQUEST,
            SealiftError::Signing(_)
            | SealiftError::Finalize(_)
            | SealiftError::Store(_) => StatusCode::BAD_GATEWAY,
            SealiftError::TransientUpload { .. }
            | SealiftError::PermanentUpload { .. }
            | SealiftError::PartsFailed { .. }
            | SealiftError::Abort(_)
            | SealiftError::Aborted
            | SealiftError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.0.to_string(),
            "code": self.0.api_error_code(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<SealiftError> for ApiError {
    fn from(err: SealiftError) -> Self {
        ApiError(err)
    }
}
