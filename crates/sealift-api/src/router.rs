use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::{Json, Router};
use sealift_store::traits::ObjectStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::types::MessageResponse;

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "sealift gateway is running",
    })
}

pub fn gateway_router(store: Arc<dyn ObjectStore>) -> Router {
    // Browsers upload straight to presigned URLs, so the gateway itself only
    // needs permissive CORS for its JSON control plane.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(86_400));

    Router::new()
        .route("/", get(root))
        .route("/api/initiate-upload", post(handlers::upload::initiate_upload))
        .route("/api/get-signed-url", get(handlers::upload::get_signed_url))
        .route("/api/complete-upload", post(handlers::upload::complete_upload))
        .route("/api/abort-upload", post(handlers::upload::abort_upload))
        .route(
            "/api/files",
            get(handlers::files::list_files).delete(handlers::files::delete_file),
        )
        .route("/api/download-url", get(handlers::files::download_url))
        .route("/api/configure-cors", post(handlers::files::configure_cors))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use http::{Request, StatusCode, header::CONTENT_TYPE};
    use sealift_common::error::Result;
    use sealift_common::types::{CompletedPart, ObjectSummary};
    use sealift_store::traits::ObjectStore;
    use tower::ServiceExt;

    use super::gateway_router;

    #[derive(Default)]
    struct MockStore {
        created: Mutex<Vec<(String, String)>>,
        completions: AtomicUsize,
        aborts: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStore for MockStore {
        async fn create_multipart_upload(&self, key: &str, content_type: &str) -> Result<String> {
            self.created
                .lock()
                .unwrap()
                .push((key.to_string(), content_type.to_string()));
            Ok("upload-1".to_string())
        }

        async fn presign_upload_part(
            &self,
            key: &str,
            upload_id: &str,
            part_number: i32,
        ) -> Result<String> {
            Ok(format!("https://store/{key}?uploadId={upload_id}&partNumber={part_number}"))
        }

        async fn complete_multipart_upload(
            &self,
            key: &str,
            _upload_id: &str,
            _parts: Vec<CompletedPart>,
        ) -> Result<String> {
            self.completions.fetch_add(1, Ordering::Relaxed);
            Ok(format!("https://store/{key}"))
        }

        async fn abort_multipart_upload(&self, _key: &str, _upload_id: &str) -> Result<()> {
            // idempotent, unknown uploads included
            self.aborts.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn list_objects(&self, _prefix: &str) -> Result<Vec<ObjectSummary>> {
            Ok(Vec::new())
        }

        async fn presign_download(&self, key: &str) -> Result<String> {
            Ok(format!("https://store/{key}?download"))
        }

        async fn delete_object(&self, _key: &str) -> Result<()> {
            Ok(())
        }

        async fn configure_cors(&self) -> Result<()> {
            Ok(())
        }
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn initiate_requires_a_file_name() {
        let store = Arc::new(MockStore::default());
        let app = gateway_router(store.clone());
        let response = app
            .oneshot(json_post("/api/initiate-upload", r#"{"contentType":"image/png"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn initiate_infers_content_type_and_prefixes_the_key() {
        let store = Arc::new(MockStore::default());
        let app = gateway_router(store.clone());
        let response = app
            .oneshot(json_post("/api/initiate-upload", r#"{"fileName":"report.pdf"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["uploadId"], "upload-1");
        let key = body["key"].as_str().unwrap();
        assert!(key.ends_with("/report.pdf"));
        assert_eq!(key.find('/'), Some(8));

        let created = store.created.lock().unwrap();
        assert_eq!(created[0].1, "application/pdf");
    }

    #[tokio::test]
    async fn signed_url_requires_all_parameters() {
        let app = gateway_router(Arc::new(MockStore::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/get-signed-url?key=a/b.bin&uploadId=u1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("partNumber"));
    }

    #[tokio::test]
    async fn signed_url_round_trips_the_part_number() {
        let app = gateway_router(Arc::new(MockStore::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/get-signed-url?key=a/b.bin&uploadId=u1&partNumber=7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["partNumber"], 7);
        assert!(body["signedUrl"].as_str().unwrap().contains("partNumber=7"));
    }

    #[tokio::test]
    async fn complete_rejects_an_empty_part_list_without_touching_the_store() {
        let store = Arc::new(MockStore::default());
        let app = gateway_router(store.clone());
        let response = app
            .oneshot(json_post(
                "/api/complete-upload",
                r#"{"key":"a/b.bin","uploadId":"u1","parts":[]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.completions.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn complete_rejects_parts_without_etags() {
        let store = Arc::new(MockStore::default());
        let app = gateway_router(store.clone());
        let response = app
            .oneshot(json_post(
                "/api/complete-upload",
                r#"{"key":"a/b.bin","uploadId":"u1","parts":[{"ETag":"","PartNumber":1}]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.completions.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn complete_with_a_valid_manifest_returns_the_location() {
        let store = Arc::new(MockStore::default());
        let app = gateway_router(store.clone());
        let response = app
            .oneshot(json_post(
                "/api/complete-upload",
                r#"{"key":"a/b.bin","uploadId":"u1","parts":[{"ETag":"\"x\"","PartNumber":1}]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["location"], "https://store/a/b.bin");
    }

    #[tokio::test]
    async fn abort_is_idempotent_at_the_api_surface() {
        let store = Arc::new(MockStore::default());
        for _ in 0..2 {
            let app = gateway_router(store.clone());
            let response = app
                .oneshot(json_post(
                    "/api/abort-upload",
                    r#"{"key":"a/b.bin","uploadId":"unknown"}"#,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(store.aborts.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn list_files_reports_a_count() {
        let app = gateway_router(Arc::new(MockStore::default()));
        let response = app
            .oneshot(Request::builder().uri("/api/files").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 0);
    }
}
