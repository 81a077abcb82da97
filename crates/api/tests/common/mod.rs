//! Shared helpers for the API integration tests.
//!
//! Mirrors the router construction in `main.rs` so tests exercise the
//! same middleware stack (CORS, request ID, timeout, panic recovery,
//! body limit) that production uses — on top of temp working directories
//! and a remote base URL pointing at a closed local port, so no test can
//! reach a real remote service.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use framelink_api::config::ServerConfig;
use framelink_api::routes;
use framelink_api::state::AppState;
use framelink_core::storage::StorageLayout;
use framelink_dashscope::DashScopeClient;
use framelink_pipeline::fetch::HttpFetcher;
use framelink_pipeline::merge::FfmpegMerger;
use framelink_pipeline::ports::SynthesisJobs;
use framelink_pipeline::SequenceOrchestrator;

/// Ceiling on one multipart request body, matching the production value.
const MAX_BODY_BYTES: usize = 80 * 1024 * 1024;

/// Build a test `ServerConfig` with safe defaults and the given working
/// directories.
///
/// The remote base URL targets a closed local port, so any request that
/// unexpectedly reaches the remote client fails fast instead of leaving
/// the test suite hanging on a network call.
pub fn test_config(uploads_dir: &Path, outputs_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        server_url: "http://localhost:8000".to_string(),
        uploads_dir: uploads_dir.to_string_lossy().to_string(),
        outputs_dir: outputs_dir.to_string_lossy().to_string(),
        dashscope_api_key: "sk-test".to_string(),
        dashscope_base_url: "http://127.0.0.1:1".to_string(),
        model: "wan2.2-kf2v-flash".to_string(),
        resolution: "720P".to_string(),
        default_prompt: "test transition".to_string(),
        sequence_image_count: 6,
        poll_interval_secs: 2,
        poll_max_attempts: 2,
        download_timeout_secs: 5,
    }
}

/// Build the full application router rooted at `root` (the uploads and
/// outputs areas are created under it).
pub fn build_test_app(root: &Path) -> Router {
    let uploads = root.join("uploads");
    let outputs = root.join("outputs");
    std::fs::create_dir_all(&uploads).unwrap();
    std::fs::create_dir_all(&outputs).unwrap();

    let config = test_config(&uploads, &outputs);
    let storage = Arc::new(StorageLayout::new(&uploads, &outputs));

    let client = Arc::new(DashScopeClient::new(
        config.dashscope_base_url.clone(),
        config.dashscope_api_key.clone(),
        config.model.clone(),
        config.resolution.clone(),
    ));
    let orchestrator = Arc::new(SequenceOrchestrator::new(
        Arc::clone(&client) as Arc<dyn SynthesisJobs>,
        Arc::new(HttpFetcher::new(Duration::from_secs(
            config.download_timeout_secs,
        ))),
        Arc::new(FfmpegMerger),
        storage.outputs_dir().to_path_buf(),
        config.poll_config(),
    ));

    let state = AppState {
        config: Arc::new(config),
        storage: Arc::clone(&storage),
        client,
        orchestrator,
        shutdown: CancellationToken::new(),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .nest_service("/uploads", ServeDir::new(storage.uploads_dir()))
        .nest_service("/outputs", ServeDir::new(storage.outputs_dir()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub const MULTIPART_BOUNDARY: &str = "framelink-test-boundary";

/// One part of a hand-built multipart body.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content: &'a [u8],
}

/// Assemble a `multipart/form-data` body from parts.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
        }
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

/// Issue a multipart POST request against the app.
pub async fn post_multipart(app: Router, uri: &str, parts: &[Part<'_>]) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Minimal valid PNG content for upload fixtures.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::new(4, 4);
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
