use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use framelink_api::config::ServerConfig;
use framelink_api::{routes, state::AppState};
use framelink_core::storage::StorageLayout;
use framelink_dashscope::DashScopeClient;
use framelink_pipeline::fetch::HttpFetcher;
use framelink_pipeline::merge::FfmpegMerger;
use framelink_pipeline::ports::SynthesisJobs;
use framelink_pipeline::SequenceOrchestrator;

/// Ceiling on one multipart request body. Six 10 MiB images plus
/// multipart overhead fit comfortably.
const MAX_BODY_BYTES: usize = 80 * 1024 * 1024;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "framelink_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    if config.dashscope_api_key.is_empty() {
        tracing::warn!("DASHSCOPE_API_KEY is not set; generation endpoints will fail until it is");
    }

    // --- Working directories ---
    let storage = Arc::new(StorageLayout::new(&config.uploads_dir, &config.outputs_dir));
    storage
        .ensure_dirs()
        .await
        .expect("Failed to create working directories");
    tracing::info!(
        uploads = %config.uploads_dir,
        outputs = %config.outputs_dir,
        "Working directories ready"
    );

    // --- Remote client + pipeline ---
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

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- Shutdown token for in-flight runs ---
    let shutdown = tokio_util::sync::CancellationToken::new();

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        storage: Arc::clone(&storage),
        client,
        orchestrator,
        shutdown: shutdown.clone(),
    };

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = Router::new()
        // Root-level routes (banner, health).
        .merge(routes::health::router())
        // API v1 routes.
        .nest("/api/v1", routes::api_routes())
        // Static mounts: transient uploads and produced videos.
        .nest_service("/uploads", ServeDir::new(storage.uploads_dir()))
        .nest_service("/outputs", ServeDir::new(storage.outputs_dir()))
        // -- Middleware stack (applied bottom-up) --
        // Multipart bodies carry several images.
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    // Stop polling in any sequence run that outlived its caller; each run
    // removes its own artifacts on the way out.
    shutdown.cancel();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid, which is the
/// desired behaviour -- we want misconfiguration to fail fast.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
