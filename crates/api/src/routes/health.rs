use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
}

/// Service banner payload for the root route.
#[derive(Serialize)]
pub struct BannerResponse {
    pub message: &'static str,
    pub docs: &'static str,
    pub version: &'static str,
}

/// GET /health -- service liveness.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET / -- service banner.
async fn service_banner() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "framelink video generation API",
        docs: "/api/v1",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Mount root-level routes (NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(service_banner))
        .route("/health", get(health_check))
}
