pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::generator;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// POST /generate            two keyframes -> remote task (passthrough)
/// GET  /status/{task_id}    point-in-time remote task status
/// GET  /wait/{task_id}      block until the remote task is terminal
/// POST /generate-sequence   N keyframes -> merged video (pipeline)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generator::generate))
        .route("/status/{task_id}", get(generator::status))
        .route("/wait/{task_id}", get(generator::wait))
        .route("/generate-sequence", post(generator::generate_sequence))
}
