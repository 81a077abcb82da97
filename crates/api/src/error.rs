use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use framelink_core::error::CoreError;
use framelink_dashscope::DashScopeError;
use framelink_pipeline::PipelineError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain error types and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `framelink_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The remote synthesis service rejected a call or was unreachable.
    #[error(transparent)]
    Remote(#[from] DashScopeError),

    /// A sequence run failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
                }
            },

            // --- Remote service errors ---
            AppError::Remote(remote) => classify_remote_error(remote),

            // --- Pipeline errors ---
            AppError::Pipeline(pipeline) => classify_pipeline_error(pipeline),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a remote-service error into an HTTP status, code, and message.
///
/// Both a rejection and an unreachable service surface as 502: the
/// failure belongs to the upstream collaborator, not to this service or
/// the caller.
fn classify_remote_error(err: &DashScopeError) -> (StatusCode, &'static str, String) {
    match err {
        DashScopeError::Api { status, body } => (
            StatusCode::BAD_GATEWAY,
            "REMOTE_REJECTED",
            format!("Synthesis service returned {status}: {body}"),
        ),
        DashScopeError::Request(e) => (
            StatusCode::BAD_GATEWAY,
            "REMOTE_UNREACHABLE",
            format!("Synthesis service unreachable: {e}"),
        ),
    }
}

/// Classify a pipeline error.
///
/// - bad input maps to 400;
/// - a remote rejection during fan-out maps to 502;
/// - everything else (timeouts, remote failures, retrieval, merge) is a
///   500 on this service's side of the contract.
fn classify_pipeline_error(err: &PipelineError) -> (StatusCode, &'static str, String) {
    match err {
        PipelineError::InsufficientImages { .. } => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
        }
        PipelineError::Submission { .. } => {
            (StatusCode::BAD_GATEWAY, "SUBMISSION_FAILED", err.to_string())
        }
        other => {
            tracing::error!(error = %other, "Pipeline failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PIPELINE_FAILED",
                other.to_string(),
            )
        }
    }
}
