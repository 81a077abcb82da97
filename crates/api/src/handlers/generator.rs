//! Handlers for the video generation endpoints.
//!
//! `generate` is the single-pair passthrough (two keyframes, one remote
//! task); `generate_sequence` drives the full pipeline. Uploads are
//! transient in both paths: the passthrough deletes them right after the
//! submission attempt, the sequence path hands them to the orchestrator,
//! which owns cleanup from there.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;

use framelink_core::{images, naming};
use framelink_dashscope::{SynthesisRequest, TaskPoll};
use framelink_pipeline::{cleanup, ImageRef, SequenceInput};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ── Response payloads ────────────────────────────────────────────────

/// Response for the single-pair generation endpoint.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub task_id: String,
    pub status: &'static str,
    pub message: String,
}

/// Response for the status and wait endpoints.
#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub task_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Response for the sequence endpoint.
#[derive(Debug, Serialize)]
pub struct SequenceResponse {
    pub run_id: String,
    pub status: &'static str,
    pub message: String,
    pub total_segments: usize,
    pub processed_segments: usize,
    pub merged_video_url: String,
}

// ── Multipart ingestion ──────────────────────────────────────────────

/// One validated, saved upload.
struct SavedImage {
    filename: String,
    path: PathBuf,
}

/// Fields accepted by the generation endpoints.
struct UploadForm {
    images: Vec<SavedImage>,
    prompt: Option<String>,
    negative_prompt: Option<String>,
}

/// Drain a multipart request: save every `files` field through
/// validation, capture the optional `prompt` and `negative_prompt`
/// fields. On any error the already-saved files are removed before
/// returning.
async fn read_upload_form(state: &AppState, mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut images: Vec<SavedImage> = Vec::new();
    let mut prompt = None;
    let mut negative_prompt = None;

    let result: AppResult<()> = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().map(|n| n.to_string());
            match name.as_deref() {
                Some("prompt") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if !text.trim().is_empty() {
                        prompt = Some(text);
                    }
                }
                Some("negative_prompt") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if !text.trim().is_empty() {
                        negative_prompt = Some(text);
                    }
                }
                Some("files") => {
                    let original = field.file_name().unwrap_or("unknown").to_string();
                    let ext = images::validate_image_extension(&original)?;

                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    images::validate_image_size(&original, data.len())?;
                    images::probe_dimensions(&original, &data)?;

                    let filename = naming::upload_filename(&ext);
                    let path = state.storage.upload_path(&filename);
                    tokio::fs::write(&path, &data).await.map_err(|e| {
                        AppError::InternalError(format!("Failed to save {original}: {e}"))
                    })?;
                    images.push(SavedImage { filename, path });
                }
                _ => {}
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = result {
        discard(&images).await;
        return Err(e);
    }

    Ok(UploadForm {
        images,
        prompt,
        negative_prompt,
    })
}

/// Remove a set of saved uploads, best-effort.
async fn discard(images: &[SavedImage]) {
    let paths: Vec<PathBuf> = images.iter().map(|i| i.path.clone()).collect();
    cleanup::remove_all_quietly(&paths).await;
}

fn require_api_key(state: &AppState) -> AppResult<()> {
    if !state.client.has_api_key() {
        return Err(AppError::InternalError(
            "DASHSCOPE_API_KEY is not configured; set it in the environment or .env".into(),
        ));
    }
    Ok(())
}

fn task_status_response(poll: TaskPoll) -> TaskStatusResponse {
    TaskStatusResponse {
        message: Some(format!("Task status: {}", poll.task_status.as_str())),
        task_status: poll.task_status.as_str(),
        task_id: poll.task_id,
        video_url: poll.video_url,
        code: poll.code,
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

/// POST /api/v1/generate
///
/// Upload exactly two keyframes and submit one remote generation task.
/// The saved images are deleted after the submission attempt regardless
/// of its outcome; the remote service fetches them during the call.
pub async fn generate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<GenerateResponse>> {
    require_api_key(&state)?;

    let form = read_upload_form(&state, multipart).await?;
    if form.images.len() != 2 {
        discard(&form.images).await;
        return Err(AppError::BadRequest(format!(
            "Expected 2 image files, got {}",
            form.images.len()
        )));
    }

    let request = SynthesisRequest {
        first_frame_url: state.config.upload_url(&form.images[0].filename),
        last_frame_url: state.config.upload_url(&form.images[1].filename),
        prompt: form
            .prompt
            .unwrap_or_else(|| state.config.default_prompt.clone()),
        negative_prompt: form.negative_prompt,
    };

    let submitted = state.client.submit(&request).await;
    discard(&form.images).await;
    let response = submitted?;

    tracing::info!(task_id = %response.output.task_id, "Generation task submitted");

    Ok(Json(GenerateResponse {
        task_id: response.output.task_id,
        status: "submitted",
        message: format!(
            "Generation task submitted using files: {}, {}",
            form.images[0].filename, form.images[1].filename
        ),
    }))
}

/// GET /api/v1/status/{task_id}
///
/// Point-in-time status passthrough; never waits.
pub async fn status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<Json<TaskStatusResponse>> {
    require_api_key(&state)?;

    let poll = state.client.fetch_task(&task_id).await?;
    Ok(Json(task_status_response(poll)))
}

/// GET /api/v1/wait/{task_id}
///
/// Poll the task under the same pacing as the pipeline until it reaches
/// a terminal state. Transient status-check failures consume an attempt
/// and are retried; ceiling exhaustion is a 500.
pub async fn wait(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<Json<TaskStatusResponse>> {
    require_api_key(&state)?;

    let poll_config = state.config.poll_config();
    for attempt in 1..=poll_config.max_attempts {
        match state.client.fetch_task(&task_id).await {
            Ok(poll) if poll.task_status.is_terminal() => {
                return Ok(Json(task_status_response(poll)));
            }
            Ok(poll) => {
                tracing::debug!(
                    task_id = %task_id,
                    attempt,
                    status = poll.task_status.as_str(),
                    "Task still in progress"
                );
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, attempt, error = %e, "Status check failed; will retry");
            }
        }
        if attempt < poll_config.max_attempts {
            tokio::time::sleep(poll_config.interval).await;
        }
    }

    Err(AppError::InternalError(format!(
        "Task {task_id} did not finish within {} poll attempts",
        poll_config.max_attempts
    )))
}

/// POST /api/v1/generate-sequence
///
/// Upload the configured number of keyframes and run the full pipeline:
/// one job per consecutive pair, polled to completion, downloaded, and
/// merged into a single video addressable under `/outputs`. The run
/// executes on a spawned task, so a client disconnect does not abort
/// in-flight generation or its cleanup.
pub async fn generate_sequence(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<SequenceResponse>> {
    require_api_key(&state)?;

    let form = read_upload_form(&state, multipart).await?;
    let expected = state.config.sequence_image_count;
    if form.images.len() != expected {
        discard(&form.images).await;
        return Err(AppError::BadRequest(format!(
            "Expected {expected} image files for a sequence, got {}",
            form.images.len()
        )));
    }

    let input = SequenceInput {
        run_id: uuid::Uuid::new_v4().to_string(),
        images: form
            .images
            .iter()
            .map(|image| ImageRef {
                path: image.path.clone(),
                url: state.config.upload_url(&image.filename),
            })
            .collect(),
        prompt: form
            .prompt
            .unwrap_or_else(|| state.config.default_prompt.clone()),
        negative_prompt: form.negative_prompt,
    };

    let orchestrator = Arc::clone(&state.orchestrator);
    let cancel = state.shutdown.child_token();
    let run = tokio::spawn(async move { orchestrator.run(input, cancel).await });

    let outcome = run
        .await
        .map_err(|e| AppError::InternalError(format!("Sequence task failed: {e}")))??;

    let merged_video_url = state
        .config
        .output_url(&naming::merged_filename(&outcome.run_id));

    Ok(Json(SequenceResponse {
        run_id: outcome.run_id,
        status: "completed",
        message: format!("Merged {} segments", outcome.processed_segments),
        total_segments: outcome.total_segments,
        processed_segments: outcome.processed_segments,
        merged_video_url,
    }))
}
