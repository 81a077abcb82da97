//! REST API client for the DashScope HTTP endpoints.
//!
//! Wraps asynchronous task submission and status retrieval using
//! [`reqwest`]. The video synthesis endpoint is called with the
//! `X-DashScope-Async` header so submission returns a task id immediately
//! instead of blocking on generation.

use serde::de::DeserializeOwned;

use crate::task::{SubmitResponse, TaskPoll, TaskPollResponse};

/// HTTP client for the DashScope synthesis API.
pub struct DashScopeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    resolution: String,
}

/// Parameters for one keyframe-pair synthesis job.
///
/// The frame URLs must be reachable by the remote service; the boundary
/// layer builds them from the public server URL and the uploads mount.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub first_frame_url: String,
    pub last_frame_url: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
}

/// Errors from the DashScope REST layer.
#[derive(Debug, thiserror::Error)]
pub enum DashScopeError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// DashScope returned a non-2xx status code.
    #[error("DashScope API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl DashScopeClient {
    /// Create a new API client.
    ///
    /// * `base_url` - API root, e.g. `https://dashscope.aliyuncs.com/api/v1`.
    /// * `model` / `resolution` - generation parameters applied to every
    ///   submitted job; one run never mixes them.
    pub fn new(base_url: String, api_key: String, model: String, resolution: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
            resolution,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling).
    pub fn with_client(
        client: reqwest::Client,
        base_url: String,
        api_key: String,
        model: String,
        resolution: String,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
            resolution,
        }
    }

    /// Whether an API key has been configured.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Submit a keyframe-pair job for asynchronous generation.
    ///
    /// Sends `POST /services/aigc/video-generation/video-synthesis` and
    /// returns the server-assigned task handle.
    pub async fn submit(&self, request: &SynthesisRequest) -> Result<SubmitResponse, DashScopeError> {
        let response = self
            .client
            .post(format!(
                "{}/services/aigc/video-generation/video-synthesis",
                self.base_url
            ))
            .bearer_auth(&self.api_key)
            .header("X-DashScope-Async", "enable")
            .json(&self.submit_body(request))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Retrieve the current status of a task.
    ///
    /// Sends `GET /tasks/{task_id}`. The returned view carries the video
    /// URL once the task has succeeded, or code/message detail on failure.
    pub async fn fetch_task(&self, task_id: &str) -> Result<TaskPoll, DashScopeError> {
        let response = self
            .client
            .get(format!("{}/tasks/{}", self.base_url, task_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let envelope: TaskPollResponse = Self::parse_response(response).await?;
        Ok(envelope.output)
    }

    // ---- private helpers ----

    /// Build the submission body from the request and client configuration.
    fn submit_body(&self, request: &SynthesisRequest) -> serde_json::Value {
        let mut input = serde_json::json!({
            "first_frame_url": request.first_frame_url,
            "last_frame_url": request.last_frame_url,
            "prompt": request.prompt,
        });
        if let Some(negative) = &request.negative_prompt {
            input["negative_prompt"] = serde_json::Value::String(negative.clone());
        }

        serde_json::json!({
            "model": self.model,
            "input": input,
            "parameters": {
                "resolution": self.resolution,
                "prompt_extend": true,
            },
        })
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`DashScopeError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DashScopeError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DashScopeError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DashScopeError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
