//! Seams between the orchestrator and its collaborators.
//!
//! Object-safe, so the orchestrator runs against the real DashScope
//! client, streaming fetcher, and ffmpeg merger in production, and against
//! in-memory stubs in tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use framelink_core::ffmpeg::FfmpegError;
use framelink_dashscope::{DashScopeClient, SynthesisRequest, TaskPoll};

use crate::error::PortError;

/// Remote job submission and status retrieval.
#[async_trait]
pub trait SynthesisJobs: Send + Sync {
    /// Submit one keyframe-pair job; returns the remote task id.
    async fn submit_pair(&self, request: &SynthesisRequest) -> Result<String, PortError>;

    /// Fetch the current status of a previously submitted job.
    ///
    /// Transport failures are transient from the pipeline's point of view;
    /// the caller decides whether to retry.
    async fn poll(&self, task_id: &str) -> Result<TaskPoll, PortError>;
}

/// Download of a finished clip to local storage.
#[async_trait]
pub trait SegmentFetcher: Send + Sync {
    /// Download `url` to `destination`. On failure the destination path
    /// must not be observable as a complete file.
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), PortError>;
}

/// Lossless join of an ordered list of local segments.
#[async_trait]
pub trait SegmentMerger: Send + Sync {
    /// Concatenate `segments` in the given order into `output` without
    /// re-encoding. On failure no output file is left behind.
    async fn merge(&self, segments: &[PathBuf], output: &Path) -> Result<(), FfmpegError>;
}

#[async_trait]
impl SynthesisJobs for DashScopeClient {
    async fn submit_pair(&self, request: &SynthesisRequest) -> Result<String, PortError> {
        let response = DashScopeClient::submit(self, request).await?;
        Ok(response.output.task_id)
    }

    async fn poll(&self, task_id: &str) -> Result<TaskPoll, PortError> {
        Ok(self.fetch_task(task_id).await?)
    }
}
