//! The sequence orchestrator.
//!
//! One run: fan-out submission of N-1 keyframe-pair jobs, bounded-retry
//! polling per job, retrieval strictly in submission order, stream-copy
//! merge, and a single cleanup path that executes on every exit.
//!
//! Submission is concurrent (jobs are independent and submission is
//! cheap); polling and retrieval are serialized per run to bound local
//! resource use. Poll sleeps are suspension points, so many runs progress
//! concurrently without a thread per run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use framelink_core::naming;
use framelink_dashscope::{SynthesisRequest, TaskStatus};

use crate::cleanup;
use crate::error::PipelineError;
use crate::job::{GenerationJob, JobState};
use crate::ports::{SegmentFetcher, SegmentMerger, SynthesisJobs};

/// Poll pacing for one job.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Delay between consecutive status checks.
    pub interval: Duration,
    /// Maximum status checks before a job is treated as timed out.
    /// Transient check failures consume an attempt, so the ceiling bounds
    /// wall-clock time even when the status endpoint is unreachable.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    /// 2-second interval with a 180-attempt ceiling (~6 minutes per job).
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 180,
        }
    }
}

/// A saved upload: where it lives locally and how the remote service
/// reaches it.
#[derive(Debug, Clone)]
pub struct ImageRef {
    pub path: PathBuf,
    pub url: String,
}

/// Everything the orchestrator needs to know about one accepted request.
#[derive(Debug, Clone)]
pub struct SequenceInput {
    /// Run identifier; all artifact names derive from it.
    pub run_id: String,
    /// Ordered keyframes. Consecutive pairs become jobs.
    pub images: Vec<ImageRef>,
    pub prompt: String,
    pub negative_prompt: Option<String>,
}

/// Result of a completed run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunOutcome {
    pub run_id: String,
    pub merged_path: PathBuf,
    pub total_segments: usize,
    pub processed_segments: usize,
}

/// Drives one sequence run end to end.
pub struct SequenceOrchestrator {
    jobs: Arc<dyn SynthesisJobs>,
    fetcher: Arc<dyn SegmentFetcher>,
    merger: Arc<dyn SegmentMerger>,
    outputs_dir: PathBuf,
    poll: PollConfig,
}

impl SequenceOrchestrator {
    pub fn new(
        jobs: Arc<dyn SynthesisJobs>,
        fetcher: Arc<dyn SegmentFetcher>,
        merger: Arc<dyn SegmentMerger>,
        outputs_dir: PathBuf,
        poll: PollConfig,
    ) -> Self {
        Self {
            jobs,
            fetcher,
            merger,
            outputs_dir,
            poll,
        }
    }

    /// Run a full sequence generation.
    ///
    /// On success exactly one merged file remains; on any failure (or
    /// cancellation) nothing remains. Uploaded images and downloaded
    /// segments are removed on every exit path; removal failures are
    /// logged and never affect the returned result.
    pub async fn run(
        &self,
        input: SequenceInput,
        cancel: CancellationToken,
    ) -> Result<RunOutcome, PipelineError> {
        let image_paths: Vec<PathBuf> = input.images.iter().map(|i| i.path.clone()).collect();
        let mut segments: Vec<PathBuf> = Vec::new();

        let result = self.run_inner(&input, &mut segments, &cancel).await;

        // Single cleanup path for every exit. A successful merge has
        // already consumed the segments' content, so they are always
        // transient by this point, as are the uploads.
        cleanup::remove_all_quietly(&image_paths).await;
        cleanup::remove_all_quietly(&segments).await;

        match &result {
            Ok(outcome) => tracing::info!(
                run_id = %input.run_id,
                merged = %outcome.merged_path.display(),
                segments = outcome.processed_segments,
                "Sequence run completed"
            ),
            Err(e) => tracing::error!(run_id = %input.run_id, error = %e, "Sequence run failed"),
        }

        result
    }

    async fn run_inner(
        &self,
        input: &SequenceInput,
        segments: &mut Vec<PathBuf>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, PipelineError> {
        let image_count = input.images.len();
        if image_count < 2 {
            return Err(PipelineError::InsufficientImages { got: image_count });
        }
        let total_segments = image_count - 1;

        tracing::info!(
            run_id = %input.run_id,
            images = image_count,
            segments = total_segments,
            phase = "submitting",
            "Accepted sequence run"
        );

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        // -- Fan-out submission ---------------------------------------
        // All pairs are submitted concurrently; the result vector is
        // indexed by submission order, which fixes the final segment
        // order regardless of remote completion timing. Any rejection
        // aborts before a single poll happens.
        let submissions = input.images.windows(2).enumerate().map(|(index, pair)| {
            let request = SynthesisRequest {
                first_frame_url: pair[0].url.clone(),
                last_frame_url: pair[1].url.clone(),
                prompt: input.prompt.clone(),
                negative_prompt: input.negative_prompt.clone(),
            };
            async move {
                self.jobs
                    .submit_pair(&request)
                    .await
                    .map_err(|source| PipelineError::Submission {
                        segment: index + 1,
                        source,
                    })
            }
        });
        let task_ids = futures::future::try_join_all(submissions).await?;

        let mut jobs: Vec<GenerationJob> = task_ids
            .into_iter()
            .enumerate()
            .map(|(index, task_id)| GenerationJob::new(index, task_id))
            .collect();

        tracing::info!(
            run_id = %input.run_id,
            jobs = jobs.len(),
            phase = "polling_and_retrieving",
            "All jobs submitted"
        );

        // -- Poll + retrieve, strictly in submission order ------------
        // Job i is resolved and its clip downloaded before job i+1 is
        // examined, even though all jobs are already running remotely.
        for job in jobs.iter_mut() {
            let segment = job.segment_number();
            let video_url = self.poll_job(job, cancel).await?;

            let destination = self
                .outputs_dir
                .join(naming::segment_filename(&input.run_id, job.index));
            self.fetcher
                .fetch(&video_url, &destination)
                .await
                .map_err(|source| PipelineError::Retrieval { segment, source })?;
            segments.push(destination);

            tracing::info!(run_id = %input.run_id, segment, "Segment downloaded");
        }

        // -- Merge ----------------------------------------------------
        tracing::info!(
            run_id = %input.run_id,
            segments = segments.len(),
            phase = "merging",
            "All segments retrieved"
        );

        let merged_path = self.outputs_dir.join(naming::merged_filename(&input.run_id));
        self.merger.merge(segments, &merged_path).await?;

        Ok(RunOutcome {
            run_id: input.run_id.clone(),
            merged_path,
            total_segments,
            processed_segments: segments.len(),
        })
    }

    /// Poll one job until it resolves, the ceiling is exhausted, or the
    /// run is cancelled. Returns the clip URL on success.
    ///
    /// Transient poll errors consume an attempt and are logged; they
    /// never abort the job early.
    async fn poll_job(
        &self,
        job: &mut GenerationJob,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let segment = job.segment_number();

        for attempt in 1..=self.poll.max_attempts {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            match self.jobs.poll(&job.task_id).await {
                Ok(poll) => match poll.task_status {
                    TaskStatus::Succeeded => {
                        let video_url = poll
                            .video_url
                            .ok_or(PipelineError::MissingResultUrl { segment })?;
                        job.state = JobState::Succeeded {
                            video_url: video_url.clone(),
                        };
                        return Ok(video_url);
                    }
                    status if status.is_terminal() => {
                        let message = poll
                            .message
                            .unwrap_or_else(|| "no detail reported".to_string());
                        job.state = JobState::Failed {
                            status: status.as_str().to_string(),
                            message: message.clone(),
                        };
                        return Err(PipelineError::RemoteFailure {
                            segment,
                            status: status.as_str().to_string(),
                            message,
                        });
                    }
                    status => {
                        tracing::debug!(
                            task_id = %job.task_id,
                            segment,
                            attempt,
                            status = status.as_str(),
                            "Job still in progress"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        task_id = %job.task_id,
                        segment,
                        attempt,
                        error = %e,
                        "Status check failed; will retry"
                    );
                }
            }

            if attempt < self.poll.max_attempts {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                    _ = tokio::time::sleep(self.poll.interval) => {}
                }
            }
        }

        job.state = JobState::TimedOut {
            attempts: self.poll.max_attempts,
        };
        Err(PipelineError::PollTimeout {
            segment,
            attempts: self.poll.max_attempts,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
