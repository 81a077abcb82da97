//! Pipeline error taxonomy.
//!
//! Variants that correspond to a failed pair carry the 1-based segment
//! number, so callers can report exactly which transition in the sequence
//! went wrong.

use framelink_core::ffmpeg::FfmpegError;

/// Boxed error type used at the pipeline's ports.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Fewer than two images were supplied.
    #[error("a sequence needs at least 2 images, got {got}")]
    InsufficientImages { got: usize },

    /// The remote service rejected a job at submission time.
    #[error("segment {segment}: submission failed: {source}")]
    Submission {
        segment: usize,
        #[source]
        source: PortError,
    },

    /// A job exhausted its poll ceiling without reaching a terminal state.
    #[error("segment {segment}: timed out after {attempts} poll attempts")]
    PollTimeout { segment: usize, attempts: u32 },

    /// The remote service reported the job as terminally failed.
    #[error("segment {segment}: generation failed ({status}): {message}")]
    RemoteFailure {
        segment: usize,
        status: String,
        message: String,
    },

    /// A job succeeded but its poll result carried no video URL.
    #[error("segment {segment}: job succeeded but returned no video URL")]
    MissingResultUrl { segment: usize },

    /// A finished clip could not be downloaded to local storage.
    #[error("segment {segment}: download failed: {source}")]
    Retrieval {
        segment: usize,
        #[source]
        source: PortError,
    },

    /// The merge step failed.
    #[error("concatenation failed: {0}")]
    Concatenation(#[from] FfmpegError),

    /// The run's cancellation token fired before completion.
    #[error("run cancelled")]
    Cancelled,
}
