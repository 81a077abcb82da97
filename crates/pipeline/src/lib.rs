//! Sequence-generation pipeline.
//!
//! Turns N ordered keyframe images into one merged video: submits N-1
//! remote synthesis jobs, polls each under a bounded retry ceiling,
//! downloads the finished clips, stream-copy concatenates them in
//! submission order, and cleans up every intermediate artifact on all
//! exit paths.

pub mod cleanup;
pub mod error;
pub mod fetch;
pub mod job;
pub mod merge;
pub mod orchestrator;
pub mod ports;

pub use error::PipelineError;
pub use orchestrator::{ImageRef, PollConfig, RunOutcome, SequenceInput, SequenceOrchestrator};
