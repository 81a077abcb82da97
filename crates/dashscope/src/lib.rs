//! REST client for the DashScope video synthesis service.
//!
//! Covers the two endpoints the pipeline needs: asynchronous task
//! submission (keyframe pair to video) and task status retrieval.

pub mod api;
pub mod task;

pub use api::{DashScopeClient, DashScopeError, SynthesisRequest};
pub use task::{SubmitResponse, TaskPoll, TaskStatus};
