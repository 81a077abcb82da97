//! Wire types for the DashScope task lifecycle.

use serde::{Deserialize, Serialize};

/// Lifecycle status reported by the remote service for a synthesis task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    /// Any status string this client does not recognize. The service
    /// reports `UNKNOWN` for expired or unindexed tasks.
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Whether the task can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Canceled | TaskStatus::Unknown
        )
    }

    /// The wire representation of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Succeeded => "SUCCEEDED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Canceled => "CANCELED",
            TaskStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Envelope returned by the task submission endpoint.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub output: TaskHandle,
    #[serde(default)]
    pub request_id: String,
}

/// Handle for a freshly queued task.
#[derive(Debug, Deserialize)]
pub struct TaskHandle {
    pub task_id: String,
    pub task_status: TaskStatus,
}

/// Envelope returned by the task status endpoint.
#[derive(Debug, Deserialize)]
pub struct TaskPollResponse {
    pub output: TaskPoll,
    #[serde(default)]
    pub request_id: String,
}

/// Point-in-time view of a task.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskPoll {
    pub task_id: String,
    pub task_status: TaskStatus,
    /// Present only once the task has succeeded.
    #[serde(default)]
    pub video_url: Option<String>,
    /// Machine-readable failure code, if the task failed.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable detail, if the task failed.
    #[serde(default)]
    pub message: Option<String>,
}
