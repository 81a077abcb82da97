use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use framelink_core::storage::StorageLayout;
use framelink_dashscope::DashScopeClient;
use framelink_pipeline::SequenceOrchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Uploads/outputs directory layout.
    pub storage: Arc<StorageLayout>,
    /// DashScope REST client (single-pair passthrough endpoints).
    pub client: Arc<DashScopeClient>,
    /// Sequence pipeline driver.
    pub orchestrator: Arc<SequenceOrchestrator>,
    /// Process-level token; each sequence run polls under a child of it,
    /// so shutdown can stop in-flight polling.
    pub shutdown: CancellationToken,
}
