//! Best-effort removal of run artifacts.
//!
//! Cleanup must never convert an outcome: failures are logged and dropped,
//! and a file that is already gone is not a failure.

use std::path::{Path, PathBuf};

/// Remove a file, logging (not propagating) any failure.
pub async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed artifact"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove artifact")
        }
    }
}

/// Remove a set of artifacts, best-effort, in order.
pub async fn remove_all_quietly(paths: &[PathBuf]) {
    for path in paths {
        remove_quietly(path).await;
    }
}
