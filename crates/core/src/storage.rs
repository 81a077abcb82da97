//! Working-directory layout for transient and final artifacts.
//!
//! Two areas: `uploads` holds transient input images, `outputs` holds
//! per-segment downloads and final merged videos. Both are served
//! statically by the HTTP layer under the same names.

use std::path::{Path, PathBuf};

/// Filesystem layout for the service's working areas.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    uploads_dir: PathBuf,
    outputs_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(uploads_dir: impl Into<PathBuf>, outputs_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            outputs_dir: outputs_dir.into(),
        }
    }

    /// Create both working directories if they do not exist yet.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        tokio::fs::create_dir_all(&self.outputs_dir).await?;
        Ok(())
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.outputs_dir
    }

    /// Absolute location of an uploaded image by filename.
    pub fn upload_path(&self, filename: &str) -> PathBuf {
        self.uploads_dir.join(filename)
    }

    /// Absolute location of an output artifact by filename.
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.outputs_dir.join(filename)
    }
}
