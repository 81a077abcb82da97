//! Streaming download of finished clips.
//!
//! Writes to a `.part` sibling and renames into place, so a destination
//! path is only ever observable as a complete file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::PortError;
use crate::ports::SegmentFetcher;

/// Default ceiling on one clip download.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// [`SegmentFetcher`] that streams over HTTP under a bounded total time.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Stream the response body to the in-flight temp file.
    async fn stream_to(&self, url: &str, part: &Path) -> Result<(), PortError> {
        let download = async {
            let response = self.client.get(url).send().await?.error_for_status()?;
            let mut file = tokio::fs::File::create(part).await?;
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                file.write_all(&chunk?).await?;
            }
            file.flush().await?;
            file.sync_all().await?;
            Ok::<(), PortError>(())
        };

        tokio::time::timeout(self.timeout, download)
            .await
            .map_err(|_| {
                PortError::from(format!(
                    "download timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;
        Ok(())
    }
}

/// Temp-file sibling used while a download is in flight.
fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

#[async_trait]
impl SegmentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), PortError> {
        let part = part_path(destination);

        if let Err(e) = self.stream_to(url, &part).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&part, destination).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e.into());
        }

        Ok(())
    }
}
