//! Segment merging via the shared ffmpeg helper.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use framelink_core::ffmpeg::{concat_segments, FfmpegError};

use crate::ports::SegmentMerger;

/// [`SegmentMerger`] backed by the ffmpeg concat demuxer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegMerger;

#[async_trait]
impl SegmentMerger for FfmpegMerger {
    async fn merge(&self, segments: &[PathBuf], output: &Path) -> Result<(), FfmpegError> {
        concat_segments(segments, output).await
    }
}
