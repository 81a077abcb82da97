//! FFmpeg stream-copy concatenation of generated video segments.
//!
//! Every segment in a run is rendered by the same remote model at the same
//! resolution, so the concat demuxer can join them without re-encoding.
//! The caller supplies the segment order explicitly; nothing here ever
//! enumerates a directory.

use std::path::{Path, PathBuf};

/// Error type for FFmpeg operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("no segments to concatenate")]
    NoSegments,

    #[error("segment file not found: {0}")]
    SegmentMissing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the concat demuxer list for an ordered set of segments.
///
/// One `file '...'` line per segment, single quotes escaped per the
/// demuxer's quoting rules.
fn concat_list(segments: &[PathBuf]) -> String {
    let mut list = String::new();
    for segment in segments {
        let escaped = segment.to_string_lossy().replace('\'', "'\\''");
        list.push_str("file '");
        list.push_str(&escaped);
        list.push_str("'\n");
    }
    list
}

/// Concatenate `segments` in order into `output` without re-encoding.
///
/// Requires at least one segment; a single segment degenerates to a file
/// copy. All segments must exist up front. On any failure no output file
/// is left behind.
pub async fn concat_segments(segments: &[PathBuf], output: &Path) -> Result<(), FfmpegError> {
    if segments.is_empty() {
        return Err(FfmpegError::NoSegments);
    }

    for segment in segments {
        if !segment.exists() {
            return Err(FfmpegError::SegmentMissing(
                segment.to_string_lossy().to_string(),
            ));
        }
    }

    if segments.len() == 1 {
        tokio::fs::copy(&segments[0], output).await?;
        return Ok(());
    }

    // The list file name derives from the (run-unique) output name, so
    // concurrent runs never step on each other's lists.
    let list_path = output.with_extension("txt");
    tokio::fs::write(&list_path, concat_list(segments)).await?;

    let result = tokio::process::Command::new("ffmpeg")
        .args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(&list_path)
        .args(["-c", "copy"])
        .arg(output)
        .output()
        .await;

    let _ = tokio::fs::remove_file(&list_path).await;

    let command_output = result.map_err(FfmpegError::NotFound)?;

    if !command_output.status.success() {
        let _ = tokio::fs::remove_file(output).await;
        return Err(FfmpegError::ExecutionFailed {
            exit_code: command_output.status.code(),
            stderr: String::from_utf8_lossy(&command_output.stderr).to_string(),
        });
    }

    Ok(())
}
