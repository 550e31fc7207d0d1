//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during transcoding.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// ffmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    NotFound { path: PathBuf },

    /// ffmpeg exited with a nonzero status.
    #[error("FFmpeg exited with code: {code:?}")]
    Failed { code: Option<i32>, stderr: String },

    /// ffmpeg reported success but the output file is missing.
    #[error("Output file not created: {path}")]
    OutputMissing { path: PathBuf },

    /// ffmpeg ran past its configured deadline.
    #[error("Transcode timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The job was cancelled while ffmpeg was running.
    #[error("Transcode cancelled")]
    Cancelled,

    /// I/O error around the ffmpeg run.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// A human readable message, preferring ffmpeg's own last stderr line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Failed { stderr, .. } => stderr
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .last()
                .map(str::to_string)
                .unwrap_or_else(|| self.to_string()),
            other => other.to_string(),
        }
    }
}
