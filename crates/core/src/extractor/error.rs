//! Error types for the extractor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to the extraction tool.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// yt-dlp binary not found.
    #[error("yt-dlp not found at path: {path}")]
    NotFound { path: PathBuf },

    /// yt-dlp exited with an error or printed something unparsable.
    #[error("Extraction failed: {reason}")]
    ExtractionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// A playlist enumerated to zero usable items.
    #[error("No items found")]
    NoItemsFound,

    /// yt-dlp ran past its configured deadline.
    #[error("Extraction timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The download was cancelled.
    #[error("Extraction cancelled")]
    Cancelled,

    /// I/O error while running yt-dlp.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractorError {
    /// Creates a new extraction failed error with captured stderr.
    pub fn extraction_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ExtractionFailed {
            reason: reason.into(),
            stderr: stderr.filter(|s| !s.trim().is_empty()),
        }
    }

    /// A human readable message, preferring the tool's own error line.
    pub fn user_message(&self) -> String {
        match self {
            Self::ExtractionFailed {
                reason,
                stderr: Some(stderr),
            } => last_error_line(stderr).unwrap_or_else(|| reason.clone()),
            other => other.to_string(),
        }
    }
}

/// Picks the most useful line out of yt-dlp's stderr.
fn last_error_line(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
}
