//! Error types for the pipeline module.

use thiserror::Error;

use crate::extractor::ExtractorError;
use crate::registry::RegistryError;
use crate::transcoder::TranscodeError;

/// Why a job or a metadata query did not produce a result.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request was rejected before any side effect.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Another job with the same id is still active.
    #[error("Job already active: {id}")]
    AlreadyRegistered { id: String },

    /// yt-dlp failed or printed something unparsable.
    #[error("Extraction failed: {0}")]
    Extraction(#[source] ExtractorError),

    /// A playlist enumerated to zero usable items.
    #[error("No items found")]
    NoItemsFound,

    /// ffmpeg failed; no output file should be trusted.
    #[error("Transcode failed: {0}")]
    Transcode(#[source] TranscodeError),

    /// The job was cancelled by the caller.
    #[error("Job cancelled")]
    Cancelled,

    /// yt-dlp reported success but no raw audio file carries the job prefix.
    #[error("No downloaded audio found for prefix {prefix}")]
    FileLocation { prefix: String },

    /// I/O error around the job's own files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The job task died unexpectedly.
    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl PipelineError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Stable identifier of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::AlreadyRegistered { .. } => "already_registered",
            Self::Extraction(_) => "extraction",
            Self::NoItemsFound => "no_items_found",
            Self::Transcode(_) => "transcode",
            Self::Cancelled => "cancelled",
            Self::FileLocation { .. } => "file_location",
            Self::Io(_) => "io",
            Self::Internal { .. } => "internal",
        }
    }

    /// Cancellation is not a failure and should not be styled as one.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Best-effort message built from the tools' own output.
    pub fn user_message(&self) -> String {
        match self {
            Self::Extraction(e) => e.user_message(),
            Self::Transcode(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<ExtractorError> for PipelineError {
    fn from(e: ExtractorError) -> Self {
        match e {
            ExtractorError::Cancelled => Self::Cancelled,
            ExtractorError::NoItemsFound => Self::NoItemsFound,
            other => Self::Extraction(other),
        }
    }
}

impl From<TranscodeError> for PipelineError {
    fn from(e: TranscodeError) -> Self {
        match e {
            TranscodeError::Cancelled => Self::Cancelled,
            other => Self::Transcode(other),
        }
    }
}

impl From<RegistryError> for PipelineError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::AlreadyRegistered(id) => Self::AlreadyRegistered { id },
        }
    }
}
