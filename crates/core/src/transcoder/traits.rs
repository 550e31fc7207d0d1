//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use super::error::TranscodeError;
use super::types::TranscodeJob;

/// Turns a raw download into the final tagged file.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Runs the transcode and returns the output path.
    ///
    /// On error no usable file should be assumed at `job.output_path`.
    /// Cancelling `cancel` kills the running process and yields
    /// `TranscodeError::Cancelled`.
    async fn transcode(
        &self,
        job: &TranscodeJob,
        cancel: CancellationToken,
    ) -> Result<PathBuf, TranscodeError>;
}
