//! Trait definitions for the extractor module.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::ExtractorError;
use super::types::{AudioDownload, MediaInfo};

/// A client for the external media extraction tool.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    /// Fetches metadata for a single item.
    async fn single_item_info(&self, url: &str) -> Result<MediaInfo, ExtractorError>;

    /// Enumerates a playlist. Malformed entries are skipped; an empty result
    /// is `ExtractorError::NoItemsFound`.
    async fn playlist_info(&self, url: &str) -> Result<Vec<MediaInfo>, ExtractorError>;

    /// Downloads the raw audio stream to `request.output_template`.
    ///
    /// Progress percentages are sent on `progress_tx` as they are reported.
    /// Cancelling `cancel` kills the running process and yields
    /// `ExtractorError::Cancelled`.
    async fn download_audio(
        &self,
        request: &AudioDownload,
        progress_tx: mpsc::Sender<f32>,
        cancel: CancellationToken,
    ) -> Result<(), ExtractorError>;
}
