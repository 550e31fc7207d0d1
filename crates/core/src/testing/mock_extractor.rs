//! Mock extractor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::extractor::{AudioDownload, Extractor, ExtractorError, MediaInfo};

/// Mock implementation of the Extractor trait.
///
/// Provides controllable behavior for testing:
/// - Canned metadata per URL
/// - Simulated downloads that write prefixed files like yt-dlp does
/// - Simulated failure, slowness, or a download that runs until cancelled
///
/// # Example
///
/// ```rust,ignore
/// use tunegrab_core::testing::MockExtractor;
///
/// let extractor = MockExtractor::new();
/// extractor.set_progress_steps(vec![10.0, 60.0, 100.0]).await;
///
/// // Downloads now write `<template with webm>` and report three ticks
/// let downloads = extractor.recorded_downloads().await;
/// ```
#[derive(Debug)]
pub struct MockExtractor {
    items: Arc<RwLock<HashMap<String, MediaInfo>>>,
    playlists: Arc<RwLock<HashMap<String, Vec<MediaInfo>>>>,
    downloads: Arc<RwLock<Vec<AudioDownload>>>,
    next_error: Arc<RwLock<Option<ExtractorError>>>,
    progress_steps: Arc<RwLock<Vec<f32>>>,
    step_delay_ms: Arc<RwLock<u64>>,
    run_until_cancelled: Arc<RwLock<bool>>,
    produce_audio: Arc<RwLock<bool>>,
    audio_extension: Arc<RwLock<String>>,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    /// Create a new mock extractor.
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            playlists: Arc::new(RwLock::new(HashMap::new())),
            downloads: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            progress_steps: Arc::new(RwLock::new(vec![25.0, 50.0, 100.0])),
            step_delay_ms: Arc::new(RwLock::new(0)),
            run_until_cancelled: Arc::new(RwLock::new(false)),
            produce_audio: Arc::new(RwLock::new(true)),
            audio_extension: Arc::new(RwLock::new("webm".to_string())),
        }
    }

    /// Set the metadata returned for a URL.
    pub async fn set_item(&self, url: &str, info: MediaInfo) {
        self.items.write().await.insert(url.to_string(), info);
    }

    /// Set the entries returned for a playlist URL.
    pub async fn set_playlist(&self, url: &str, items: Vec<MediaInfo>) {
        self.playlists.write().await.insert(url.to_string(), items);
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ExtractorError) {
        *self.next_error.write().await = Some(error);
    }

    /// Percentages reported during a download.
    pub async fn set_progress_steps(&self, steps: Vec<f32>) {
        *self.progress_steps.write().await = steps;
    }

    /// Delay after each progress step.
    pub async fn set_step_delay(&self, delay: Duration) {
        *self.step_delay_ms.write().await = delay.as_millis() as u64;
    }

    /// Make downloads block until their token is cancelled.
    pub async fn set_run_until_cancelled(&self, enabled: bool) {
        *self.run_until_cancelled.write().await = enabled;
    }

    /// When disabled, a download succeeds but leaves only a `.part` file.
    pub async fn set_produce_audio(&self, enabled: bool) {
        *self.produce_audio.write().await = enabled;
    }

    /// Extension the simulated download resolves `%(ext)s` to.
    pub async fn set_audio_extension(&self, ext: &str) {
        *self.audio_extension.write().await = ext.to_string();
    }

    /// Get all recorded downloads.
    pub async fn recorded_downloads(&self) -> Vec<AudioDownload> {
        self.downloads.read().await.clone()
    }

    /// Get the number of downloads started.
    pub async fn download_count(&self) -> usize {
        self.downloads.read().await.len()
    }

    async fn take_error(&self) -> Option<ExtractorError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn single_item_info(&self, url: &str) -> Result<MediaInfo, ExtractorError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.items.read().await.get(url).cloned().ok_or_else(|| {
            ExtractorError::extraction_failed(
                "yt-dlp exited with code: Some(1)",
                Some(format!("ERROR: Unsupported URL: {}", url)),
            )
        })
    }

    async fn playlist_info(&self, url: &str) -> Result<Vec<MediaInfo>, ExtractorError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        match self.playlists.read().await.get(url) {
            Some(items) if !items.is_empty() => Ok(items.clone()),
            _ => Err(ExtractorError::NoItemsFound),
        }
    }

    async fn download_audio(
        &self,
        request: &AudioDownload,
        progress_tx: mpsc::Sender<f32>,
        cancel: CancellationToken,
    ) -> Result<(), ExtractorError> {
        self.downloads.write().await.push(request.clone());

        if cancel.is_cancelled() {
            return Err(ExtractorError::Cancelled);
        }
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let ext = self.audio_extension.read().await.clone();
        let final_path = request.resolved_path(&ext);
        let part_path = request.resolved_path(&format!("{}.part", ext));
        if let Some(parent) = part_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&part_path, b"partial").await?;

        let steps = self.progress_steps.read().await.clone();
        let delay = Duration::from_millis(*self.step_delay_ms.read().await);

        for percent in steps {
            let _ = progress_tx.try_send(percent);
            if !delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(ExtractorError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        if *self.run_until_cancelled.read().await {
            cancel.cancelled().await;
            return Err(ExtractorError::Cancelled);
        }

        if *self.produce_audio.read().await {
            tokio::fs::rename(&part_path, &final_path).await?;
        }

        Ok(())
    }
}
