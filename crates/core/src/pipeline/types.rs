//! Types for the pipeline module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::task::JoinHandle;

use crate::artwork::ArtworkRequest;
use crate::transcoder::{CoverAspect, TargetFormat, TrackTags, TrimWindow};

use super::error::PipelineError;
use super::temp::TempPrefix;

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Registered,
    Extracting,
    ResolvingArt,
    Transcoding,
    Complete,
    Cancelled,
    Failed,
}

impl JobState {
    /// Whether the job has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled | Self::Failed)
    }

    /// Whether an external process may be running for the job.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Extracting | Self::ResolvingArt | Self::Transcoding)
    }
}

/// Stage reported on the progress channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Downloading,
    Converting,
    Complete,
}

/// One progress update for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: String,
    pub stage: ProgressStage,
    /// 0-100.
    pub percent: f32,
}

impl ProgressEvent {
    pub fn downloading(job_id: &str, percent: f32) -> Self {
        Self {
            job_id: job_id.to_string(),
            stage: ProgressStage::Downloading,
            percent,
        }
    }

    pub fn converting(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            stage: ProgressStage::Converting,
            percent: 0.0,
        }
    }

    pub fn complete(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            stage: ProgressStage::Complete,
            percent: 100.0,
        }
    }
}

/// A cover supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomArtwork {
    /// Image bytes, persisted to a prefixed temp file when the job starts.
    Inline { data: Vec<u8>, extension: String },
    /// An image already on disk. Never deleted by the job.
    File(PathBuf),
}

/// What a caller asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    /// Caller chosen id; a UUID is generated when absent.
    pub id: Option<String>,
    pub url: String,
    pub format: TargetFormat,
    pub tags: TrackTags,
    pub trim: TrimWindow,
    pub cover_aspect: CoverAspect,
    /// Thumbnail reported by an earlier metadata lookup.
    pub thumbnail_url: Option<String>,
    pub custom_artwork: Option<CustomArtwork>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, format: TargetFormat) -> Self {
        Self {
            id: None,
            url: url.into(),
            format,
            tags: TrackTags::default(),
            trim: TrimWindow::default(),
            cover_aspect: CoverAspect::default(),
            thumbnail_url: None,
            custom_artwork: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tags(mut self, tags: TrackTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_trim(mut self, trim: TrimWindow) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_cover_aspect(mut self, aspect: CoverAspect) -> Self {
        self.cover_aspect = aspect;
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn with_custom_artwork(mut self, artwork: CustomArtwork) -> Self {
        self.custom_artwork = Some(artwork);
        self
    }
}

/// A validated request bound to its id, temp prefix and output path.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub id: String,
    pub url: String,
    pub format: TargetFormat,
    pub tags: TrackTags,
    pub trim: TrimWindow,
    pub cover_aspect: CoverAspect,
    pub thumbnail_url: Option<String>,
    pub prefix: TempPrefix,
    pub output_path: PathBuf,
    /// Custom cover location once known.
    pub custom_art_path: Option<PathBuf>,
}

impl DownloadJob {
    /// Request for the artwork task.
    pub fn artwork_request(&self) -> ArtworkRequest {
        ArtworkRequest {
            job_id: self.id.clone(),
            source_url: self.url.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            custom_path: self.custom_art_path.clone(),
            dest: self.prefix.cover_path(),
        }
    }
}

/// A finished job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job_id: String,
    pub output_path: PathBuf,
    /// Whether a cover was embedded.
    pub has_artwork: bool,
    pub duration_ms: u64,
}

/// Handle to a spawned job.
#[derive(Debug)]
pub struct JobHandle {
    id: String,
    handle: JoinHandle<Result<JobOutcome, PipelineError>>,
}

impl JobHandle {
    pub(crate) fn new(id: String, handle: JoinHandle<Result<JobOutcome, PipelineError>>) -> Self {
        Self { id, handle }
    }

    /// Id the job was registered under.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Waits for the job to reach a terminal state.
    pub async fn wait(self) -> Result<JobOutcome, PipelineError> {
        self.handle.await.map_err(|e| PipelineError::Internal {
            reason: format!("job supervisor failed: {}", e),
        })?
    }
}
