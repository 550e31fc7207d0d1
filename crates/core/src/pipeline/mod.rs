//! Pipeline module turning a URL into a tagged audio file.
//!
//! The `PipelineCoordinator` drives one job through its stages: the audio
//! download and artwork resolution run concurrently, then the transcode
//! runs, then the job's temp files are purged and its registry entry is
//! removed. Cancellation can arrive at any point through `cancel`.
//!
//! # Example
//!
//! ```ignore
//! use tunegrab_core::pipeline::{DownloadRequest, PipelineConfig, PipelineCoordinator};
//! use tunegrab_core::transcoder::{TargetFormat, TrackTags};
//!
//! let coordinator = PipelineCoordinator::new(config, extractor, transcoder, fetcher);
//!
//! let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel(100);
//! let request = DownloadRequest::new("https://youtu.be/dQw4w9WgXcQ", TargetFormat::Mp3)
//!     .with_tags(TrackTags::new("Song", "Artist", "Album"));
//!
//! let handle = coordinator.spawn(request, progress_tx).await?;
//! while let Some(event) = progress_rx.recv().await {
//!     println!("{:?} {:.0}%", event.stage, event.percent);
//! }
//! let outcome = handle.wait().await?;
//! ```

mod config;
mod coordinator;
mod error;
mod temp;
mod types;

pub use config::PipelineConfig;
pub use coordinator::PipelineCoordinator;
pub use error::PipelineError;
pub use temp::{
    image_extension, move_into_place, persist_inline_artwork, sanitize_filename, validate_job_id, TempPrefix,
    MAX_JOB_ID_LEN, TEMP_FILE_PREFIX,
};
pub use types::{
    CustomArtwork, DownloadJob, DownloadRequest, JobHandle, JobOutcome, JobState, ProgressEvent,
    ProgressStage,
};
