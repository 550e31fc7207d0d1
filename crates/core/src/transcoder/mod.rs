//! Transcoder module for producing the final tagged audio file.
//!
//! This module provides the `Transcoder` trait and an ffmpeg backed
//! implementation. The raw download and an optional cover image go in; a
//! single MP3 or M4A file with embedded tags comes out.
//!
//! # Example
//!
//! ```ignore
//! use tunegrab_core::transcoder::{FfmpegTranscoder, TranscodeJob, TranscoderConfig, Transcoder};
//!
//! let transcoder = FfmpegTranscoder::new(TranscoderConfig::default());
//!
//! let job = TranscodeJob::new("job-1", "/tmp/tg_job-1_audio.webm", "/music/Song.mp3", TargetFormat::Mp3)
//!     .with_tags(TrackTags::new("Song", "Artist", "Album"));
//!
//! let output = transcoder.transcode(&job, CancellationToken::new()).await?;
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::{image_filter, FfmpegTranscoder};
pub use traits::Transcoder;
pub use types::{CoverAspect, ResolvedArtwork, TargetFormat, TrackTags, TranscodeJob, TrimWindow};
