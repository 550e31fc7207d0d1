//! Types for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFormat {
    /// MPEG Audio Layer III with ID3v2.3 tags
    #[default]
    Mp3,
    /// AAC in an iPod-profile MP4 container
    M4a,
}

impl TargetFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
        }
    }

    /// Returns the ffmpeg codec name for this format.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::M4a => "aac",
        }
    }
}

/// Target shape of the embedded cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverAspect {
    /// 1000x1000
    #[default]
    Square,
    /// 1280x720
    Widescreen,
}

impl CoverAspect {
    /// Target box in pixels as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Square => (1000, 1000),
            Self::Widescreen => (1280, 720),
        }
    }
}

/// Portion of the source to keep, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrimWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

impl TrimWindow {
    pub fn new(start: Option<f64>, end: Option<f64>) -> Self {
        Self { start, end }
    }

    /// Neither bound is set.
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Checks that bounds are finite, non-negative and ordered.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [("start", self.start), ("end", self.end)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(format!("trim {} must be a non-negative number", name));
                }
            }
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end <= start {
                return Err("trim end must be after trim start".to_string());
            }
        }
        Ok(())
    }
}

/// Tags written into the output file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

impl TrackTags {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            artist: Some(artist.into()),
            album: Some(album.into()),
        }
    }

    /// Converts tags to ffmpeg `-metadata` arguments, skipping blank values.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        for (key, value) in [
            ("title", &self.title),
            ("artist", &self.artist),
            ("album", &self.album),
        ] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                args.extend(["-metadata".to_string(), format!("{}={}", key, value)]);
            }
        }

        args
    }
}

/// A cover image ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtwork {
    pub path: PathBuf,
    /// Image carries letterbox bars that must be cropped away.
    pub legacy: bool,
}

/// A single transcode.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeJob {
    /// Job this transcode belongs to.
    pub job_id: String,
    /// Raw downloaded audio.
    pub input_path: PathBuf,
    /// Final file location.
    pub output_path: PathBuf,
    pub format: TargetFormat,
    pub tags: TrackTags,
    pub trim: TrimWindow,
    /// Cover to embed, if any.
    pub artwork: Option<ResolvedArtwork>,
    pub cover_aspect: CoverAspect,
}

impl TranscodeJob {
    /// Creates an untagged, untrimmed job without artwork.
    pub fn new(
        job_id: impl Into<String>,
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        format: TargetFormat,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            input_path: input_path.into(),
            output_path: output_path.into(),
            format,
            tags: TrackTags::default(),
            trim: TrimWindow::default(),
            artwork: None,
            cover_aspect: CoverAspect::default(),
        }
    }

    pub fn with_tags(mut self, tags: TrackTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_trim(mut self, trim: TrimWindow) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_artwork(mut self, artwork: ResolvedArtwork) -> Self {
        self.artwork = Some(artwork);
        self
    }

    pub fn with_cover_aspect(mut self, aspect: CoverAspect) -> Self {
        self.cover_aspect = aspect;
        self
    }
}
