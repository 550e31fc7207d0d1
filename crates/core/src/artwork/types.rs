//! Types for the artwork module.

use std::path::PathBuf;

/// Everything the resolver needs to pick artwork for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtworkRequest {
    /// Job the artwork is for; only used for logging.
    pub job_id: String,
    /// Page URL of the media item.
    pub source_url: String,
    /// Thumbnail URL reported by the extractor, if any.
    pub thumbnail_url: Option<String>,
    /// User supplied image; outranks every remote candidate.
    pub custom_path: Option<PathBuf>,
    /// Where a fetched image is written.
    pub dest: PathBuf,
}

/// One remote image to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkCandidate {
    pub url: String,
    /// Image comes from a letterboxed low-resolution tier.
    pub legacy: bool,
}

impl ArtworkCandidate {
    pub fn new(url: impl Into<String>, legacy: bool) -> Self {
        Self {
            url: url.into(),
            legacy,
        }
    }
}

/// Outcome of artwork resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtworkResult {
    /// Local image path, absent when no candidate succeeded.
    pub path: Option<PathBuf>,
    /// The image needs letterbox recovery before use.
    pub legacy: bool,
}

impl ArtworkResult {
    /// No artwork.
    pub fn none() -> Self {
        Self::default()
    }

    /// A user supplied image.
    pub fn custom(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            legacy: false,
        }
    }

    /// An image downloaded from a candidate.
    pub fn fetched(path: PathBuf, legacy: bool) -> Self {
        Self {
            path: Some(path),
            legacy,
        }
    }

    pub fn is_present(&self) -> bool {
        self.path.is_some()
    }
}
