//! Types for the extractor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata for one media item, as reported by the extraction tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Platform-specific item id.
    pub id: String,
    /// Item title.
    pub title: String,
    /// Duration in seconds, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Thumbnail URL after fallback normalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Channel or uploader name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    /// Canonical page URL.
    pub webpage_url: String,
}

/// A raw audio download request.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioDownload {
    /// Job this download belongs to.
    pub job_id: String,
    /// Source page URL.
    pub url: String,
    /// Output path template; `%(ext)s` is replaced by the tool with the
    /// container extension of the downloaded stream.
    pub output_template: PathBuf,
}

impl AudioDownload {
    /// Path the download lands at for a given extension.
    pub fn resolved_path(&self, ext: &str) -> PathBuf {
        PathBuf::from(
            self.output_template
                .to_string_lossy()
                .replace("%(ext)s", ext),
        )
    }
}
