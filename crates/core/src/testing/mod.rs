//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every external tool seam,
//! allowing full job lifecycles to be exercised without yt-dlp, ffmpeg or
//! network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use tunegrab_core::testing::{fixtures, MockArtworkFetcher, MockExtractor, MockTranscoder};
//!
//! let extractor = MockExtractor::new();
//! let fetcher = MockArtworkFetcher::new();
//! fetcher.set_available("https://i.ytimg.com/vi/abc/maxresdefault.jpg").await;
//!
//! let coordinator = fixtures::coordinator(temp.path(), extractor, MockTranscoder::new(), fetcher);
//! ```

mod mock_artwork_fetcher;
mod mock_extractor;
mod mock_transcoder;

pub use mock_artwork_fetcher::MockArtworkFetcher;
pub use mock_extractor::MockExtractor;
pub use mock_transcoder::{MockTranscoder, RecordedTranscode};

/// A coordinator wired entirely to mocks.
pub type MockCoordinator =
    crate::pipeline::PipelineCoordinator<MockExtractor, MockTranscoder, MockArtworkFetcher>;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;
    use std::sync::Arc;

    use super::{MockArtworkFetcher, MockCoordinator, MockExtractor, MockTranscoder};
    use crate::extractor::MediaInfo;
    use crate::pipeline::{DownloadRequest, PipelineConfig};
    use crate::platform::youtube_fallback_thumbnail;
    use crate::transcoder::{TargetFormat, TrackTags};

    /// Create test metadata with reasonable defaults.
    pub fn media_info(id: &str, title: &str) -> MediaInfo {
        MediaInfo {
            id: id.to_string(),
            title: title.to_string(),
            duration_secs: Some(215.0),
            thumbnail_url: None,
            uploader: Some("Mock Uploader".to_string()),
            webpage_url: format!("https://example.com/{}", id),
        }
    }

    /// Create test metadata for a YouTube video.
    pub fn youtube_info(video_id: &str, title: &str) -> MediaInfo {
        MediaInfo {
            thumbnail_url: Some(youtube_fallback_thumbnail(video_id)),
            webpage_url: format!("https://www.youtube.com/watch?v={}", video_id),
            ..media_info(video_id, title)
        }
    }

    /// An MP3 request for `url` with id `id` and full tags.
    pub fn download_request(id: &str, url: &str) -> DownloadRequest {
        DownloadRequest::new(url, TargetFormat::Mp3)
            .with_id(id)
            .with_tags(TrackTags::new("Song", "Artist", "Album"))
    }

    /// Pipeline config rooted at `root`, with separate output and temp dirs.
    pub fn pipeline_config(root: &Path) -> PipelineConfig {
        PipelineConfig::with_dirs(root.join("out"), root.join("tmp"))
    }

    /// A coordinator over the given mocks, rooted at `root`.
    pub fn coordinator(
        root: &Path,
        extractor: MockExtractor,
        transcoder: MockTranscoder,
        fetcher: MockArtworkFetcher,
    ) -> (
        MockCoordinator,
        Arc<MockExtractor>,
        Arc<MockTranscoder>,
        Arc<MockArtworkFetcher>,
    ) {
        let extractor = Arc::new(extractor);
        let transcoder = Arc::new(transcoder);
        let fetcher = Arc::new(fetcher);
        let coordinator = MockCoordinator::new(
            pipeline_config(root),
            Arc::clone(&extractor),
            Arc::clone(&transcoder),
            Arc::clone(&fetcher),
        );
        (coordinator, extractor, transcoder, fetcher)
    }
}
