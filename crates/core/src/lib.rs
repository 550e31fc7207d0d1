pub mod artwork;
pub mod config;
pub mod extractor;
pub mod metrics;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod registry;
pub mod testing;
pub mod transcoder;

pub use artwork::{ArtworkFetcher, ArtworkResolver, HttpArtworkFetcher};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use extractor::{Extractor, ExtractorError, MediaInfo, YtDlpExtractor};
pub use pipeline::{
    CustomArtwork, DownloadRequest, JobOutcome, PipelineCoordinator, PipelineError,
    ProgressEvent, ProgressStage,
};
pub use registry::{DownloadRegistry, JobSnapshot};
pub use transcoder::{
    CoverAspect, FfmpegTranscoder, TargetFormat, TrackTags, TranscodeError, Transcoder, TrimWindow,
};
