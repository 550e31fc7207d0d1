//! Extractor module for pulling metadata and raw audio out of media pages.
//!
//! This module provides the `Extractor` trait and a yt-dlp backed
//! implementation. The extractor never decodes media itself; it drives the
//! external tool and parses what it prints.
//!
//! # Example
//!
//! ```ignore
//! use tunegrab_core::extractor::{Extractor, ExtractorConfig, YtDlpExtractor};
//!
//! let extractor = YtDlpExtractor::new(ExtractorConfig::default());
//!
//! let info = extractor.single_item_info("https://youtu.be/dQw4w9WgXcQ").await?;
//! println!("{} by {:?}", info.title, info.uploader);
//!
//! let items = extractor.playlist_info("https://soundcloud.com/artist/sets/album").await?;
//! println!("{} tracks", items.len());
//! ```

mod config;
mod error;
mod progress;
mod traits;
mod types;
mod ytdlp;

pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use progress::{ProgressParser, YtDlpProgressParser};
pub use traits::Extractor;
pub use types::{AudioDownload, MediaInfo};
pub use ytdlp::{parse_playlist_output, parse_single_item, YtDlpExtractor};
