//! Artwork module for resolving the best available cover image for a job.
//!
//! Resolution runs as its own task next to the audio download. Candidates are
//! tried one at a time in quality order and the first image that downloads
//! wins. Failures never leave this module: a job whose chain is exhausted
//! simply proceeds without cover art.

mod candidates;
mod config;
mod error;
mod fetcher;
mod resolver;
mod types;

pub use candidates::candidate_chain;
pub use config::ArtworkConfig;
pub use error::ArtworkFetchError;
pub use fetcher::{ArtworkFetcher, HttpArtworkFetcher};
pub use resolver::ArtworkResolver;
pub use types::{ArtworkCandidate, ArtworkRequest, ArtworkResult};
