//! Error types for the artwork module.

use thiserror::Error;

/// Why a single artwork candidate could not be fetched.
///
/// These never reach a job's caller; the resolver logs them and moves on to
/// the next candidate.
#[derive(Debug, Error)]
pub enum ArtworkFetchError {
    /// Request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with something other than 200.
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// Server answered 200 with an empty body.
    #[error("Empty response body")]
    EmptyBody,

    /// Writing the image to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
