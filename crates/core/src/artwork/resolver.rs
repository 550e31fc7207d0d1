//! Best-artwork resolution.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::metrics::ARTWORK_RESOLUTIONS;

use super::candidates::candidate_chain;
use super::fetcher::ArtworkFetcher;
use super::types::{ArtworkRequest, ArtworkResult};

/// Picks the best cover image for a job.
///
/// A custom image wins outright. Otherwise the candidate chain is walked in
/// order and the first successful download is used. Every failure is
/// absorbed; an exhausted chain yields `ArtworkResult::none()`.
pub struct ArtworkResolver<F: ?Sized> {
    fetcher: Arc<F>,
}

impl<F: ?Sized> Clone for ArtworkResolver<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<F: ArtworkFetcher + ?Sized + 'static> ArtworkResolver<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }

    /// Resolves artwork for one request.
    pub async fn resolve_best_art(&self, request: &ArtworkRequest) -> ArtworkResult {
        if let Some(path) = &request.custom_path {
            debug!(job_id = %request.job_id, "Using custom artwork {}", path.display());
            ARTWORK_RESOLUTIONS.with_label_values(&["custom"]).inc();
            return ArtworkResult::custom(path.clone());
        }

        let chain = candidate_chain(&request.source_url, request.thumbnail_url.as_deref());

        for (idx, candidate) in chain.iter().enumerate() {
            match self.fetcher.fetch(&candidate.url, &request.dest).await {
                Ok(()) => {
                    info!(
                        job_id = %request.job_id,
                        legacy = candidate.legacy,
                        "Artwork resolved from candidate {}/{}: {}",
                        idx + 1,
                        chain.len(),
                        candidate.url
                    );
                    let tier = if candidate.legacy { "legacy" } else { "remote" };
                    ARTWORK_RESOLUTIONS.with_label_values(&[tier]).inc();
                    return ArtworkResult::fetched(request.dest.clone(), candidate.legacy);
                }
                Err(e) => {
                    debug!(
                        job_id = %request.job_id,
                        "Artwork candidate {} failed: {}",
                        candidate.url,
                        e
                    );
                }
            }
        }

        debug!(
            job_id = %request.job_id,
            "No artwork after {} candidates, continuing audio-only",
            chain.len()
        );
        ARTWORK_RESOLUTIONS.with_label_values(&["none"]).inc();
        ArtworkResult::none()
    }

    /// Starts resolution on its own task.
    ///
    /// The handle is meant to be awaited exactly once, when the result is
    /// actually needed.
    pub fn spawn(&self, request: ArtworkRequest) -> JoinHandle<ArtworkResult> {
        let resolver = self.clone();
        tokio::spawn(async move { resolver.resolve_best_art(&request).await })
    }
}
