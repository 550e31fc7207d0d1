//! Mock artwork fetcher for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::artwork::{ArtworkFetchError, ArtworkFetcher};

/// Mock implementation of the ArtworkFetcher trait.
///
/// Only URLs marked available succeed; everything else answers 404. Every
/// requested URL is recorded in order.
#[derive(Debug)]
pub struct MockArtworkFetcher {
    available: Arc<RwLock<HashSet<String>>>,
    requests: Arc<RwLock<Vec<String>>>,
    delay_ms: Arc<RwLock<u64>>,
}

impl Default for MockArtworkFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockArtworkFetcher {
    /// Create a new mock fetcher where every URL fails.
    pub fn new() -> Self {
        Self {
            available: Arc::new(RwLock::new(HashSet::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            delay_ms: Arc::new(RwLock::new(0)),
        }
    }

    /// Make `url` downloadable.
    pub async fn set_available(&self, url: &str) {
        self.available.write().await.insert(url.to_string());
    }

    /// Delay every fetch by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay_ms.write().await = delay.as_millis() as u64;
    }

    /// URLs requested so far, in order.
    pub async fn requested_urls(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    /// Get the number of fetches made.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl ArtworkFetcher for MockArtworkFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), ArtworkFetchError> {
        self.requests.write().await.push(url.to_string());

        let delay = *self.delay_ms.read().await;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if !self.available.read().await.contains(url) {
            return Err(ArtworkFetchError::Status(404));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, b"\xFF\xD8\xFF\xE0mock").await?;
        Ok(())
    }
}
