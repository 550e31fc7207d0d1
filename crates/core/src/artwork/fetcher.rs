//! Artwork download over HTTP.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;

use super::config::ArtworkConfig;
use super::error::ArtworkFetchError;

/// Downloads a single candidate image.
#[async_trait]
pub trait ArtworkFetcher: Send + Sync {
    /// Downloads `url` to `dest`.
    ///
    /// On failure `dest` must not be left holding a partial image.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), ArtworkFetchError>;
}

/// `reqwest` based fetcher.
pub struct HttpArtworkFetcher {
    client: Client,
}

impl HttpArtworkFetcher {
    /// Creates a fetcher with the configured timeout and user agent.
    pub fn new(config: &ArtworkConfig) -> Result<Self, ArtworkFetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ArtworkFetcher for HttpArtworkFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), ArtworkFetchError> {
        let response = self.client.get(url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(ArtworkFetchError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(ArtworkFetchError::EmptyBody);
        }

        if let Err(e) = tokio::fs::write(dest, &body).await {
            let _ = tokio::fs::remove_file(dest).await;
            return Err(ArtworkFetchError::Io(e));
        }

        Ok(())
    }
}
