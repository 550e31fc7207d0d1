//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process
//! with mock tools injected, so whole jobs can run without yt-dlp, ffmpeg
//! or network access.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tunegrab_core::{
    testing::{MockArtworkFetcher, MockExtractor, MockTranscoder},
    Config,
};
use tunegrab_server::api::{WsBroadcaster, WsMessage};
use tunegrab_server::state::AppState;

/// Re-export fixtures for test convenience
pub use tunegrab_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_download() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/downloads", json!({
///         "url": "https://example.com/video123"
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state behind the router
    pub state: Arc<AppState>,
    /// Mock extractor - configure metadata and download behavior
    pub extractor: Arc<MockExtractor>,
    /// Mock transcoder - inspect submitted jobs
    pub transcoder: Arc<MockTranscoder>,
    /// Mock artwork fetcher - choose which URLs exist
    pub fetcher: Arc<MockArtworkFetcher>,
    /// Broadcaster feeding the WebSocket
    pub broadcaster: WsBroadcaster,
    /// Temporary directory for output and temp files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let extractor = Arc::new(MockExtractor::new());
        let transcoder = Arc::new(MockTranscoder::new());
        let fetcher = Arc::new(MockArtworkFetcher::new());

        let config = Config {
            pipeline: fixtures::pipeline_config(temp_dir.path()),
            ..Default::default()
        };

        let broadcaster = WsBroadcaster::default();
        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&extractor) as Arc<dyn tunegrab_core::Extractor>,
            Arc::clone(&transcoder) as Arc<dyn tunegrab_core::Transcoder>,
            Arc::clone(&fetcher) as Arc<dyn tunegrab_core::ArtworkFetcher>,
            broadcaster.clone(),
        ));

        let router = tunegrab_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            extractor,
            transcoder,
            fetcher,
            broadcaster,
            temp_dir,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("out")
    }

    pub fn temp_files_dir(&self) -> PathBuf {
        self.temp_dir.path().join("tmp")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Waits for the `job_finished` message of `job_id` on `rx`.
    pub async fn wait_for_finish(
        rx: &mut tokio::sync::broadcast::Receiver<WsMessage>,
        job_id: &str,
    ) -> Value {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let msg = rx.recv().await.expect("broadcast closed");
                if let WsMessage::JobFinished { job_id: id, .. } = &msg {
                    if id == job_id {
                        return serde_json::to_value(&msg).unwrap();
                    }
                }
            }
        })
        .await
        .expect("job never finished")
    }

    /// Polls until the extractor has seen `count` downloads.
    pub async fn wait_for_downloads(&self, count: usize) {
        for _ in 0..200 {
            if self.extractor.download_count().await >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("download never started");
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
