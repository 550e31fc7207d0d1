//! Download job endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use tunegrab_core::{
    CoverAspect, CustomArtwork, DownloadRequest, JobSnapshot, TargetFormat, TrackTags, TrimWindow,
};

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for starting a download
#[derive(Debug, Default, Deserialize)]
pub struct CreateDownloadBody {
    /// Caller chosen id; generated when absent
    pub id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub format: TargetFormat,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Seconds
    pub trim_start: Option<f64>,
    /// Seconds
    pub trim_end: Option<f64>,
    #[serde(default)]
    pub cover_aspect: CoverAspect,
    /// Thumbnail from an earlier `/info` lookup
    pub thumbnail_url: Option<String>,
    /// Inline cover, optionally as a `data:` URL
    pub cover_base64: Option<String>,
    /// Extension of the inline cover when not given by a `data:` URL
    pub cover_extension: Option<String>,
    /// Cover image already on the server's disk
    pub cover_path: Option<PathBuf>,
}

/// Response for a started download
#[derive(Debug, Serialize)]
pub struct CreateDownloadResponse {
    pub id: String,
}

/// Response for a cancel request
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a download job
///
/// Returns as soon as the job is registered. Progress and the final result
/// are delivered over the WebSocket.
pub async fn create_download(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateDownloadBody>,
) -> Result<(StatusCode, Json<CreateDownloadResponse>), ApiError> {
    let request = body.into_request()?;

    let buffer = state.config().pipeline.progress_buffer.max(1);
    let (tx, mut rx) = mpsc::channel(buffer);

    let handle = state.coordinator().spawn(request, tx).await?;
    let id = handle.id().to_string();

    let broadcaster = state.ws_broadcaster().clone();
    let job_id = id.clone();
    tokio::spawn(async move {
        let forward = {
            let broadcaster = broadcaster.clone();
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    broadcaster.progress(event);
                }
            })
        };

        let result = handle.wait().await;
        // Progress for the job is fully delivered before its final message
        let _ = forward.await;
        broadcaster.job_finished(&job_id, &result);
        debug!(job_id = %job_id, "Reported job result");
    });

    Ok((StatusCode::ACCEPTED, Json(CreateDownloadResponse { id })))
}

/// List active jobs
pub async fn list_downloads(State(state): State<Arc<AppState>>) -> Json<Vec<JobSnapshot>> {
    Json(state.coordinator().active_jobs().await)
}

/// Cancel a job. Unknown ids are not an error.
pub async fn cancel_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<CancelResponse> {
    let cancelled = state.coordinator().cancel(&id).await;
    Json(CancelResponse { cancelled })
}

// ============================================================================
// Helpers
// ============================================================================

impl CreateDownloadBody {
    fn into_request(self) -> Result<DownloadRequest, ApiError> {
        let custom_artwork = match (self.cover_base64, self.cover_path) {
            (Some(_), Some(_)) => {
                return Err(ApiError::bad_request(
                    "cover_base64 and cover_path are mutually exclusive",
                ))
            }
            (Some(encoded), None) => Some(decode_inline_cover(
                &encoded,
                self.cover_extension.as_deref(),
            )?),
            (None, Some(path)) => Some(CustomArtwork::File(path)),
            (None, None) => None,
        };

        let tags = TrackTags {
            title: self.title,
            artist: self.artist,
            album: self.album,
        };

        let mut request = DownloadRequest::new(self.url, self.format)
            .with_tags(tags)
            .with_trim(TrimWindow::new(self.trim_start, self.trim_end))
            .with_cover_aspect(self.cover_aspect);
        request.id = self.id;
        request.thumbnail_url = self.thumbnail_url;
        request.custom_artwork = custom_artwork;

        Ok(request)
    }
}

/// Decodes base64 cover bytes, accepting a `data:image/<ext>;base64,` prefix.
fn decode_inline_cover(
    encoded: &str,
    extension: Option<&str>,
) -> Result<CustomArtwork, ApiError> {
    let encoded = encoded.trim();
    let (mime_ext, payload) = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| ApiError::bad_request("malformed data URL"))?;
            let ext = header
                .split(';')
                .next()
                .and_then(|mime| mime.strip_prefix("image/"))
                .map(str::to_string);
            (ext, payload)
        }
        None => (None, encoded),
    };

    let data = STANDARD
        .decode(payload)
        .map_err(|e| ApiError::bad_request(format!("invalid cover_base64: {}", e)))?;
    if data.is_empty() {
        return Err(ApiError::bad_request("cover_base64 is empty"));
    }

    let extension = mime_ext
        .or_else(|| extension.map(str::to_string))
        .unwrap_or_else(|| "jpg".to_string());

    Ok(CustomArtwork::Inline { data, extension })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_url() {
        let artwork = decode_inline_cover("data:image/png;base64,aGVsbG8=", None).unwrap();
        assert_eq!(
            artwork,
            CustomArtwork::Inline {
                data: b"hello".to_vec(),
                extension: "png".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_plain_base64_uses_given_extension() {
        let artwork = decode_inline_cover("aGVsbG8=", Some("webp")).unwrap();
        assert!(matches!(
            artwork,
            CustomArtwork::Inline { ref extension, .. } if extension == "webp"
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_inline_cover("!!not base64!!", None).is_err());
        assert!(decode_inline_cover("data:image/png;base64", None).is_err());
        assert!(decode_inline_cover("", None).is_err());
    }

    #[test]
    fn test_body_rejects_two_covers() {
        let body = CreateDownloadBody {
            url: "https://example.com/video123".to_string(),
            cover_base64: Some("aGVsbG8=".to_string()),
            cover_path: Some(PathBuf::from("/tmp/cover.jpg")),
            ..Default::default()
        };
        assert!(body.into_request().is_err());
    }

    #[test]
    fn test_body_maps_to_request() {
        let body = CreateDownloadBody {
            id: Some("job-1".to_string()),
            url: "https://example.com/video123".to_string(),
            format: TargetFormat::M4a,
            title: Some("Song".to_string()),
            trim_start: Some(5.0),
            cover_aspect: CoverAspect::Widescreen,
            ..Default::default()
        };

        let request = body.into_request().unwrap();
        assert_eq!(request.id.as_deref(), Some("job-1"));
        assert_eq!(request.format, TargetFormat::M4a);
        assert_eq!(request.tags.title.as_deref(), Some("Song"));
        assert_eq!(request.trim.start, Some(5.0));
        assert_eq!(request.cover_aspect, CoverAspect::Widescreen);
        assert!(request.custom_artwork.is_none());
    }
}
