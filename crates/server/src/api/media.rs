//! Metadata lookup endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tunegrab_core::MediaInfo;

use super::error::ApiError;
use crate::state::AppState;

/// Request body for metadata lookups
#[derive(Debug, Deserialize)]
pub struct UrlBody {
    pub url: String,
}

/// Response for playlist enumeration
#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    pub items: Vec<MediaInfo>,
    pub total: usize,
}

/// Metadata for a single item
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UrlBody>,
) -> Result<Json<MediaInfo>, ApiError> {
    let url = checked_url(&body.url)?;
    let info = state.coordinator().single_item_info(url).await?;
    Ok(Json(info))
}

/// Flat playlist enumeration
pub async fn get_playlist(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UrlBody>,
) -> Result<Json<PlaylistResponse>, ApiError> {
    let url = checked_url(&body.url)?;
    let items = state.coordinator().playlist_info(url).await?;
    Ok(Json(PlaylistResponse {
        total: items.len(),
        items,
    }))
}

fn checked_url(url: &str) -> Result<&str, ApiError> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(ApiError::bad_request(format!("not an http(s) URL: {}", url)))
    }
}
