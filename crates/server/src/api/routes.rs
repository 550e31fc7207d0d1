use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{downloads, handlers, media, ws};
use crate::metrics::track_requests;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Metadata
        .route("/info", post(media::get_info))
        .route("/playlist", post(media::get_playlist))
        // Jobs
        .route("/downloads", post(downloads::create_download))
        .route("/downloads", get(downloads::list_downloads))
        .route("/downloads/{id}", delete(downloads::cancel_download))
        // Live updates
        .route("/ws", get(ws::ws_handler))
        .route_layer(middleware::from_fn(track_requests))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
