//! Prometheus registry for the HTTP surface.
//!
//! Holds request and WebSocket metrics next to the job metrics exported by
//! the core, and the middleware that feeds the request metrics.

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use prometheus::{
    core::Collector, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    Opts, Registry, TextEncoder,
};
use std::time::Instant;
use tracing::error;

/// Requests by method, matched route and status.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunegrab_http_requests_total", "Total HTTP requests"),
        &["method", "route", "status"],
    )
    .unwrap()
});

/// Request latency by matched route.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tunegrab_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.005, 0.025, 0.1, 0.5, 2.5, 10.0, 60.0]),
        &["route"],
    )
    .unwrap()
});

/// Connected WebSocket clients.
pub static WS_CLIENTS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("tunegrab_ws_clients", "Connected WebSocket clients").unwrap()
});

/// Events pushed to WebSocket clients, by message type.
pub static WS_EVENTS_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunegrab_ws_events_sent_total", "Events sent to WebSocket clients"),
        &["type"],
    )
    .unwrap()
});

/// Events a slow client missed because the broadcast buffer wrapped.
pub static WS_EVENTS_DROPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tunegrab_ws_events_dropped_total",
        "Events skipped by lagging WebSocket clients",
    )
    .unwrap()
});

pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    let server: Vec<Box<dyn Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(WS_CLIENTS.clone()),
        Box::new(WS_EVENTS_SENT.clone()),
        Box::new(WS_EVENTS_DROPPED.clone()),
    ];
    for metric in server
        .into_iter()
        .chain(tunegrab_core::metrics::all_metrics())
    {
        registry.register(metric).unwrap();
    }
    registry
});

/// Records every routed API request.
///
/// Labels use the route template (`/api/v1/downloads/{id}`), never the raw
/// path, since job ids are caller chosen.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    HTTP_REQUEST_DURATION
        .with_label_values(&[&route])
        .observe(start.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &route, &status])
        .inc();

    response
}

/// Prometheus text exposition of the whole registry.
pub fn encode_metrics() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
