//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (results, duration, currently active)
//! - Artwork resolution (which tier produced the cover)
//! - Transcoding (duration per target format)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs finished total by result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunegrab_jobs_total", "Total jobs that reached a terminal state"),
        &["result"], // "success", "failed", "cancelled"
    )
    .unwrap()
});

/// Job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("tunegrab_job_duration_seconds", "Duration of jobs")
            .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"],
    )
    .unwrap()
});

/// Jobs currently registered.
pub static ACTIVE_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("tunegrab_active_jobs", "Number of jobs currently registered").unwrap()
});

// =============================================================================
// Artwork Metrics
// =============================================================================

/// Artwork resolutions by tier.
pub static ARTWORK_RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tunegrab_artwork_resolutions_total",
            "Total artwork resolutions by winning tier",
        ),
        &["tier"], // "custom", "remote", "legacy", "none"
    )
    .unwrap()
});

// =============================================================================
// Transcode Metrics
// =============================================================================

/// Successful transcode duration in seconds.
pub static TRANSCODE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tunegrab_transcode_duration_seconds",
            "Duration of successful transcodes",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["format"], // "mp3", "m4a"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(ACTIVE_JOBS.clone()),
        // Artwork
        Box::new(ARTWORK_RESOLUTIONS.clone()),
        // Transcode
        Box::new(TRANSCODE_DURATION.clone()),
    ]
}
