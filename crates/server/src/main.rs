use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunegrab_core::{
    artwork::ArtworkFetcher, extractor::Extractor, load_config, transcoder::Transcoder,
    validate_config, FfmpegTranscoder, HttpArtworkFetcher, YtDlpExtractor,
};
use tunegrab_server::api::{create_router, spawn_heartbeat, WsBroadcaster};
use tunegrab_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TUNEGRAB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("yt-dlp: {:?}", config.extractor.ytdlp_path);
    info!("ffmpeg: {:?}", config.transcoder.ffmpeg_path);
    info!("Output directory: {:?}", config.pipeline.output_dir);

    tokio::fs::create_dir_all(&config.pipeline.output_dir)
        .await
        .with_context(|| format!("Failed to create {:?}", config.pipeline.output_dir))?;
    tokio::fs::create_dir_all(&config.pipeline.temp_dir)
        .await
        .with_context(|| format!("Failed to create {:?}", config.pipeline.temp_dir))?;

    let extractor: Arc<dyn Extractor> = Arc::new(YtDlpExtractor::new(config.extractor.clone()));
    let transcoder: Arc<dyn Transcoder> =
        Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    let fetcher: Arc<dyn ArtworkFetcher> = Arc::new(
        HttpArtworkFetcher::new(&config.artwork).context("Failed to create artwork client")?,
    );

    let ws_broadcaster = WsBroadcaster::default();
    let heartbeat = spawn_heartbeat(
        ws_broadcaster.clone(),
        Duration::from_secs(config.server.heartbeat_secs),
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(
        config,
        extractor,
        transcoder,
        fetcher,
        ws_broadcaster,
    ));
    let app = create_router(Arc::clone(&state));

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    heartbeat.abort();

    // Kill whatever is still running so no tool outlives the server
    for job in state.coordinator().active_jobs().await {
        info!(job_id = %job.id, "Cancelling job on shutdown");
        state.coordinator().cancel(&job.id).await;
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
