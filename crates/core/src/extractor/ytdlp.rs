//! yt-dlp based extractor implementation.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::platform::{self, Platform};
use crate::process::{run_supervised, ProcessExit};

use super::config::ExtractorConfig;
use super::error::ExtractorError;
use super::progress::{ProgressParser, YtDlpProgressParser};
use super::traits::Extractor;
use super::types::{AudioDownload, MediaInfo};

/// Titles yt-dlp reports when it does not know the real one.
const PLACEHOLDER_TITLES: &[&str] = &[
    "na",
    "n/a",
    "unknown",
    "untitled",
    "[private video]",
    "[deleted video]",
];

/// One JSON object as printed by `--dump-json`.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    thumbnails: Option<Vec<RawThumbnail>>,
    uploader: Option<String>,
    channel: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    ie_key: Option<String>,
    extractor_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    url: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        match Option::<serde_json::Value>::deserialize(deserializer)? {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        },
    )
}

impl RawEntry {
    fn is_youtube(&self) -> bool {
        let key_says_youtube = [&self.ie_key, &self.extractor_key]
            .iter()
            .any(|k| k.as_deref().is_some_and(|k| k.eq_ignore_ascii_case("youtube")));

        key_says_youtube
            || [&self.webpage_url, &self.url]
                .iter()
                .any(|u| u.as_deref().is_some_and(|u| Platform::of(u) == Platform::YouTube))
    }

    fn page_url(&self) -> Option<String> {
        self.webpage_url
            .clone()
            .or_else(|| self.url.clone().filter(|u| u.starts_with("http")))
    }

    fn uploader(&self) -> Option<String> {
        self.uploader
            .clone()
            .or_else(|| self.channel.clone())
            .filter(|u| !u.trim().is_empty())
    }

    fn last_listed_thumbnail(&self) -> Option<String> {
        self.thumbnails
            .as_ref()
            .and_then(|list| list.iter().rev().find_map(|t| t.url.clone()))
    }
}

fn is_placeholder_title(title: Option<&str>, id: &str) -> bool {
    match title.map(str::trim) {
        None => true,
        Some(t) => {
            t.is_empty()
                || t == id
                || PLACEHOLDER_TITLES
                    .iter()
                    .any(|p| t.eq_ignore_ascii_case(p))
        }
    }
}

/// YouTube serves `vi_webp` / `.webp` thumbnails inconsistently.
fn is_unreliable_youtube_thumbnail(url: &str) -> bool {
    Platform::of(url) == Platform::YouTube
        && (url.contains("/vi_webp/") || url.split('?').next().is_some_and(|p| p.ends_with(".webp")))
}

/// Parses `--dump-json --no-playlist` output into a `MediaInfo`.
pub fn parse_single_item(output: &str, requested_url: &str) -> Result<MediaInfo, ExtractorError> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| ExtractorError::extraction_failed("yt-dlp printed no metadata", None))?;

    let raw: RawEntry = serde_json::from_str(line).map_err(|e| {
        ExtractorError::extraction_failed(format!("Failed to parse yt-dlp output: {}", e), None)
    })?;

    let id = raw
        .id
        .clone()
        .ok_or_else(|| ExtractorError::extraction_failed("yt-dlp output has no id", None))?;

    let is_youtube = raw.is_youtube() || Platform::of(requested_url) == Platform::YouTube;
    let thumbnail = raw.thumbnail.clone().or_else(|| raw.last_listed_thumbnail());
    let thumbnail_url = if is_youtube {
        match thumbnail {
            Some(t) if !is_unreliable_youtube_thumbnail(&t) => Some(t),
            _ => Some(platform::youtube_fallback_thumbnail(&id)),
        }
    } else {
        thumbnail
    };

    let title = raw
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| id.clone());

    Ok(MediaInfo {
        title,
        duration_secs: raw.duration,
        thumbnail_url,
        uploader: raw.uploader(),
        webpage_url: raw.page_url().unwrap_or_else(|| requested_url.to_string()),
        id,
    })
}

/// Parses `--flat-playlist --dump-json` output, one JSON object per line.
///
/// Malformed lines and lines without an id are skipped; order is preserved.
pub fn parse_playlist_output(output: &str) -> Vec<MediaInfo> {
    let mut items = Vec::new();

    for (idx, line) in output.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let raw: RawEntry = match serde_json::from_str(line) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Skipping malformed playlist line {}: {}", idx + 1, e);
                continue;
            }
        };

        match playlist_entry(raw) {
            Some(item) => items.push(item),
            None => debug!("Skipping playlist line {} without an id", idx + 1),
        }
    }

    items
}

fn playlist_entry(raw: RawEntry) -> Option<MediaInfo> {
    let id = raw.id.clone()?;
    let is_youtube = raw.is_youtube();

    let webpage_url = raw
        .page_url()
        .or_else(|| is_youtube.then(|| format!("https://www.youtube.com/watch?v={}", id)))
        .unwrap_or_default();

    let thumbnail_url = raw
        .thumbnail
        .clone()
        .or_else(|| raw.last_listed_thumbnail())
        .or_else(|| is_youtube.then(|| platform::youtube_fallback_thumbnail(&id)));

    let mut title = raw.title.clone().filter(|t| !t.trim().is_empty());
    let mut uploader = raw.uploader();

    if is_placeholder_title(title.as_deref(), &id) {
        if let Some((artist, track)) = platform::soundcloud_tags_from_url(&webpage_url) {
            title = Some(track);
            if is_placeholder_title(uploader.as_deref(), &id) {
                uploader = Some(artist);
            }
        }
    }

    Some(MediaInfo {
        title: title.unwrap_or_else(|| id.clone()),
        duration_secs: raw.duration,
        thumbnail_url,
        uploader,
        webpage_url,
        id,
    })
}

/// yt-dlp based extractor.
pub struct YtDlpExtractor {
    config: ExtractorConfig,
    parser: Box<dyn ProgressParser>,
}

impl YtDlpExtractor {
    /// Creates a new extractor with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            parser: Box::new(YtDlpProgressParser),
        }
    }

    /// Creates an extractor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ExtractorConfig::default())
    }

    /// Replaces the progress adapter.
    pub fn with_progress_parser(mut self, parser: impl ProgressParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Arguments for single-item metadata.
    pub fn single_item_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args.extend(["--".to_string(), url.to_string()]);
        args
    }

    /// Arguments for flat playlist enumeration.
    pub fn playlist_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--flat-playlist".to_string(),
            "--dump-json".to_string(),
            "--yes-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args.extend(["--".to_string(), url.to_string()]);
        args
    }

    /// Arguments for the raw audio download.
    pub fn download_args(&self, request: &AudioDownload) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            self.config.format_selector.clone(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--no-warnings".to_string(),
            "--no-mtime".to_string(),
            "-o".to_string(),
            request.output_template.to_string_lossy().to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args.extend(["--".to_string(), request.url.clone()]);
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.config.ytdlp_path);
        command.args(args);
        command
    }

    fn spawn_error(&self, e: std::io::Error) -> ExtractorError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractorError::NotFound {
                path: self.config.ytdlp_path.clone(),
            }
        } else {
            ExtractorError::Io(e)
        }
    }

    /// Runs yt-dlp to completion and captures both output streams.
    async fn capture(&self, args: &[String]) -> Result<(ExitStatus, String, String), ExtractorError> {
        let mut command = self.command(args);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match self.config.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), command.output())
                .await
                .map_err(|_| ExtractorError::Timeout { timeout_secs: secs })?,
            None => command.output().await,
        }
        .map_err(|e| self.spawn_error(e))?;

        Ok((
            output.status,
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        ))
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn single_item_info(&self, url: &str) -> Result<MediaInfo, ExtractorError> {
        debug!("yt-dlp single item: {}", url);
        let (status, stdout, stderr) = self.capture(&self.single_item_args(url)).await?;

        if !status.success() {
            return Err(ExtractorError::extraction_failed(
                format!("yt-dlp exited with code: {:?}", status.code()),
                Some(stderr),
            ));
        }

        parse_single_item(&stdout, url)
    }

    async fn playlist_info(&self, url: &str) -> Result<Vec<MediaInfo>, ExtractorError> {
        debug!("yt-dlp playlist: {}", url);
        let (status, stdout, stderr) = self.capture(&self.playlist_args(url)).await?;
        let items = parse_playlist_output(&stdout);

        if items.is_empty() {
            if !status.success() {
                return Err(ExtractorError::extraction_failed(
                    format!("yt-dlp exited with code: {:?}", status.code()),
                    Some(stderr),
                ));
            }
            return Err(ExtractorError::NoItemsFound);
        }

        if !status.success() {
            warn!(
                "yt-dlp exited with code {:?} after listing {} items, keeping partial playlist",
                status.code(),
                items.len()
            );
        }

        info!("Playlist {} enumerated to {} items", url, items.len());
        Ok(items)
    }

    async fn download_audio(
        &self,
        request: &AudioDownload,
        progress_tx: mpsc::Sender<f32>,
        cancel: CancellationToken,
    ) -> Result<(), ExtractorError> {
        let args = self.download_args(request);
        debug!(job_id = %request.job_id, "Starting yt-dlp download: {:?}", args);

        let parser = self.parser.as_ref();
        let exit = run_supervised(
            self.command(&args),
            &cancel,
            self.config.timeout_secs.map(Duration::from_secs),
            |line| {
                if let Some(percent) = parser.parse(line) {
                    // Non-blocking send; a slow consumer only loses intermediate ticks
                    let _ = progress_tx.try_send(percent);
                }
            },
        )
        .await
        .map_err(|e| self.spawn_error(e))?;

        match exit {
            ProcessExit::Exited { status, .. } if status.success() => Ok(()),
            ProcessExit::Exited { status, stderr } => Err(ExtractorError::extraction_failed(
                format!("yt-dlp exited with code: {:?}", status.code()),
                Some(stderr),
            )),
            ProcessExit::Killed => Err(ExtractorError::Cancelled),
            ProcessExit::TimedOut => Err(ExtractorError::Timeout {
                timeout_secs: self.config.timeout_secs.unwrap_or_default(),
            }),
        }
    }
}
