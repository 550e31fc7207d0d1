//! Pipeline lifecycle integration tests.
//!
//! These tests drive whole jobs through the coordinator with mocked tools:
//! registered -> extracting -> resolving art -> transcoding -> complete
//! plus the cancellation and failure paths, checking that every path leaves
//! the temp directory clean and the registry empty.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tunegrab_core::{
    extractor::{AudioDownload, Extractor, ExtractorError, MediaInfo},
    pipeline::{
        CustomArtwork, JobState, PipelineCoordinator, PipelineError, ProgressEvent, ProgressStage,
    },
    testing::{fixtures, MockArtworkFetcher, MockCoordinator, MockExtractor, MockTranscoder},
    transcoder::{FfmpegTranscoder, TranscodeError, TranscodeJob, Transcoder},
};

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
const MAXRES_URL: &str = "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg";
const HQ_URL: &str = "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg";

/// Test helper bundling a coordinator with handles to its mocks.
struct TestHarness {
    coordinator: MockCoordinator,
    extractor: Arc<MockExtractor>,
    transcoder: Arc<MockTranscoder>,
    fetcher: Arc<MockArtworkFetcher>,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (coordinator, extractor, transcoder, fetcher) = fixtures::coordinator(
            temp_dir.path(),
            MockExtractor::new(),
            MockTranscoder::new(),
            MockArtworkFetcher::new(),
        );

        Self {
            coordinator,
            extractor,
            transcoder,
            fetcher,
            temp_dir,
        }
    }

    fn temp_files_dir(&self) -> PathBuf {
        self.temp_dir.path().join("tmp")
    }

    fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("out")
    }

    /// Names of files in the temp dir carrying the job's prefix.
    fn leftover_files(&self, job_id: &str) -> Vec<String> {
        prefixed_files(&self.temp_files_dir(), job_id)
    }

    /// Polls until the job reports `state`.
    async fn wait_for_state(&self, job_id: &str, state: JobState) {
        for _ in 0..200 {
            let jobs = self.coordinator.active_jobs().await;
            if jobs.iter().any(|j| j.id == job_id && j.state == state) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never reached {:?}", job_id, state);
    }

    /// Polls until the extractor has seen `count` downloads.
    async fn wait_for_downloads(&self, count: usize) {
        for _ in 0..200 {
            if self.extractor.download_count().await >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("download never started");
    }
}

fn prefixed_files(dir: &Path, job_id: &str) -> Vec<String> {
    let prefix = format!("tg_{}_", job_id);
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| name.starts_with(&prefix))
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn drain(rx: &mut mpsc::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_complete_job_reports_progress_and_cleans_up() {
    let harness = TestHarness::new();
    harness.fetcher.set_available(MAXRES_URL).await;
    let (tx, mut rx) = mpsc::channel(64);

    let outcome = harness
        .coordinator
        .run(fixtures::download_request("job-1", VIDEO_URL), tx)
        .await
        .expect("job should succeed");

    assert_eq!(outcome.job_id, "job-1");
    assert_eq!(outcome.output_path, harness.output_dir().join("Song.mp3"));
    assert!(outcome.output_path.exists());
    assert!(outcome.has_artwork);

    let events = drain(&mut rx);
    let stages: Vec<(ProgressStage, f32)> = events.iter().map(|e| (e.stage, e.percent)).collect();
    assert_eq!(
        stages,
        vec![
            (ProgressStage::Downloading, 25.0),
            (ProgressStage::Downloading, 50.0),
            (ProgressStage::Downloading, 100.0),
            (ProgressStage::Converting, 0.0),
            (ProgressStage::Complete, 100.0),
        ]
    );
    assert!(events.iter().all(|e| e.job_id == "job-1"));

    // The transcoder saw the raw audio, the tags and the fetched cover
    let transcodes = harness.transcoder.recorded_transcodes().await;
    assert_eq!(transcodes.len(), 1);
    let job = &transcodes[0].job;
    assert_eq!(
        job.input_path,
        harness.temp_files_dir().join("tg_job-1_audio.webm")
    );
    assert_eq!(job.tags.title.as_deref(), Some("Song"));
    let artwork = job.artwork.as_ref().expect("artwork should be attached");
    assert_eq!(artwork.path, harness.temp_files_dir().join("tg_job-1_cover.jpg"));
    assert!(!artwork.legacy);

    assert!(harness.leftover_files("job-1").is_empty());
    assert!(harness.coordinator.registry().is_empty().await);
}

#[tokio::test]
async fn test_job_without_any_artwork_still_completes() {
    let harness = TestHarness::new();
    let (tx, _rx) = mpsc::channel(64);

    let outcome = harness
        .coordinator
        .run(fixtures::download_request("no-art", "https://example.com/video123"), tx)
        .await
        .unwrap();

    assert!(!outcome.has_artwork);
    let transcodes = harness.transcoder.recorded_transcodes().await;
    assert!(transcodes[0].job.artwork.is_none());
    assert!(harness.leftover_files("no-art").is_empty());
}

#[tokio::test]
async fn test_untitled_job_is_named_after_its_id() {
    let harness = TestHarness::new();
    let (tx, _rx) = mpsc::channel(64);
    let request = tunegrab_core::DownloadRequest::new(
        "https://example.com/video123",
        tunegrab_core::TargetFormat::M4a,
    )
    .with_id("untitled-1");

    let outcome = harness.coordinator.run(request, tx).await.unwrap();

    assert_eq!(outcome.output_path, harness.output_dir().join("untitled-1.m4a"));
}

#[tokio::test]
async fn test_legacy_thumbnail_is_cropped_by_transcoder() {
    let harness = TestHarness::new();
    // Only the letterboxed tier exists
    harness.fetcher.set_available(HQ_URL).await;
    let (tx, _rx) = mpsc::channel(64);

    let outcome = harness
        .coordinator
        .run(fixtures::download_request("legacy-1", VIDEO_URL), tx)
        .await
        .unwrap();
    assert!(outcome.has_artwork);

    let requested = harness.fetcher.requested_urls().await;
    assert_eq!(requested.first().map(String::as_str), Some(MAXRES_URL));
    assert_eq!(requested.last().map(String::as_str), Some(HQ_URL));

    let transcodes = harness.transcoder.recorded_transcodes().await;
    let job = &transcodes[0].job;
    assert!(job.artwork.as_ref().is_some_and(|a| a.legacy));

    let args = FfmpegTranscoder::with_defaults().build_args(job);
    assert!(args.iter().any(|a| a.starts_with("crop=iw:iw*9/16,")));
}

#[tokio::test]
async fn test_inline_custom_artwork_outranks_remote() {
    let harness = TestHarness::new();
    harness.fetcher.set_available(MAXRES_URL).await;
    let (tx, _rx) = mpsc::channel(64);

    let request = fixtures::download_request("custom-1", VIDEO_URL).with_custom_artwork(
        CustomArtwork::Inline {
            data: b"\x89PNGcustom".to_vec(),
            extension: "png".to_string(),
        },
    );

    let outcome = harness.coordinator.run(request, tx).await.unwrap();
    assert!(outcome.has_artwork);

    // Never touched the network
    assert_eq!(harness.fetcher.request_count().await, 0);

    let transcodes = harness.transcoder.recorded_transcodes().await;
    let artwork = transcodes[0].job.artwork.as_ref().unwrap();
    assert_eq!(
        artwork.path,
        harness.temp_files_dir().join("tg_custom-1_custom.png")
    );
    assert!(!artwork.legacy);

    assert!(harness.leftover_files("custom-1").is_empty());
}

#[tokio::test]
async fn test_custom_artwork_file_is_left_in_place() {
    let harness = TestHarness::new();
    let cover = harness.temp_dir.path().join("my-cover.jpg");
    std::fs::write(&cover, b"cover").unwrap();
    let (tx, _rx) = mpsc::channel(64);

    let request = fixtures::download_request("file-art", VIDEO_URL)
        .with_custom_artwork(CustomArtwork::File(cover.clone()));

    harness.coordinator.run(request, tx).await.unwrap();

    assert_eq!(harness.fetcher.request_count().await, 0);
    let transcodes = harness.transcoder.recorded_transcodes().await;
    assert_eq!(transcodes[0].job.artwork.as_ref().unwrap().path, cover);
    assert!(cover.exists());
}

#[tokio::test]
async fn test_cancel_during_download() {
    let harness = TestHarness::new();
    harness.extractor.set_run_until_cancelled(true).await;
    let (tx, _rx) = mpsc::channel(64);

    let handle = harness
        .coordinator
        .spawn(fixtures::download_request("cancel-1", VIDEO_URL), tx)
        .await
        .unwrap();
    assert_eq!(handle.id(), "cancel-1");

    harness.wait_for_downloads(1).await;
    assert!(harness.coordinator.registry().contains("cancel-1").await);

    assert!(harness.coordinator.cancel("cancel-1").await);
    // Hidden from every view as soon as cancel returns
    assert!(!harness.coordinator.registry().contains("cancel-1").await);
    assert!(harness.coordinator.active_jobs().await.is_empty());

    let result = handle.wait().await;
    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert!(harness.coordinator.registry().is_empty().await);

    assert_eq!(harness.transcoder.transcode_count().await, 0);
    assert!(harness.leftover_files("cancel-1").is_empty());
    assert!(!harness.output_dir().join("Song.mp3").exists());
}

#[tokio::test]
async fn test_cancel_while_artwork_resolves_skips_transcode() {
    let harness = TestHarness::new();
    harness.fetcher.set_available(MAXRES_URL).await;
    harness.fetcher.set_delay(Duration::from_millis(300)).await;
    let (tx, mut rx) = mpsc::channel(64);

    let handle = harness
        .coordinator
        .spawn(fixtures::download_request("race-1", VIDEO_URL), tx)
        .await
        .unwrap();

    // Wait for the download to finish
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("progress stalled")
            .expect("channel closed");
        if event.stage == ProgressStage::Converting {
            break;
        }
    }

    assert!(harness.coordinator.cancel("race-1").await);

    let result = handle.wait().await;
    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(harness.transcoder.transcode_count().await, 0);

    // No completion event after a cancel
    let rest = drain(&mut rx);
    assert!(rest.iter().all(|e| e.stage != ProgressStage::Complete));

    assert!(harness.leftover_files("race-1").is_empty());
}

#[tokio::test]
async fn test_cancel_during_transcode_kills_it() {
    let harness = TestHarness::new();
    harness.fetcher.set_available(MAXRES_URL).await;
    harness.transcoder.set_duration(Duration::from_secs(30)).await;
    let (tx, mut rx) = mpsc::channel(64);

    let handle = harness
        .coordinator
        .spawn(fixtures::download_request("mux-1", VIDEO_URL), tx)
        .await
        .unwrap();

    harness.wait_for_state("mux-1", JobState::Transcoding).await;
    assert!(harness.coordinator.cancel("mux-1").await);

    let result = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("transcode was not interrupted");
    assert!(matches!(result, Err(PipelineError::Cancelled)));

    assert!(!harness.output_dir().join("Song.mp3").exists());
    assert!(harness.leftover_files("mux-1").is_empty());
    assert!(harness.coordinator.registry().is_empty().await);
    assert!(drain(&mut rx)
        .iter()
        .all(|e| e.stage != ProgressStage::Complete));
}

#[tokio::test]
async fn test_undrained_progress_channel_does_not_stall_job() {
    let harness = TestHarness::new();
    harness
        .extractor
        .set_progress_steps(vec![10.0, 20.0, 40.0, 80.0, 100.0])
        .await;
    let (tx, _rx) = mpsc::channel(2);

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        harness
            .coordinator
            .run(fixtures::download_request("slow-reader", VIDEO_URL), tx),
    )
    .await
    .expect("job stalled on a full progress channel")
    .unwrap();

    assert_eq!(outcome.output_path, harness.output_dir().join("Song.mp3"));
    assert!(harness.coordinator.registry().is_empty().await);
}

#[tokio::test]
async fn test_cancel_unknown_job() {
    let harness = TestHarness::new();
    assert!(!harness.coordinator.cancel("does-not-exist").await);
    assert!(harness.coordinator.registry().is_empty().await);
}

#[tokio::test]
async fn test_missing_raw_audio_fails_with_file_location() {
    let harness = TestHarness::new();
    harness.extractor.set_produce_audio(false).await;
    let (tx, mut rx) = mpsc::channel(64);

    let result = harness
        .coordinator
        .run(fixtures::download_request("noaudio", VIDEO_URL), tx)
        .await;

    match result {
        Err(PipelineError::FileLocation { prefix }) => assert!(prefix.contains("tg_noaudio_")),
        other => panic!("expected FileLocation, got {:?}", other),
    }

    // The .part sidecar is purged too
    assert!(harness.leftover_files("noaudio").is_empty());
    assert!(drain(&mut rx)
        .iter()
        .all(|e| e.stage != ProgressStage::Complete));
}

#[tokio::test]
async fn test_extraction_failure_propagates() {
    let harness = TestHarness::new();
    harness
        .extractor
        .set_next_error(ExtractorError::extraction_failed(
            "yt-dlp exited with code: Some(1)",
            Some("ERROR: Video unavailable".to_string()),
        ))
        .await;
    let (tx, _rx) = mpsc::channel(64);

    let err = harness
        .coordinator
        .run(fixtures::download_request("gone-1", VIDEO_URL), tx)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Extraction(_)));
    assert_eq!(err.user_message(), "ERROR: Video unavailable");
    assert_eq!(harness.transcoder.transcode_count().await, 0);
    assert!(harness.leftover_files("gone-1").is_empty());
    assert!(harness.coordinator.registry().is_empty().await);
}

#[tokio::test]
async fn test_transcode_failure_keeps_existing_output_with_same_title() {
    let harness = TestHarness::new();
    let (tx, _rx) = mpsc::channel(64);

    let first = harness
        .coordinator
        .run(fixtures::download_request("good-1", VIDEO_URL), tx.clone())
        .await
        .unwrap();
    let song = harness.output_dir().join("Song.mp3");
    assert_eq!(first.output_path, song);
    let finished = std::fs::read(&song).unwrap();

    harness
        .transcoder
        .set_next_error(TranscodeError::Failed {
            code: Some(1),
            stderr: "Invalid data found when processing input".to_string(),
        })
        .await;

    let err = harness
        .coordinator
        .run(fixtures::download_request("bad-1", VIDEO_URL), tx)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Transcode(_)));
    assert_eq!(std::fs::read(&song).unwrap(), finished);
    // The mock's failure left nothing staged, and nothing leaked out of the namespace
    assert!(harness.leftover_files("bad-1").is_empty());
    assert_eq!(std::fs::read_dir(harness.output_dir()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_transcoder_writes_inside_job_namespace() {
    let harness = TestHarness::new();
    let (tx, _rx) = mpsc::channel(64);

    harness
        .coordinator
        .run(fixtures::download_request("staged-1", VIDEO_URL), tx)
        .await
        .unwrap();

    let transcodes = harness.transcoder.recorded_transcodes().await;
    assert_eq!(
        transcodes[0].job.output_path,
        harness.temp_files_dir().join("tg_staged-1_out.mp3")
    );
    assert!(harness.output_dir().join("Song.mp3").exists());
    assert!(harness.leftover_files("staged-1").is_empty());
}

#[tokio::test]
async fn test_duplicate_id_is_rejected_without_touching_active_job() {
    let harness = TestHarness::new();
    harness.extractor.set_run_until_cancelled(true).await;
    let (tx, _rx) = mpsc::channel(64);

    let first = harness
        .coordinator
        .spawn(fixtures::download_request("dup-1", VIDEO_URL), tx.clone())
        .await
        .unwrap();
    harness.wait_for_downloads(1).await;

    let duplicate = fixtures::download_request("dup-1", VIDEO_URL).with_custom_artwork(
        CustomArtwork::Inline {
            data: b"png".to_vec(),
            extension: "png".to_string(),
        },
    );
    let err = harness.coordinator.spawn(duplicate, tx).await.unwrap_err();
    assert!(matches!(err, PipelineError::AlreadyRegistered { .. }));

    // The rejected request never wrote into the live job's namespace
    assert!(!harness
        .temp_files_dir()
        .join("tg_dup-1_custom.png")
        .exists());

    assert!(harness.coordinator.cancel("dup-1").await);
    assert!(matches!(first.wait().await, Err(PipelineError::Cancelled)));
}

#[tokio::test]
async fn test_cancelled_id_is_reusable_only_after_cleanup() {
    let harness = TestHarness::new();
    harness.extractor.set_run_until_cancelled(true).await;
    // Keeps the cancelled job winding down for a while
    harness.fetcher.set_delay(Duration::from_millis(600)).await;
    let (tx, _rx) = mpsc::channel(64);

    let first = harness
        .coordinator
        .spawn(fixtures::download_request("reuse-1", VIDEO_URL), tx.clone())
        .await
        .unwrap();
    harness.wait_for_downloads(1).await;
    assert!(harness.coordinator.cancel("reuse-1").await);
    // A second cancel has nothing left to do
    assert!(!harness.coordinator.cancel("reuse-1").await);

    let err = harness
        .coordinator
        .spawn(fixtures::download_request("reuse-1", VIDEO_URL), tx.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::AlreadyRegistered { .. }));

    assert!(matches!(first.wait().await, Err(PipelineError::Cancelled)));

    let second = harness
        .coordinator
        .spawn(fixtures::download_request("reuse-1", VIDEO_URL), tx)
        .await
        .unwrap();
    harness.wait_for_downloads(2).await;

    // Nothing from the first job's cleanup reaches the successor's files
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.leftover_files("reuse-1"), vec!["tg_reuse-1_audio.webm.part"]);
    assert!(harness.coordinator.registry().contains("reuse-1").await);

    assert!(harness.coordinator.cancel("reuse-1").await);
    assert!(matches!(second.wait().await, Err(PipelineError::Cancelled)));
    assert!(harness.coordinator.registry().is_empty().await);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected_before_registration() {
    let harness = TestHarness::new();
    let (tx, _rx) = mpsc::channel(64);

    let bad_id = fixtures::download_request("../etc", VIDEO_URL);
    assert!(matches!(
        harness.coordinator.spawn(bad_id, tx.clone()).await,
        Err(PipelineError::InvalidRequest { .. })
    ));

    let bad_url = fixtures::download_request("ftp-1", "ftp://example.com/song");
    assert!(matches!(
        harness.coordinator.spawn(bad_url, tx.clone()).await,
        Err(PipelineError::InvalidRequest { .. })
    ));

    let bad_trim = fixtures::download_request("trim-1", VIDEO_URL).with_trim(
        tunegrab_core::TrimWindow::new(Some(30.0), Some(10.0)),
    );
    assert!(matches!(
        harness.coordinator.spawn(bad_trim, tx.clone()).await,
        Err(PipelineError::InvalidRequest { .. })
    ));

    let missing_cover = fixtures::download_request("cover-1", VIDEO_URL)
        .with_custom_artwork(CustomArtwork::File(PathBuf::from("/definitely/not/here.jpg")));
    assert!(matches!(
        harness.coordinator.spawn(missing_cover, tx).await,
        Err(PipelineError::InvalidRequest { .. })
    ));

    assert!(harness.coordinator.registry().is_empty().await);
    assert_eq!(harness.extractor.download_count().await, 0);
}

#[tokio::test]
async fn test_generated_id_when_none_given() {
    let harness = TestHarness::new();
    let (tx, _rx) = mpsc::channel(64);
    let request = tunegrab_core::DownloadRequest::new(VIDEO_URL, tunegrab_core::TargetFormat::Mp3);

    let handle = harness.coordinator.spawn(request, tx).await.unwrap();
    let id = handle.id().to_string();
    assert_eq!(id.len(), 36);

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome.job_id, id);
}

/// Transcoder that panics mid-job.
struct PanickingTranscoder;

#[async_trait]
impl Transcoder for PanickingTranscoder {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn transcode(
        &self,
        _job: &TranscodeJob,
        _cancel: CancellationToken,
    ) -> Result<PathBuf, TranscodeError> {
        panic!("transcoder blew up");
    }
}

#[tokio::test]
async fn test_panicking_stage_still_cleans_up() {
    let temp_dir = TempDir::new().unwrap();
    let coordinator = PipelineCoordinator::new(
        fixtures::pipeline_config(temp_dir.path()),
        Arc::new(MockExtractor::new()),
        Arc::new(PanickingTranscoder),
        Arc::new(MockArtworkFetcher::new()),
    );
    let (tx, _rx) = mpsc::channel(64);

    let err = coordinator
        .run(fixtures::download_request("panic-1", VIDEO_URL), tx)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Internal { .. }));
    assert!(coordinator.registry().is_empty().await);
    assert!(prefixed_files(&temp_dir.path().join("tmp"), "panic-1").is_empty());
}

/// Extractor whose download panics while artwork is still being fetched.
struct PanickingExtractor;

#[async_trait]
impl Extractor for PanickingExtractor {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn single_item_info(&self, _url: &str) -> Result<MediaInfo, ExtractorError> {
        Err(ExtractorError::NoItemsFound)
    }

    async fn playlist_info(&self, _url: &str) -> Result<Vec<MediaInfo>, ExtractorError> {
        Err(ExtractorError::NoItemsFound)
    }

    async fn download_audio(
        &self,
        _request: &AudioDownload,
        _progress_tx: mpsc::Sender<f32>,
        _cancel: CancellationToken,
    ) -> Result<(), ExtractorError> {
        panic!("extractor blew up");
    }
}

#[tokio::test]
async fn test_panic_during_download_stops_artwork_task() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockArtworkFetcher::new());
    fetcher.set_available(MAXRES_URL).await;
    fetcher.set_delay(Duration::from_millis(200)).await;
    let coordinator = PipelineCoordinator::new(
        fixtures::pipeline_config(temp_dir.path()),
        Arc::new(PanickingExtractor),
        Arc::new(MockTranscoder::new()),
        Arc::clone(&fetcher),
    );
    let (tx, _rx) = mpsc::channel(64);

    let err = coordinator
        .run(fixtures::download_request("panic-2", VIDEO_URL), tx)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Internal { .. }));

    // Long enough for an orphaned fetch to have written its cover
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(prefixed_files(&temp_dir.path().join("tmp"), "panic-2").is_empty());
    assert!(coordinator.registry().is_empty().await);
}

#[tokio::test]
async fn test_active_jobs_snapshot() {
    let harness = TestHarness::new();
    harness.extractor.set_run_until_cancelled(true).await;
    let (tx, _rx) = mpsc::channel(64);

    let handle = harness
        .coordinator
        .spawn(fixtures::download_request("snap-1", VIDEO_URL), tx)
        .await
        .unwrap();
    harness.wait_for_downloads(1).await;

    let jobs = harness.coordinator.active_jobs().await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, "snap-1");
    assert_eq!(jobs[0].source_url, VIDEO_URL);

    harness.coordinator.cancel("snap-1").await;
    let _ = handle.wait().await;
    assert!(harness.coordinator.active_jobs().await.is_empty());
}

#[tokio::test]
async fn test_metadata_lookups_go_through_extractor() {
    let harness = TestHarness::new();
    harness
        .extractor
        .set_item(VIDEO_URL, fixtures::youtube_info("dQw4w9WgXcQ", "Never Gonna"))
        .await;
    harness
        .extractor
        .set_playlist(
            "https://soundcloud.com/artist/sets/album",
            vec![
                fixtures::media_info("t1", "One"),
                fixtures::media_info("t2", "Two"),
            ],
        )
        .await;

    let info = harness.coordinator.single_item_info(VIDEO_URL).await.unwrap();
    assert_eq!(info.title, "Never Gonna");
    assert_eq!(info.thumbnail_url.as_deref(), Some(HQ_URL));

    let items = harness
        .coordinator
        .playlist_info("https://soundcloud.com/artist/sets/album")
        .await
        .unwrap();
    assert_eq!(items.len(), 2);

    let err = harness
        .coordinator
        .playlist_info("https://soundcloud.com/artist/sets/empty")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoItemsFound));
}
