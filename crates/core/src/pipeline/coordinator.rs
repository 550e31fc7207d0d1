//! Pipeline coordinator implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::artwork::{ArtworkFetcher, ArtworkResolver, ArtworkResult};
use crate::extractor::{AudioDownload, Extractor, MediaInfo};
use crate::metrics::{ACTIVE_JOBS, JOBS_TOTAL, JOB_DURATION};
use crate::registry::{DownloadRegistry, JobSnapshot, Registration};
use crate::transcoder::{ResolvedArtwork, TranscodeJob, Transcoder};

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::temp::{
    move_into_place, persist_inline_artwork, sanitize_filename, validate_job_id, TempPrefix,
};
use super::types::{
    CustomArtwork, DownloadJob, DownloadRequest, JobHandle, JobOutcome, JobState, ProgressEvent,
};

/// The artwork task of a job, awaited at most once.
struct PendingArtwork(Option<JoinHandle<ArtworkResult>>);

impl PendingArtwork {
    async fn join(&mut self) -> ArtworkResult {
        match self.0.take() {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                warn!("Artwork task failed: {}", e);
                ArtworkResult::none()
            }),
            None => ArtworkResult::none(),
        }
    }
}

/// Progress is best effort. A caller that stops draining its channel loses
/// events but never holds a job back from its terminal state.
fn emit(progress_tx: &mpsc::Sender<ProgressEvent>, event: ProgressEvent) {
    if let Err(e) = progress_tx.try_send(event) {
        debug!("Progress event dropped: {}", e);
    }
}

/// Drives download jobs from request to tagged file.
///
/// The tool seams accept trait objects, so a server can hold
/// `PipelineCoordinator<dyn Extractor, dyn Transcoder, dyn ArtworkFetcher>`.
pub struct PipelineCoordinator<E: ?Sized, T: ?Sized, F: ?Sized> {
    config: Arc<PipelineConfig>,
    extractor: Arc<E>,
    transcoder: Arc<T>,
    artwork: ArtworkResolver<F>,
    registry: DownloadRegistry,
}

impl<E: ?Sized, T: ?Sized, F: ?Sized> Clone for PipelineCoordinator<E, T, F> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            extractor: Arc::clone(&self.extractor),
            transcoder: Arc::clone(&self.transcoder),
            artwork: self.artwork.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<E, T, F> PipelineCoordinator<E, T, F>
where
    E: Extractor + ?Sized + 'static,
    T: Transcoder + ?Sized + 'static,
    F: ArtworkFetcher + ?Sized + 'static,
{
    /// Creates a coordinator with its own empty registry.
    pub fn new(config: PipelineConfig, extractor: Arc<E>, transcoder: Arc<T>, fetcher: Arc<F>) -> Self {
        Self {
            config: Arc::new(config),
            extractor,
            transcoder,
            artwork: ArtworkResolver::new(fetcher),
            registry: DownloadRegistry::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &DownloadRegistry {
        &self.registry
    }

    /// Metadata for a single item.
    pub async fn single_item_info(&self, url: &str) -> Result<MediaInfo, PipelineError> {
        Ok(self.extractor.single_item_info(url).await?)
    }

    /// Flat playlist enumeration.
    pub async fn playlist_info(&self, url: &str) -> Result<Vec<MediaInfo>, PipelineError> {
        Ok(self.extractor.playlist_info(url).await?)
    }

    /// Cancels a job. Unknown ids return `false`.
    pub async fn cancel(&self, id: &str) -> bool {
        self.registry.cancel(id).await
    }

    /// Snapshot of active jobs.
    pub async fn active_jobs(&self) -> Vec<JobSnapshot> {
        self.registry.snapshot().await
    }

    /// Runs a job to completion.
    pub async fn run(
        &self,
        request: DownloadRequest,
        progress_tx: mpsc::Sender<ProgressEvent>,
    ) -> Result<JobOutcome, PipelineError> {
        self.spawn(request, progress_tx).await?.wait().await
    }

    /// Validates and registers a job, then runs it on its own task.
    ///
    /// Errors returned here happen before the job starts; everything after
    /// is reported through the handle.
    pub async fn spawn(
        &self,
        request: DownloadRequest,
        progress_tx: mpsc::Sender<ProgressEvent>,
    ) -> Result<JobHandle, PipelineError> {
        let (mut job, inline_art) = self.prepare(request).await?;

        let registration = self
            .registry
            .register(&job.id, job.prefix.clone(), &job.url)
            .await?;
        ACTIVE_JOBS.inc();

        // Registered first so a rejected duplicate never writes into a live job's namespace
        if let Some((data, extension)) = inline_art {
            match persist_inline_artwork(&job.prefix, &data, &extension).await {
                Ok(path) => job.custom_art_path = Some(path),
                Err(e) => {
                    job.prefix.purge().await;
                    self.registry.complete(&registration).await;
                    ACTIVE_JOBS.dec();
                    return Err(e.into());
                }
            }
        }

        info!(job_id = %job.id, format = job.format.extension(), "Job started for {}", job.url);

        let id = job.id.clone();
        let coordinator = self.clone();
        let handle =
            tokio::spawn(async move { coordinator.supervise(job, registration, progress_tx).await });

        Ok(JobHandle::new(id, handle))
    }

    /// Validates a request and binds it to an id, prefix and output path.
    async fn prepare(
        &self,
        request: DownloadRequest,
    ) -> Result<(DownloadJob, Option<(Vec<u8>, String)>), PipelineError> {
        let id = request
            .id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        validate_job_id(&id).map_err(PipelineError::invalid_request)?;

        let url = request.url.trim().to_string();
        match Url::parse(&url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(PipelineError::invalid_request(format!("not an http(s) URL: {}", url))),
        }

        request.trim.validate().map_err(PipelineError::invalid_request)?;

        let (custom_art_path, inline_art) = match request.custom_artwork {
            Some(CustomArtwork::File(path)) => {
                let is_file = tokio::fs::metadata(&path)
                    .await
                    .map(|m| m.is_file())
                    .unwrap_or(false);
                if !is_file {
                    return Err(PipelineError::invalid_request(format!(
                        "custom artwork not found: {}",
                        path.display()
                    )));
                }
                (Some(path), None)
            }
            Some(CustomArtwork::Inline { data, extension }) => {
                if data.is_empty() {
                    return Err(PipelineError::invalid_request("custom artwork is empty"));
                }
                (None, Some((data, extension)))
            }
            None => (None, None),
        };

        let stem = request
            .tags
            .title
            .as_deref()
            .map(sanitize_filename)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| id.clone());
        let output_path = self
            .config
            .output_dir
            .join(format!("{}.{}", stem, request.format.extension()));

        let job = DownloadJob {
            prefix: TempPrefix::new(&self.config.temp_dir, &id),
            id,
            url,
            format: request.format,
            tags: request.tags,
            trim: request.trim,
            cover_aspect: request.cover_aspect,
            thumbnail_url: request.thumbnail_url,
            output_path,
            custom_art_path,
        };

        Ok((job, inline_art))
    }

    /// Runs the job body and guarantees cleanup and deregistration.
    async fn supervise(
        self,
        job: DownloadJob,
        registration: Registration,
        progress_tx: mpsc::Sender<ProgressEvent>,
    ) -> Result<JobOutcome, PipelineError> {
        let started = Instant::now();

        // Artwork resolves while the audio downloads
        let artwork = self.artwork.spawn(job.artwork_request());
        let artwork_abort = artwork.abort_handle();

        let body = {
            let coordinator = self.clone();
            let job = job.clone();
            let token = registration.token();
            let artwork = PendingArtwork(Some(artwork));
            tokio::spawn(async move { coordinator.execute(&job, token, &progress_tx, artwork).await })
        };

        let result = match body.await {
            Ok(result) => result,
            Err(e) => {
                error!(job_id = %job.id, "Job task died: {}", e);
                // The dead body can no longer join the artwork task
                artwork_abort.abort();
                job.prefix.purge().await;
                Err(PipelineError::Internal {
                    reason: if e.is_panic() {
                        "job task panicked".to_string()
                    } else {
                        e.to_string()
                    },
                })
            }
        };

        // Deregistration goes last, on every path
        self.registry.complete(&registration).await;
        ACTIVE_JOBS.dec();

        let elapsed = started.elapsed();
        let label = match &result {
            Ok(_) => "success",
            Err(e) if e.is_cancelled() => "cancelled",
            Err(_) => "failed",
        };
        JOBS_TOTAL.with_label_values(&[label]).inc();
        JOB_DURATION
            .with_label_values(&[label])
            .observe(elapsed.as_secs_f64());

        match &result {
            Ok((path, _)) => info!(
                job_id = %job.id,
                "Job complete in {:.1}s: {}",
                elapsed.as_secs_f64(),
                path.display()
            ),
            Err(e) if e.is_cancelled() => info!(job_id = %job.id, "Job cancelled"),
            Err(e) => warn!(job_id = %job.id, kind = e.kind(), "Job failed: {}", e),
        }

        result.map(|(output_path, has_artwork)| JobOutcome {
            job_id: job.id,
            output_path,
            has_artwork,
            duration_ms: elapsed.as_millis() as u64,
        })
    }

    /// The job body: stages, then purge, then the completion event.
    async fn execute(
        &self,
        job: &DownloadJob,
        token: CancellationToken,
        progress_tx: &mpsc::Sender<ProgressEvent>,
        mut artwork: PendingArtwork,
    ) -> Result<(PathBuf, bool), PipelineError> {
        let result = self.run_stages(job, &token, progress_tx, &mut artwork).await;

        // An unjoined artwork task could still write its file after the purge
        artwork.join().await;

        // Cleanup runs on success, failure and cancellation alike
        let removed = job.prefix.purge().await;
        debug!(job_id = %job.id, "Removed {} temp files", removed);

        if result.is_ok() {
            emit(progress_tx, ProgressEvent::complete(&job.id));
        }

        result
    }

    async fn run_stages(
        &self,
        job: &DownloadJob,
        token: &CancellationToken,
        progress_tx: &mpsc::Sender<ProgressEvent>,
        artwork: &mut PendingArtwork,
    ) -> Result<(PathBuf, bool), PipelineError> {
        self.registry.mark_running(&job.id).await;
        self.download(job, token, progress_tx).await?;

        emit(progress_tx, ProgressEvent::converting(&job.id));
        self.registry.set_state(&job.id, JobState::ResolvingArt).await;
        let art = artwork.join().await;

        // A cancel during the join has already purged the raw audio
        if token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let audio = job
            .prefix
            .locate_raw_audio()
            .await?
            .ok_or_else(|| PipelineError::FileLocation {
                prefix: job.prefix.to_string(),
            })?;

        // Last chance to stop before ffmpeg starts
        if token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.registry.set_state(&job.id, JobState::Transcoding).await;
        let has_artwork = art.is_present();
        // ffmpeg writes inside the job's namespace; only a finished file
        // reaches the output dir
        let staged = job.prefix.transcode_path(job.format.extension());
        let mut transcode = TranscodeJob::new(job.id.clone(), audio, staged, job.format)
            .with_tags(job.tags.clone())
            .with_trim(job.trim)
            .with_cover_aspect(job.cover_aspect);
        if let Some(path) = art.path {
            transcode = transcode.with_artwork(ResolvedArtwork {
                path,
                legacy: art.legacy,
            });
        }

        match self.transcoder.transcode(&transcode, token.clone()).await {
            _ if token.is_cancelled() => Err(PipelineError::Cancelled),
            Ok(staged) => {
                move_into_place(&staged, &job.output_path).await?;
                Ok((job.output_path.clone(), has_artwork))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Downloads the raw audio, forwarding progress as `downloading` events.
    async fn download(
        &self,
        job: &DownloadJob,
        token: &CancellationToken,
        progress_tx: &mpsc::Sender<ProgressEvent>,
    ) -> Result<(), PipelineError> {
        tokio::fs::create_dir_all(job.prefix.dir()).await?;

        let request = AudioDownload {
            job_id: job.id.clone(),
            url: job.url.clone(),
            output_template: job.prefix.audio_template(),
        };

        let (tx, mut rx) = mpsc::channel(self.config.progress_buffer.max(1));
        let forward = async {
            while let Some(percent) = rx.recv().await {
                emit(progress_tx, ProgressEvent::downloading(&job.id, percent));
            }
        };

        let (result, ()) = tokio::join!(
            self.extractor.download_audio(&request, tx, token.clone()),
            forward
        );

        match result {
            _ if token.is_cancelled() => Err(PipelineError::Cancelled),
            Ok(()) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
