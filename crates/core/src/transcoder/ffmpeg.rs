//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::metrics::TRANSCODE_DURATION;
use crate::process::{run_supervised, ProcessExit};

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::traits::Transcoder;
use super::types::{CoverAspect, TargetFormat, TranscodeJob};

/// Center crop to 16:9, removing the black bars baked into low tier thumbnails.
const LETTERBOX_CROP: &str = "crop=iw:iw*9/16";

/// Builds the video filter applied to the cover image.
///
/// The image is scaled to cover the target box and cropped to it exactly.
/// Legacy images are first cropped back to their real 16:9 content.
pub fn image_filter(aspect: CoverAspect, legacy: bool) -> String {
    let (w, h) = aspect.dimensions();
    let fit = format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
        w = w,
        h = h
    );

    if legacy {
        format!("{},{}", LETTERBOX_CROP, fit)
    } else {
        fit
    }
}

/// `12.5` -> `"12.5"`, `30.0` -> `"30"`.
fn format_seconds(secs: f64) -> String {
    let s = format!("{:.3}", secs);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Builds the full ffmpeg argument list for a job.
    pub fn build_args(&self, job: &TranscodeJob) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
        ];

        // Trim window as input options so seeking happens before decoding
        if let Some(start) = job.trim.start {
            args.extend(["-ss".to_string(), format_seconds(start)]);
        }
        if let Some(end) = job.trim.end {
            args.extend(["-to".to_string(), format_seconds(end)]);
        }

        args.extend(["-i".to_string(), job.input_path.to_string_lossy().to_string()]);

        if let Some(ref artwork) = job.artwork {
            args.extend(["-i".to_string(), artwork.path.to_string_lossy().to_string()]);
        }

        args.extend(["-map".to_string(), "0:a".to_string()]);

        if let Some(ref artwork) = job.artwork {
            args.extend([
                "-map".to_string(),
                "1:v".to_string(),
                "-c:v".to_string(),
                "mjpeg".to_string(),
                "-disposition:v:0".to_string(),
                "attached_pic".to_string(),
                "-filter:v".to_string(),
                image_filter(job.cover_aspect, artwork.legacy),
            ]);
        }

        args.extend(["-c:a".to_string(), job.format.ffmpeg_codec().to_string()]);

        match job.format {
            TargetFormat::Mp3 => {
                args.extend([
                    "-q:a".to_string(),
                    "2".to_string(),
                    "-id3v2_version".to_string(),
                    "3".to_string(),
                ]);
                if job.artwork.is_some() {
                    args.extend([
                        "-metadata:s:v".to_string(),
                        "title=Album cover".to_string(),
                        "-metadata:s:v".to_string(),
                        "comment=Cover (front)".to_string(),
                    ]);
                }
            }
            TargetFormat::M4a => {
                args.extend([
                    "-b:a".to_string(),
                    "256k".to_string(),
                    "-movflags".to_string(),
                    "+faststart".to_string(),
                    "-f".to_string(),
                    "ipod".to_string(),
                ]);
            }
        }

        args.extend(job.tags.to_ffmpeg_args());

        args.extend(["-y".to_string(), job.output_path.to_string_lossy().to_string()]);

        args
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(
        &self,
        job: &TranscodeJob,
        cancel: CancellationToken,
    ) -> Result<PathBuf, TranscodeError> {
        let start = Instant::now();

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_args(job);
        debug!(job_id = %job.job_id, "Running ffmpeg: {:?}", args);

        let mut command = Command::new(&self.config.ffmpeg_path);
        command.args(&args);

        let exit = run_supervised(
            command,
            &cancel,
            self.config.timeout_secs.map(Duration::from_secs),
            |_| {},
        )
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TranscodeError::NotFound {
                    path: self.config.ffmpeg_path.clone(),
                }
            } else {
                TranscodeError::Io(e)
            }
        })?;

        match exit {
            ProcessExit::Exited { status, .. } if status.success() => {}
            ProcessExit::Exited { status, stderr } => {
                return Err(TranscodeError::Failed {
                    code: status.code(),
                    stderr,
                })
            }
            ProcessExit::Killed => return Err(TranscodeError::Cancelled),
            ProcessExit::TimedOut => {
                return Err(TranscodeError::Timeout {
                    timeout_secs: self.config.timeout_secs.unwrap_or_default(),
                })
            }
        }

        if tokio::fs::metadata(&job.output_path).await.is_err() {
            return Err(TranscodeError::OutputMissing {
                path: job.output_path.clone(),
            });
        }

        let elapsed = start.elapsed();
        TRANSCODE_DURATION
            .with_label_values(&[job.format.extension()])
            .observe(elapsed.as_secs_f64());
        info!(
            job_id = %job.job_id,
            "Transcoded to {} in {:.1}s",
            job.output_path.display(),
            elapsed.as_secs_f64()
        );

        Ok(job.output_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcoder::{ResolvedArtwork, TrackTags, TrimWindow};

    fn job(format: TargetFormat) -> TranscodeJob {
        TranscodeJob::new(
            "job-1",
            "/tmp/tg_job-1_audio.webm",
            format!("/music/Song.{}", format.extension()),
            format,
        )
        .with_tags(TrackTags::new("Song", "Artist", "Album"))
    }

    fn art(legacy: bool) -> ResolvedArtwork {
        ResolvedArtwork {
            path: PathBuf::from("/tmp/tg_job-1_cover.jpg"),
            legacy,
        }
    }

    fn windows(args: &[String], a: &str, b: &str) -> bool {
        args.windows(2).any(|w| w[0] == a && w[1] == b)
    }

    #[test]
    fn test_image_filter() {
        assert_eq!(
            image_filter(CoverAspect::Square, false),
            "scale=1000:1000:force_original_aspect_ratio=increase,crop=1000:1000"
        );
        assert_eq!(
            image_filter(CoverAspect::Widescreen, false),
            "scale=1280:720:force_original_aspect_ratio=increase,crop=1280:720"
        );
        assert_eq!(
            image_filter(CoverAspect::Square, true),
            "crop=iw:iw*9/16,scale=1000:1000:force_original_aspect_ratio=increase,crop=1000:1000"
        );
    }

    #[test]
    fn test_mp3_args() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_args(&job(TargetFormat::Mp3));

        assert!(windows(&args, "-c:a", "libmp3lame"));
        assert!(windows(&args, "-q:a", "2"));
        assert!(windows(&args, "-id3v2_version", "3"));
        assert!(!args.contains(&"-movflags".to_string()));
        assert!(!args.contains(&"-b:a".to_string()));
        assert!(windows(&args, "-metadata", "title=Song"));
        assert!(windows(&args, "-metadata", "artist=Artist"));
        assert!(windows(&args, "-metadata", "album=Album"));
        assert_eq!(&args[args.len() - 2..], &["-y", "/music/Song.mp3"]);
    }

    #[test]
    fn test_m4a_args() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_args(&job(TargetFormat::M4a));

        assert!(windows(&args, "-c:a", "aac"));
        assert!(windows(&args, "-b:a", "256k"));
        assert!(windows(&args, "-movflags", "+faststart"));
        assert!(windows(&args, "-f", "ipod"));
        assert!(!args.contains(&"-id3v2_version".to_string()));
        assert_eq!(args.last().unwrap(), "/music/Song.m4a");
    }

    #[test]
    fn test_audio_only_has_single_input() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_args(&job(TargetFormat::Mp3));

        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
        assert!(windows(&args, "-map", "0:a"));
        assert!(!args.contains(&"attached_pic".to_string()));
        assert!(!args.contains(&"-filter:v".to_string()));
    }

    #[test]
    fn test_artwork_is_attached_picture() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_args(&job(TargetFormat::Mp3).with_artwork(art(false)));

        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 2);
        assert!(windows(&args, "-i", "/tmp/tg_job-1_cover.jpg"));
        assert!(windows(&args, "-map", "1:v"));
        assert!(windows(&args, "-disposition:v:0", "attached_pic"));
        assert!(windows(
            &args,
            "-filter:v",
            "scale=1000:1000:force_original_aspect_ratio=increase,crop=1000:1000"
        ));
        assert!(windows(&args, "-metadata:s:v", "title=Album cover"));
    }

    #[test]
    fn test_legacy_artwork_gets_letterbox_crop() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_args(
            &job(TargetFormat::M4a)
                .with_artwork(art(true))
                .with_cover_aspect(CoverAspect::Widescreen),
        );

        let idx = args.iter().position(|a| a == "-filter:v").unwrap();
        assert_eq!(
            args[idx + 1],
            "crop=iw:iw*9/16,scale=1280:720:force_original_aspect_ratio=increase,crop=1280:720"
        );
    }

    #[test]
    fn test_trim_precedes_input() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_args(
            &job(TargetFormat::Mp3).with_trim(TrimWindow::new(Some(12.5), Some(90.0))),
        );

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let to = args.iter().position(|a| a == "-to").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[ss + 1], "12.5");
        assert_eq!(args[to + 1], "90");
        assert!(ss < to && to < input);
    }

    #[test]
    fn test_untrimmed_has_no_seek() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_args(&job(TargetFormat::Mp3));
        assert!(!args.contains(&"-ss".to_string()));
        assert!(!args.contains(&"-to".to_string()));
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "0");
        assert_eq!(format_seconds(30.0), "30");
        assert_eq!(format_seconds(12.25), "12.25");
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let transcoder = FfmpegTranscoder::new(TranscoderConfig::with_path(PathBuf::from(
            "/nonexistent/ffmpeg",
        )));
        let dir = tempfile::TempDir::new().unwrap();
        let job = TranscodeJob::new(
            "job-1",
            dir.path().join("in.webm"),
            dir.path().join("out.mp3"),
            TargetFormat::Mp3,
        );

        let result = transcoder.transcode(&job, CancellationToken::new()).await;
        assert!(matches!(result, Err(TranscodeError::NotFound { .. })));
    }
}
