//! Job-scoped temp files.
//!
//! Every intermediate file a job creates lives in the temp directory under
//! the name `tg_<job id>_<suffix>`. Ids may not contain `_`, so one job's
//! prefix never matches another job's files, and a single directory scan is
//! enough to find or delete everything a job left behind.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Common start of every temp file name.
pub const TEMP_FILE_PREFIX: &str = "tg_";

/// Longest accepted job id.
pub const MAX_JOB_ID_LEN: usize = 64;

/// Longest output file stem, in characters.
const MAX_FILE_STEM_LEN: usize = 180;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

const PARTIAL_EXTENSIONS: &[&str] = &["part", "ytdl", "temp", "tmp"];

/// Temp file namespace of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempPrefix {
    dir: PathBuf,
    prefix: String,
}

impl TempPrefix {
    /// Creates the namespace for `job_id` inside `dir`.
    pub fn new(dir: impl Into<PathBuf>, job_id: &str) -> Self {
        Self {
            dir: dir.into(),
            prefix: format!("{}{}_", TEMP_FILE_PREFIX, job_id),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file name prefix, e.g. `tg_job-1_`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path of a prefixed file.
    pub fn path(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.prefix, suffix))
    }

    /// yt-dlp output template for the raw audio.
    pub fn audio_template(&self) -> PathBuf {
        self.path("audio.%(ext)s")
    }

    /// Destination of a fetched cover.
    pub fn cover_path(&self) -> PathBuf {
        self.path("cover.jpg")
    }

    /// Destination of an inline custom cover.
    pub fn custom_art_path(&self, extension: &str) -> PathBuf {
        self.path(&format!("custom.{}", extension))
    }

    /// Where ffmpeg writes before the result is moved into the output dir.
    pub fn transcode_path(&self, extension: &str) -> PathBuf {
        self.path(&format!("out.{}", extension))
    }

    /// Whether a file name belongs to this job.
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.starts_with(&self.prefix)
    }

    /// All files currently carrying the prefix, sorted by name.
    pub async fn list(&self) -> io::Result<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_str().is_some_and(|n| self.matches(n)) {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Deletes every prefixed file, including partial-download sidecars.
    ///
    /// Returns the number of files removed. Failures are logged, never
    /// returned, so cleanup can run on every exit path.
    pub async fn purge(&self) -> usize {
        let files = match self.list().await {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to scan {} for {}: {}", self.dir.display(), self.prefix, e);
                return 0;
            }
        };

        let mut removed = 0;
        for file in files {
            match tokio::fs::remove_file(&file).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove temp file {}: {}", file.display(), e),
            }
        }

        if removed > 0 {
            debug!("Purged {} temp files for {}", removed, self.prefix);
        }
        removed
    }

    /// Finds the downloaded raw audio.
    ///
    /// Images and partial downloads are skipped; a file named like the audio
    /// template is preferred over any other remaining candidate.
    pub async fn locate_raw_audio(&self) -> io::Result<Option<PathBuf>> {
        let candidates: Vec<PathBuf> = self
            .list()
            .await?
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| !is_image_file(n) && !is_partial_file(n))
            })
            .collect();

        let audio_stem = format!("{}audio.", self.prefix);
        let preferred = candidates.iter().find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&audio_stem))
        });

        Ok(preferred.or(candidates.first()).cloned())
    }
}

impl std::fmt::Display for TempPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir.join(&self.prefix).display())
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn is_image_file(file_name: &str) -> bool {
    extension_of(file_name).is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

fn is_partial_file(file_name: &str) -> bool {
    extension_of(file_name).is_some_and(|e| PARTIAL_EXTENSIONS.contains(&e.as_str()))
        || file_name.contains(".part-Frag")
}

/// Normalizes a caller supplied image extension; unknown ones become `jpg`.
pub fn image_extension(extension: &str) -> &'static str {
    let ext = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .find(|known| **known == ext)
        .copied()
        .unwrap_or("jpg")
}

/// Writes inline cover bytes into the job's namespace.
pub async fn persist_inline_artwork(
    prefix: &TempPrefix,
    data: &[u8],
    extension: &str,
) -> io::Result<PathBuf> {
    tokio::fs::create_dir_all(prefix.dir()).await?;
    let path = prefix.custom_art_path(image_extension(extension));
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

/// Moves a finished file to its final location.
///
/// Falls back to copy and delete when the two paths sit on different
/// filesystems. The destination is replaced if it exists.
pub async fn move_into_place(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    if let Err(e) = tokio::fs::remove_file(from).await {
        debug!("Left {} behind after copy: {}", from.display(), e);
    }
    Ok(())
}

/// Checks that an id is safe to embed in a temp prefix.
pub fn validate_job_id(id: &str) -> Result<(), String> {
    if id.is_empty() || id.len() > MAX_JOB_ID_LEN {
        return Err(format!("job id must be 1-{} characters", MAX_JOB_ID_LEN));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err("job id may only contain ASCII letters, digits and '-'".to_string());
    }
    Ok(())
}

/// Turns a title into a safe file stem. May return an empty string.
pub fn sanitize_filename(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches('.').trim_end();
    trimmed.chars().take(MAX_FILE_STEM_LEN).collect::<String>().trim_end().to_string()
}
