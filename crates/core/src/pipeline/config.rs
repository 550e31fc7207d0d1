//! Configuration for the pipeline module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where jobs put their files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory final audio files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory for prefixed intermediate files.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Capacity of the per-job channel between extractor and coordinator.
    #[serde(default = "default_progress_buffer")]
    pub progress_buffer: usize,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("tunegrab")
}

fn default_progress_buffer() -> usize {
    64
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            temp_dir: default_temp_dir(),
            progress_buffer: default_progress_buffer(),
        }
    }
}

impl PipelineConfig {
    /// Creates a config with explicit output and temp directories.
    pub fn with_dirs(output_dir: PathBuf, temp_dir: PathBuf) -> Self {
        Self {
            output_dir,
            temp_dir,
            ..Default::default()
        }
    }
}
