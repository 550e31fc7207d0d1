use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Tool paths are not empty
/// - Output and temp directories are set
/// - Artwork timeout is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.heartbeat_secs == 0 {
        return Err(ConfigError::ValidationError(
            "server.heartbeat_secs cannot be 0".to_string(),
        ));
    }

    if config.extractor.ytdlp_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "extractor.ytdlp_path cannot be empty".to_string(),
        ));
    }

    if config.transcoder.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "transcoder.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    if config.pipeline.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "pipeline.output_dir cannot be empty".to_string(),
        ));
    }

    if config.pipeline.temp_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "pipeline.temp_dir cannot be empty".to_string(),
        ));
    }

    if config.artwork.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "artwork.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
