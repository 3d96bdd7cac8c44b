use super::{types::Config, ConfigError};

/// Largest page the playlistItems endpoint will return.
const MAX_PAGE_SIZE: u32 = 50;

/// Validate configuration
/// Currently validates:
/// - Pipeline concurrency is at least 1
/// - Page size is within what the YouTube API accepts
/// - Playlist, model and output directory are not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.pipeline.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_concurrent cannot be 0".to_string(),
        ));
    }

    if config.youtube.page_size == 0 || config.youtube.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::ValidationError(format!(
            "youtube.page_size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    if config.youtube.playlist_id.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "youtube.playlist_id cannot be empty".to_string(),
        ));
    }

    if config.llm.model.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "llm.model cannot be empty".to_string(),
        ));
    }

    if config.output.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "output.dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_concurrency_fails() {
        let mut config = Config::default();
        config.pipeline.max_concurrent = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_page_size_bounds() {
        let mut config = Config::default();
        config.youtube.page_size = 51;
        assert!(validate_config(&config).is_err());

        config.youtube.page_size = 0;
        assert!(validate_config(&config).is_err());

        config.youtube.page_size = 1;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_blank_playlist_fails() {
        let mut config = Config::default();
        config.youtube.playlist_id = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("playlist_id"));
    }

    #[test]
    fn test_validate_empty_output_dir_fails() {
        let mut config = Config::default();
        config.output.dir = PathBuf::new();
        assert!(validate_config(&config).is_err());
    }
}
