use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - TMDB API key is present (every match would fail without it)
/// - Cache expiry and flush threshold are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.tmdb.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "tmdb.api_key is required".to_string(),
        ));
    }

    if config.cache.expiry_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.expiry_secs cannot be 0".to_string(),
        ));
    }

    if config.cache.flush_every == 0 {
        return Err(ConfigError::ValidationError(
            "cache.flush_every cannot be 0".to_string(),
        ));
    }

    Ok(())
}
