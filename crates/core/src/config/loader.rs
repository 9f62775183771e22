use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `TRACKPREP_TMDB__API_KEY`.
const ENV_PREFIX: &str = "TRACKPREP_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

impl Config {
    /// Defaults overlaid with `TRACKPREP_*` environment variables only.
    pub fn from_env() -> Result<Config, ConfigError> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[tmdb]
api_key = "abc"

[cache]
expiry_secs = 3600
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.tmdb.api_key, "abc");
        assert_eq!(config.cache.expiry_secs, 3600);
        assert_eq!(config.cache.flush_every, 10);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[cache]
expiry_secs = "tomorrow"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/trackprep.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[tmdb]
api_key = "from-file"
language = "fr-FR"

[analyzer]
multi_language_label = "MULTi"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.tmdb.language, "fr-FR");
        assert_eq!(config.analyzer.multi_language_label, "MULTi");
        assert_eq!(config.analyzer.min_title_segments, 2);
    }
}
