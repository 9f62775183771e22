use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tmdb: TmdbSettings,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub naming: NamingConfig,
}

/// TMDB catalog configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbSettings {
    /// TMDB API key. Required at startup.
    #[serde(default)]
    pub api_key: String,
    /// Language passed to every catalog call.
    #[serde(default = "default_language")]
    pub language: String,
    /// Base URL override (tests, proxies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for TmdbSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: default_language(),
            base_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Match cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Directory holding `tmdb_cache.json`.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    /// Seconds before an entry is considered stale.
    #[serde(default = "default_expiry")]
    pub expiry_secs: u64,
    /// Flush to disk after this many inserts.
    #[serde(default = "default_flush_every")]
    pub flush_every: usize,
}

impl CacheConfig {
    pub const FILE_NAME: &'static str = "tmdb_cache.json";

    pub fn file_path(&self) -> PathBuf {
        self.dir.join(Self::FILE_NAME)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            expiry_secs: default_expiry(),
            flush_every: default_flush_every(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_expiry() -> u64 {
    86_400
}

fn default_flush_every() -> usize {
    10
}

/// Filename analyzer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    /// Label that marks a multi-language release (e.g. "Multi", "MULTi").
    #[serde(default = "default_multi_label")]
    pub multi_language_label: String,
    /// Titles with fewer separator-delimited segments are not truncated.
    #[serde(default = "default_min_segments")]
    pub min_title_segments: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            multi_language_label: default_multi_label(),
            min_title_segments: default_min_segments(),
        }
    }
}

fn default_multi_label() -> String {
    "Multi".to_string()
}

fn default_min_segments() -> usize {
    2
}

/// Content probing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: default_probe_enabled(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_probe_timeout(),
        }
    }
}

fn default_probe_enabled() -> bool {
    true
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_probe_timeout() -> u64 {
    60
}

/// Naming context configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NamingConfig {
    /// Team used when the release name carries none.
    #[serde(default = "default_team")]
    pub default_team: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            default_team: default_team(),
        }
    }
}

fn default_team() -> String {
    "Q2TBHV".to_string()
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub tmdb: SanitizedTmdbSettings,
    pub cache: CacheConfig,
    pub analyzer: AnalyzerConfig,
    pub probe: ProbeConfig,
    pub naming: NamingConfig,
}

/// Sanitized TMDB config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTmdbSettings {
    pub api_key_configured: bool,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            tmdb: SanitizedTmdbSettings {
                api_key_configured: !config.tmdb.api_key.is_empty(),
                language: config.tmdb.language.clone(),
                base_url: config.tmdb.base_url.clone(),
                timeout_secs: config.tmdb.timeout_secs,
            },
            cache: config.cache.clone(),
            analyzer: config.analyzer.clone(),
            probe: config.probe.clone(),
            naming: config.naming.clone(),
        }
    }
}
