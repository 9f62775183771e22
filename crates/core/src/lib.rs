pub mod analyzer;
pub mod config;
pub mod external_catalog;
pub mod extract;
pub mod matcher;
pub mod media;
pub mod metrics;
pub mod naming;
pub mod testing;
pub mod torrent;

pub use analyzer::{
    analyze_release, merge_probe, ContentProber, FfprobeProber, FilenameAnalyzer, ProbeError,
    ProbeReport,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use external_catalog::{
    ExternalCatalogError, MediaCatalog, TmdbClient, TmdbEpisode, TmdbMovie, TmdbSeason,
    TmdbSeries,
};
pub use extract::{BatchReport, ExtractError, ExtractionItem, ExtractionRecord, Extractor};
pub use matcher::{
    cache_key, CacheError, CacheStats, CatalogMatch, CatalogMatcher, EpisodeMatch, MatchCache,
    SeasonMatch, LOW_CONFIDENCE_SCORE,
};
pub use media::{MediaInfo, MediaType};
pub use naming::{enhance_source, platform_code, NamingContext};
pub use torrent::{parse_torrent, read_torrent, TorrentAttributes, TorrentFile, TorrentParseError};
