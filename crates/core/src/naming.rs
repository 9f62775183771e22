//! Naming context for tracker templates.
//!
//! Flattens a [`MediaInfo`], the torrent it came from and an optional
//! [`CatalogMatch`] into the key/value map that naming and description
//! templates read. Key names are part of the template contract.

use std::path::Path;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::NamingConfig;
use crate::matcher::CatalogMatch;
use crate::media::{MediaInfo, MediaType};
use crate::torrent::{TorrentAttributes, TorrentFile};

/// Extensions considered for `file_extension`.
const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "wmv"];

/// Source recorded for web releases that name no source, or only `WEB`.
pub const DEFAULT_WEB_SOURCE: &str = "WEB-DL";

/// Production companies that identify a movie's streaming platform.
const STREAMING_COMPANIES: &[&str] = &[
    "netflix", "amazon", "disney", "hbo", "apple", "paramount", "peacock", "hulu",
];

/// Inputs shorter than this only resolve by exact match.
const MIN_PARTIAL_LEN: usize = 3;

/// Platform and network names to short codes. Order matters for partial
/// matches: the first entry whose name contains (or is contained in) the
/// input wins.
const PLATFORM_CODES: &[(&str, &str)] = &[
    // Scene abbreviations
    ("NF", "NF"),
    ("AMZN", "AMZ"),
    ("DSNP", "DSN"),
    ("HMAX", "HBO"),
    ("ATVP", "APTV"),
    // Streaming services
    ("Netflix", "NF"),
    ("Amazon Prime Video", "AMZ"),
    ("Amazon", "AMZ"),
    ("Prime Video", "AMZ"),
    ("Disney+", "DSN"),
    ("Disney", "DSN"),
    ("Disney Plus", "DSN"),
    ("HBO Max", "HBO"),
    ("HBO", "HBO"),
    ("Apple TV+", "APTV"),
    ("Apple TV", "APTV"),
    ("Apple", "APTV"),
    ("Paramount+", "PAR"),
    ("Paramount Plus", "PAR"),
    ("Paramount", "PAR"),
    ("Peacock", "PCOK"),
    ("Hulu", "HULU"),
    ("Star+", "STAR"),
    ("Star Plus", "STAR"),
    // TV networks
    ("Showtime", "SHO"),
    ("CBS", "CBS"),
    ("NBC", "NBC"),
    ("ABC", "ABC"),
    ("FOX", "FOX"),
    ("BBC", "BBC"),
    ("ITV", "ITV"),
    ("Channel 4", "C4"),
    ("Sky", "SKY"),
    ("FX", "FX"),
    ("AMC", "AMC"),
    ("USA", "USA"),
    ("TNT", "TNT"),
    ("TBS", "TBS"),
    ("Syfy", "SYFY"),
    ("MTV", "MTV"),
    ("Comedy Central", "CC"),
    ("Cartoon Network", "CN"),
    ("Adult Swim", "AS"),
    ("Discovery", "DSC"),
    ("National Geographic", "NG"),
    ("History", "HIST"),
    ("A&E", "AE"),
    ("Lifetime", "LIFE"),
    // International
    ("Crunchyroll", "CR"),
    ("Funimation", "FUNI"),
    ("VRV", "VRV"),
    ("Tubi", "TUBI"),
    ("Pluto TV", "PLUTO"),
    ("Roku", "ROKU"),
    ("Vudu", "VUDU"),
];

/// Short code for a platform or network name.
///
/// Exact (case-insensitive) match first, then partial match in table order,
/// then initials of up to three words, then the first three letters.
/// Table names shorter than three characters (`NF`, `FX`) only match a whole
/// word of the input.
pub fn platform_code(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return String::new();
    }

    if let Some((_, code)) = PLATFORM_CODES
        .iter()
        .find(|(full, _)| full.eq_ignore_ascii_case(name))
    {
        return code.to_string();
    }

    let lower = name.to_lowercase();
    if lower.chars().count() >= MIN_PARTIAL_LEN {
        let input_words: Vec<&str> = lower.split_whitespace().collect();
        for (full, code) in PLATFORM_CODES {
            let full = full.to_lowercase();
            let hit = if full.len() < MIN_PARTIAL_LEN {
                input_words.contains(&full.as_str())
            } else {
                lower.contains(&full) || full.contains(&lower)
            };
            if hit {
                return code.to_string();
            }
        }
    }

    let words: Vec<&str> = name.split_whitespace().collect();
    if words.len() >= 2 {
        words
            .iter()
            .take(3)
            .filter_map(|w| w.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    } else {
        name.chars().take(3).flat_map(char::to_uppercase).collect()
    }
}

/// Platform code from catalog data: the primary network of a series, or the
/// first streaming production company of a movie.
fn catalog_platform(info: &MediaInfo, matched: &CatalogMatch) -> Option<String> {
    let name = match info.media_type {
        MediaType::TvShow | MediaType::Anime => matched.networks.first(),
        MediaType::Movie => matched.production_companies.iter().find(|company| {
            let company = company.to_lowercase();
            STREAMING_COMPANIES.iter().any(|s| company.contains(s))
        }),
    }?;
    let code = platform_code(name);
    (!code.is_empty()).then_some(code)
}

/// Normalize the source for naming and tag it with the catalog platform.
///
/// A missing, `WEB` or `UNKNOWN` source becomes [`DEFAULT_WEB_SOURCE`]. With a
/// match, the platform code is appended (`WEB-DL.NF`) unless already present.
pub fn enhance_source(info: &mut MediaInfo, matched: Option<&CatalogMatch>) {
    let source = match info.source.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_WEB_SOURCE.to_string(),
        Some(s) if s.eq_ignore_ascii_case("web") || s.eq_ignore_ascii_case("unknown") => {
            DEFAULT_WEB_SOURCE.to_string()
        }
        Some(s) => s.to_string(),
    };

    let code = matched.and_then(|m| catalog_platform(info, m));
    info.source = Some(match code {
        Some(code) if !source.ends_with(&format!(".{}", code)) => {
            debug!(source = %source, platform = %code, "Tagging source with catalog platform");
            format!("{}.{}", source, code)
        }
        _ => source,
    });
}

/// Lowercase extension of the first video file, without the dot.
fn file_extension(files: &[TorrentFile]) -> Option<String> {
    files.iter().find_map(|file| {
        let ext = Path::new(&file.path).extension()?.to_str()?.to_lowercase();
        VIDEO_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
    })
}

/// Builds template contexts.
#[derive(Debug, Clone)]
pub struct NamingContext {
    default_team: String,
}

impl NamingContext {
    pub fn new(default_team: impl Into<String>) -> Self {
        Self {
            default_team: default_team.into(),
        }
    }

    pub fn from_config(config: &NamingConfig) -> Self {
        Self::new(config.default_team.clone())
    }

    pub fn build(
        &self,
        info: &MediaInfo,
        torrent: &TorrentAttributes,
        matched: Option<&CatalogMatch>,
    ) -> Map<String, Value> {
        let tmdb_info = matched
            .and_then(|m| serde_json::to_value(m).ok())
            .unwrap_or_else(|| Value::Object(Map::new()));
        let team = info
            .team
            .clone()
            .unwrap_or_else(|| self.default_team.clone());

        let context = json!({
            // Media
            "title": info.title,
            "year": info.year,
            "type": info.media_type.as_str(),
            "season": info.season,
            "episode": info.episode,
            "full_season": info.full_season,

            // Technical
            "resolution": info.resolution,
            "full_resolution": info.full_resolution(),
            "video_codec": info.video_codec,
            "audio_codec": info.audio_codec,
            "hdr": info.hdr,
            "source": info.source,
            "platform": info.platform,
            "platform_code": info.platform.as_deref().map(platform_code),
            "version": info.version,
            "languages": info.languages,
            "subtitle_languages": info.subtitles,

            "team": team,
            "is_multi": info.is_multi_language || info.languages.len() > 1,

            "tmdb_info": tmdb_info,

            // Torrent
            "size": torrent.size,
            "tags": torrent.tags,
            "files": torrent.files,
            "hash": torrent.hash,
            "category": torrent.category,
            "file_extension": file_extension(&torrent.files),
        });

        match context {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}
