//! Structured media attributes guessed from a release name.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matcher::CatalogMatch;

/// Kind of media a release contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Movie,
    TvShow,
    Anime,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::TvShow => "tvshow",
            MediaType::Anime => "anime",
        }
    }

    /// TV shows and anime are both matched against the series catalog.
    pub fn is_episodic(&self) -> bool {
        matches!(self, MediaType::TvShow | MediaType::Anime)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes extracted from one release.
///
/// Technical fields hold uppercase tokens (`1080P`, `X264`, `WEB-DL`) or `None`.
/// `title` is the only free-text field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(rename = "type", default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub video_codec: Option<String>,
    #[serde(default)]
    pub audio_codec: Option<String>,
    #[serde(default)]
    pub hdr: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub languages: BTreeSet<String>,
    #[serde(default)]
    pub is_multi_language: bool,
    #[serde(default)]
    pub subtitles: BTreeSet<String>,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<u32>,
    #[serde(default)]
    pub full_season: bool,
    #[serde(default)]
    pub tmdb_id: Option<u32>,
    #[serde(default)]
    pub imdb_id: Option<String>,
}

impl MediaInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn is_4k(&self) -> bool {
        matches!(self.resolution.as_deref(), Some("2160P" | "4K" | "UHD"))
    }

    pub fn is_hdr(&self) -> bool {
        self.hdr.is_some()
    }

    /// Resolution with the HDR flavour appended, e.g. `2160P HDR10`.
    pub fn full_resolution(&self) -> String {
        match (&self.resolution, &self.hdr) {
            (None, _) => "Unknown".to_string(),
            (Some(res), Some(hdr)) => format!("{} {}", res, hdr),
            (Some(res), None) => res.clone(),
        }
    }

    /// Record the catalog identifiers of a successful match.
    pub fn apply_match(&mut self, matched: &CatalogMatch) {
        self.tmdb_id = Some(matched.tmdb_id);
        if matched.imdb_id.is_some() {
            self.imdb_id = matched.imdb_id.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MediaType::TvShow).unwrap(), "\"tvshow\"");
        assert_eq!(serde_json::to_string(&MediaType::Anime).unwrap(), "\"anime\"");
        let parsed: MediaType = serde_json::from_str("\"movie\"").unwrap();
        assert_eq!(parsed, MediaType::Movie);
    }

    #[test]
    fn test_media_info_type_field_name() {
        let info = MediaInfo::new("Andor");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "movie");
        assert!(json.get("media_type").is_none());
    }

    #[test]
    fn test_full_resolution() {
        let mut info = MediaInfo::new("x");
        assert_eq!(info.full_resolution(), "Unknown");

        info.resolution = Some("2160P".to_string());
        assert_eq!(info.full_resolution(), "2160P");
        assert!(info.is_4k());

        info.hdr = Some("HDR10".to_string());
        assert_eq!(info.full_resolution(), "2160P HDR10");
        assert!(info.is_hdr());
    }

    #[test]
    fn test_is_4k_false_for_1080p() {
        let mut info = MediaInfo::new("x");
        info.resolution = Some("1080P".to_string());
        assert!(!info.is_4k());
    }
}
