//! Types for catalog API responses.

use serde::{Deserialize, Serialize};

/// Year prefix of a `YYYY-MM-DD` date.
fn year_of(date: Option<&String>) -> Option<u32> {
    date.and_then(|d| d.split('-').next())
        .and_then(|y| y.parse().ok())
}

/// A TMDB movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbMovie {
    /// TMDB movie ID.
    pub id: u32,
    /// Movie title.
    pub title: String,
    /// Original title (in original language).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    /// Release date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Runtime in minutes. Details only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    /// IMDb identifier (`tt...`). Details only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Poster path (relative to TMDB image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    /// Backdrop path (relative to TMDB image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    /// Genre names. Details only.
    #[serde(default)]
    pub genres: Vec<String>,
    /// Production company names. Details only.
    #[serde(default)]
    pub production_companies: Vec<String>,
    /// Average vote (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
}

impl TmdbMovie {
    /// Get the release year from the release date.
    pub fn year(&self) -> Option<u32> {
        year_of(self.release_date.as_ref())
    }
}

/// A TMDB TV series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbSeries {
    /// TMDB series ID.
    pub id: u32,
    /// Series name.
    pub name: String,
    /// Original name (in original language).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    /// First air date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    /// Number of seasons (0 in search results).
    #[serde(default)]
    pub number_of_seasons: u32,
    /// Number of episodes (0 in search results).
    #[serde(default)]
    pub number_of_episodes: u32,
    /// Season summaries.
    #[serde(default)]
    pub seasons: Vec<TmdbSeasonSummary>,
    /// Genre names.
    #[serde(default)]
    pub genres: Vec<String>,
    /// Broadcasting network names, primary first. Details only.
    #[serde(default)]
    pub networks: Vec<String>,
    /// Average vote (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
}

impl TmdbSeries {
    /// Year of the first air date.
    pub fn year(&self) -> Option<u32> {
        year_of(self.first_air_date.as_ref())
    }
}

/// Summary of a TMDB season (from series response).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbSeasonSummary {
    /// Season number (0 for specials).
    pub season_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub episode_count: u32,
    /// Air date of first episode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
}

/// Full TMDB season details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbSeason {
    pub season_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
    /// Episodes in this season.
    #[serde(default)]
    pub episodes: Vec<TmdbEpisode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
}

impl TmdbSeason {
    pub fn episode_count(&self) -> u32 {
        self.episodes.len() as u32
    }

    /// Total runtime in minutes, if every episode reports one.
    pub fn total_runtime_minutes(&self) -> Option<u32> {
        let runtimes: Vec<u32> = self
            .episodes
            .iter()
            .filter_map(|e| e.runtime_minutes)
            .collect();

        if runtimes.len() == self.episodes.len() && !runtimes.is_empty() {
            Some(runtimes.iter().sum())
        } else {
            None
        }
    }
}

/// A TMDB episode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbEpisode {
    pub episode_number: u32,
    #[serde(default)]
    pub season_number: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Runtime in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    /// Air date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
    /// Still image path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub still_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
}
