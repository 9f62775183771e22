//! Catalog match records.

use serde::{Deserialize, Serialize};

use crate::external_catalog::{TmdbEpisode, TmdbMovie, TmdbSeason, TmdbSeries};
use crate::media::MediaType;

/// Matches scoring below this are flagged to the caller.
pub const LOW_CONFIDENCE_SCORE: f64 = 50.0;

/// Season sub-record of a TV match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonMatch {
    pub season_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
    #[serde(default)]
    pub episode_count: u32,
}

impl From<TmdbSeason> for SeasonMatch {
    fn from(s: TmdbSeason) -> Self {
        let episode_count = s.episode_count();
        Self {
            season_number: s.season_number,
            name: s.name,
            overview: s.overview,
            air_date: s.air_date,
            episode_count,
        }
    }
}

/// Episode sub-record of a TV match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMatch {
    pub episode_number: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
}

impl From<TmdbEpisode> for EpisodeMatch {
    fn from(e: TmdbEpisode) -> Self {
        Self {
            episode_number: e.episode_number,
            name: e.name,
            overview: e.overview,
            air_date: e.air_date,
        }
    }
}

/// A resolved catalog entry. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMatch {
    pub tmdb_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    pub media_type: MediaType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Broadcasting networks, primary first (TV).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
    /// Production companies (movies).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub production_companies: Vec<String>,
    /// Runtime in minutes (movies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_seasons: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_episodes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<SeasonMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<EpisodeMatch>,
    /// Score of the winning candidate.
    pub score: f64,
}

impl CatalogMatch {
    /// Build from a movie search hit, before details are known.
    pub fn from_movie(movie: &TmdbMovie, score: f64) -> Self {
        Self {
            tmdb_id: movie.id,
            imdb_id: movie.imdb_id.clone(),
            media_type: MediaType::Movie,
            title: movie.title.clone(),
            original_title: movie.original_title.clone(),
            overview: movie.overview.clone(),
            release_date: movie.release_date.clone(),
            first_air_date: None,
            genres: movie.genres.clone(),
            networks: Vec::new(),
            production_companies: movie.production_companies.clone(),
            runtime: movie.runtime_minutes,
            number_of_seasons: None,
            number_of_episodes: None,
            vote_average: movie.vote_average,
            poster_path: movie.poster_path.clone(),
            backdrop_path: movie.backdrop_path.clone(),
            season: None,
            episode: None,
            score,
        }
    }

    /// Build from a TV search hit, before details are known.
    pub fn from_series(series: &TmdbSeries, media_type: MediaType, score: f64) -> Self {
        Self {
            tmdb_id: series.id,
            imdb_id: None,
            media_type,
            title: series.name.clone(),
            original_title: series.original_name.clone(),
            overview: series.overview.clone(),
            release_date: None,
            first_air_date: series.first_air_date.clone(),
            genres: series.genres.clone(),
            networks: series.networks.clone(),
            production_companies: Vec::new(),
            runtime: None,
            number_of_seasons: (series.number_of_seasons > 0).then_some(series.number_of_seasons),
            number_of_episodes: (series.number_of_episodes > 0)
                .then_some(series.number_of_episodes),
            vote_average: series.vote_average,
            poster_path: series.poster_path.clone(),
            backdrop_path: series.backdrop_path.clone(),
            season: None,
            episode: None,
            score,
        }
    }

    /// Fold in fields only the details endpoint returns.
    pub fn with_movie_details(mut self, details: TmdbMovie) -> Self {
        self.genres = details.genres;
        self.production_companies = details.production_companies;
        self.imdb_id = details.imdb_id;
        self.runtime = details.runtime_minutes;
        self
    }

    pub fn with_series_details(mut self, details: TmdbSeries) -> Self {
        self.genres = details.genres;
        self.networks = details.networks;
        self.number_of_seasons = Some(details.number_of_seasons);
        self.number_of_episodes = Some(details.number_of_episodes);
        self
    }

    /// Scores below [`LOW_CONFIDENCE_SCORE`] are returned but flagged.
    pub fn is_low_confidence(&self) -> bool {
        self.score < LOW_CONFIDENCE_SCORE
    }

    /// Release or first-air year.
    pub fn year(&self) -> Option<u32> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_low_confidence_threshold() {
        let mut m = CatalogMatch::from_movie(&fixtures::movie(603, "The Matrix", "1999-03-30"), 49.9);
        assert!(m.is_low_confidence());
        m.score = 50.0;
        assert!(!m.is_low_confidence());
    }

    #[test]
    fn test_from_series_search_hit_has_no_counts() {
        let series = fixtures::series(83867, "Andor", "2022-09-21");
        let m = CatalogMatch::from_series(&series, MediaType::TvShow, 100.0);
        assert_eq!(m.number_of_seasons, None);
        assert_eq!(m.year(), Some(2022));
        assert_eq!(m.media_type, MediaType::TvShow);
    }

    #[test]
    fn test_with_movie_details() {
        let hit = fixtures::movie(603, "The Matrix", "1999-03-30");
        let mut details = hit.clone();
        details.imdb_id = Some("tt0133093".to_string());
        details.runtime_minutes = Some(136);
        details.genres = vec!["Action".to_string()];
        details.production_companies = vec!["Village Roadshow Pictures".to_string()];

        let m = CatalogMatch::from_movie(&hit, 120.0).with_movie_details(details);
        assert_eq!(m.imdb_id.as_deref(), Some("tt0133093"));
        assert_eq!(m.runtime, Some(136));
        assert_eq!(m.genres, vec!["Action"]);
        assert_eq!(m.production_companies, vec!["Village Roadshow Pictures"]);
    }

    #[test]
    fn test_with_series_details_keeps_networks() {
        let hit = fixtures::series(83867, "Andor", "2022-09-21");
        let mut details = hit.clone();
        details.networks = vec!["Disney+".to_string()];
        details.number_of_seasons = 2;

        let m = CatalogMatch::from_series(&hit, MediaType::TvShow, 100.0).with_series_details(details);
        assert_eq!(m.networks, vec!["Disney+"]);
        assert_eq!(m.number_of_seasons, Some(2));
        assert!(m.production_companies.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let m = CatalogMatch::from_movie(&fixtures::movie(1, "Film", "2020-01-01"), 70.0);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["tmdb_id"], 1);
        assert_eq!(json["media_type"], "movie");
        assert!(json.get("season").is_none());
        let back: CatalogMatch = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }
}
