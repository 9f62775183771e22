//! TMDB v3 client implementing [`MediaCatalog`].
//!
//! Every request carries the configured API key and response language.
//! Search results and details decode into private response structs which are
//! then converted into the shared catalog types.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::types::{TmdbEpisode, TmdbMovie, TmdbSeason, TmdbSeasonSummary, TmdbSeries};
use super::{ExternalCatalogError, MediaCatalog};
use crate::config::TmdbSettings;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(settings: &TmdbSettings) -> Result<Self, ExternalCatalogError> {
        if settings.api_key.is_empty() {
            return Err(ExternalCatalogError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key: settings.api_key.clone(),
            language: settings.language.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` with the key and language, plus `params`.
    async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Response, ExternalCatalogError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", &self.api_key), ("language", &self.language)])
            .query(params)
            .send()
            .await?;
        Ok(response)
    }

    /// Map error statuses and decode the body.
    async fn decode<T: DeserializeOwned>(
        response: Response,
        what: &str,
    ) -> Result<T, ExternalCatalogError> {
        let status = response.status();
        if status == 401 {
            return Err(ExternalCatalogError::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == 404 {
            return Err(ExternalCatalogError::NotFound(what.to_string()));
        }
        if status == 429 {
            return Err(ExternalCatalogError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExternalCatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!("Failed to parse {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl MediaCatalog for TmdbClient {
    async fn search_movies(
        &self,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<TmdbMovie>, ExternalCatalogError> {
        debug!("TMDB movie search: query='{}', year={:?}", query, year);

        let mut params = vec![("query", query.to_string())];
        if let Some(y) = year {
            params.push(("year", y.to_string()));
        }

        let response = self.get("search/movie", &params).await?;
        let search: TmdbSearchResponse<TmdbMovieResult> =
            Self::decode(response, "movie search").await?;
        Ok(search.results.into_iter().map(|r| r.into()).collect())
    }

    async fn movie_details(&self, tmdb_id: u32) -> Result<TmdbMovie, ExternalCatalogError> {
        debug!("TMDB get movie: id={}", tmdb_id);

        let response = self.get(&format!("movie/{}", tmdb_id), &[]).await?;
        let details: TmdbMovieDetails =
            Self::decode(response, &format!("movie {}", tmdb_id)).await?;
        Ok(details.into())
    }

    async fn search_tv(
        &self,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<TmdbSeries>, ExternalCatalogError> {
        debug!("TMDB TV search: query='{}', year={:?}", query, year);

        let mut params = vec![("query", query.to_string())];
        if let Some(y) = year {
            params.push(("first_air_date_year", y.to_string()));
        }

        let response = self.get("search/tv", &params).await?;
        let search: TmdbSearchResponse<TmdbTvResult> = Self::decode(response, "TV search").await?;
        Ok(search.results.into_iter().map(|r| r.into()).collect())
    }

    async fn tv_details(&self, tmdb_id: u32) -> Result<TmdbSeries, ExternalCatalogError> {
        debug!("TMDB get TV: id={}", tmdb_id);

        let response = self.get(&format!("tv/{}", tmdb_id), &[]).await?;
        let details: TmdbTvDetails =
            Self::decode(response, &format!("TV series {}", tmdb_id)).await?;
        Ok(details.into())
    }

    async fn season_details(
        &self,
        tmdb_id: u32,
        season: u32,
    ) -> Result<TmdbSeason, ExternalCatalogError> {
        debug!("TMDB get season: series={}, season={}", tmdb_id, season);

        let response = self
            .get(&format!("tv/{}/season/{}", tmdb_id, season), &[])
            .await?;
        let details: TmdbSeasonDetails = Self::decode(
            response,
            &format!("TV series {} season {}", tmdb_id, season),
        )
        .await?;
        Ok(details.into())
    }

    async fn episode_details(
        &self,
        tmdb_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<TmdbEpisode, ExternalCatalogError> {
        debug!(
            "TMDB get episode: series={}, season={}, episode={}",
            tmdb_id, season, episode
        );

        let response = self
            .get(
                &format!("tv/{}/season/{}/episode/{}", tmdb_id, season, episode),
                &[],
            )
            .await?;
        let details: TmdbEpisodeResult = Self::decode(
            response,
            &format!("TV series {} S{:02}E{:02}", tmdb_id, season, episode),
        )
        .await?;
        Ok(details.into())
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u32,
    title: String,
    original_title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    id: u32,
    title: String,
    original_title: Option<String>,
    release_date: Option<String>,
    runtime: Option<u32>,
    imdb_id: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    genres: Vec<TmdbNamed>,
    #[serde(default)]
    production_companies: Vec<TmdbNamed>,
    vote_average: Option<f32>,
}

/// Genres, networks and companies all come as `{id, name}`.
#[derive(Debug, Deserialize)]
struct TmdbNamed {
    name: String,
}

fn names(entries: Vec<TmdbNamed>) -> Vec<String> {
    entries.into_iter().map(|e| e.name).collect()
}

#[derive(Debug, Deserialize)]
struct TmdbTvResult {
    id: u32,
    name: String,
    original_name: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvDetails {
    id: u32,
    name: String,
    original_name: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    number_of_seasons: Option<u32>,
    number_of_episodes: Option<u32>,
    #[serde(default)]
    seasons: Vec<TmdbSeasonResult>,
    #[serde(default)]
    genres: Vec<TmdbNamed>,
    #[serde(default)]
    networks: Vec<TmdbNamed>,
    vote_average: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonResult {
    season_number: u32,
    name: Option<String>,
    episode_count: Option<u32>,
    air_date: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonDetails {
    season_number: u32,
    name: Option<String>,
    overview: Option<String>,
    air_date: Option<String>,
    poster_path: Option<String>,
    #[serde(default)]
    episodes: Vec<TmdbEpisodeResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbEpisodeResult {
    episode_number: u32,
    #[serde(default)]
    season_number: u32,
    name: String,
    overview: Option<String>,
    runtime: Option<u32>,
    air_date: Option<String>,
    still_path: Option<String>,
    vote_average: Option<f32>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<TmdbMovieResult> for TmdbMovie {
    fn from(r: TmdbMovieResult) -> Self {
        Self {
            id: r.id,
            title: r.title,
            original_title: r.original_title,
            release_date: r.release_date,
            runtime_minutes: None, // Not available in search results
            imdb_id: None,
            overview: r.overview,
            poster_path: r.poster_path,
            backdrop_path: r.backdrop_path,
            genres: vec![],
            production_companies: vec![],
            vote_average: r.vote_average,
        }
    }
}

impl From<TmdbMovieDetails> for TmdbMovie {
    fn from(d: TmdbMovieDetails) -> Self {
        Self {
            id: d.id,
            title: d.title,
            original_title: d.original_title,
            release_date: d.release_date,
            runtime_minutes: d.runtime,
            imdb_id: d.imdb_id.filter(|id| !id.is_empty()),
            overview: d.overview,
            poster_path: d.poster_path,
            backdrop_path: d.backdrop_path,
            genres: names(d.genres),
            production_companies: names(d.production_companies),
            vote_average: d.vote_average,
        }
    }
}

impl From<TmdbTvResult> for TmdbSeries {
    fn from(r: TmdbTvResult) -> Self {
        Self {
            id: r.id,
            name: r.name,
            original_name: r.original_name,
            first_air_date: r.first_air_date,
            overview: r.overview,
            poster_path: r.poster_path,
            backdrop_path: r.backdrop_path,
            number_of_seasons: 0,
            number_of_episodes: 0,
            seasons: vec![],
            genres: vec![],
            networks: vec![],
            vote_average: r.vote_average,
        }
    }
}

impl From<TmdbTvDetails> for TmdbSeries {
    fn from(d: TmdbTvDetails) -> Self {
        Self {
            id: d.id,
            name: d.name,
            original_name: d.original_name,
            first_air_date: d.first_air_date,
            overview: d.overview,
            poster_path: d.poster_path,
            backdrop_path: d.backdrop_path,
            number_of_seasons: d.number_of_seasons.unwrap_or(0),
            number_of_episodes: d.number_of_episodes.unwrap_or(0),
            seasons: d.seasons.into_iter().map(|s| s.into()).collect(),
            genres: names(d.genres),
            networks: names(d.networks),
            vote_average: d.vote_average,
        }
    }
}

impl From<TmdbSeasonResult> for TmdbSeasonSummary {
    fn from(s: TmdbSeasonResult) -> Self {
        Self {
            season_number: s.season_number,
            name: s.name,
            episode_count: s.episode_count.unwrap_or(0),
            air_date: s.air_date,
            poster_path: s.poster_path,
        }
    }
}

impl From<TmdbSeasonDetails> for TmdbSeason {
    fn from(d: TmdbSeasonDetails) -> Self {
        Self {
            season_number: d.season_number,
            name: d.name,
            overview: d.overview,
            air_date: d.air_date,
            episodes: d.episodes.into_iter().map(|e| e.into()).collect(),
            poster_path: d.poster_path,
        }
    }
}

impl From<TmdbEpisodeResult> for TmdbEpisode {
    fn from(e: TmdbEpisodeResult) -> Self {
        Self {
            episode_number: e.episode_number,
            season_number: e.season_number,
            name: e.name,
            overview: e.overview,
            runtime_minutes: e.runtime,
            air_date: e.air_date,
            still_path: e.still_path,
            vote_average: e.vote_average,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let result = TmdbClient::new(&TmdbSettings::default());
        assert!(matches!(
            result,
            Err(ExternalCatalogError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let settings = TmdbSettings {
            api_key: "key".to_string(),
            base_url: Some("http://localhost:8080/3/".to_string()),
            ..Default::default()
        };
        let client = TmdbClient::new(&settings).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/3");
    }

    #[test]
    fn test_movie_search_response_parsing() {
        let json = r#"{
            "page": 1,
            "results": [
                {"id": 603, "title": "The Matrix", "original_title": "The Matrix",
                 "release_date": "1999-03-30", "vote_average": 8.2, "poster_path": "/p.jpg"}
            ],
            "total_results": 1
        }"#;
        let response: TmdbSearchResponse<TmdbMovieResult> = serde_json::from_str(json).unwrap();
        let movies: Vec<TmdbMovie> = response.results.into_iter().map(|r| r.into()).collect();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].year(), Some(1999));
        assert!(movies[0].runtime_minutes.is_none()); // Not in search results
    }

    #[test]
    fn test_movie_details_genres_and_imdb() {
        let json = r#"{
            "id": 603, "title": "The Matrix", "original_title": "The Matrix",
            "release_date": "1999-03-30", "runtime": 136, "imdb_id": "tt0133093",
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
            "production_companies": [
                {"id": 79, "name": "Village Roadshow Pictures", "logo_path": null},
                {"id": 174, "name": "Warner Bros. Pictures", "origin_country": "US"}
            ]
        }"#;
        let details: TmdbMovieDetails = serde_json::from_str(json).unwrap();
        let movie: TmdbMovie = details.into();
        assert_eq!(movie.runtime_minutes, Some(136));
        assert_eq!(movie.imdb_id.as_deref(), Some("tt0133093"));
        assert_eq!(movie.genres, vec!["Action", "Science Fiction"]);
        assert_eq!(
            movie.production_companies,
            vec!["Village Roadshow Pictures", "Warner Bros. Pictures"]
        );
    }

    #[test]
    fn test_empty_imdb_id_dropped() {
        let json = r#"{"id": 1, "title": "X", "imdb_id": ""}"#;
        let details: TmdbMovieDetails = serde_json::from_str(json).unwrap();
        let movie: TmdbMovie = details.into();
        assert!(movie.imdb_id.is_none());
    }

    #[test]
    fn test_series_details_parsing() {
        let json = r#"{
            "id": 83867, "name": "Andor", "original_name": "Andor",
            "first_air_date": "2022-09-21", "number_of_seasons": 2, "number_of_episodes": 24,
            "seasons": [
                {"season_number": 0, "name": "Specials", "episode_count": 1},
                {"season_number": 1, "name": "Season 1", "episode_count": 12, "air_date": "2022-09-21"}
            ],
            "genres": [{"id": 10765, "name": "Sci-Fi & Fantasy"}],
            "networks": [{"id": 2739, "name": "Disney+", "origin_country": ""}]
        }"#;
        let details: TmdbTvDetails = serde_json::from_str(json).unwrap();
        let series: TmdbSeries = details.into();
        assert_eq!(series.year(), Some(2022));
        assert_eq!(series.number_of_episodes, 24);
        assert_eq!(series.seasons[1].episode_count, 12);
        assert_eq!(series.genres, vec!["Sci-Fi & Fantasy"]);
        assert_eq!(series.networks, vec!["Disney+"]);
    }

    #[test]
    fn test_series_details_missing_counts() {
        let details: TmdbTvDetails = serde_json::from_str(r#"{"id": 5, "name": "Pilot Only"}"#).unwrap();
        let series: TmdbSeries = details.into();
        assert_eq!(series.number_of_seasons, 0);
        assert!(series.seasons.is_empty());
        assert!(series.networks.is_empty());
    }

    #[test]
    fn test_season_details_conversion() {
        let json = r#"{
            "season_number": 1, "name": "Season 1", "air_date": "2022-09-21",
            "episodes": [
                {"episode_number": 1, "season_number": 1, "name": "Kassa", "runtime": 40},
                {"episode_number": 2, "season_number": 1, "name": "That Would Be Me"}
            ]
        }"#;
        let details: TmdbSeasonDetails = serde_json::from_str(json).unwrap();
        let season: TmdbSeason = details.into();
        assert_eq!(season.episode_count(), 2);
        assert_eq!(season.episodes[0].runtime_minutes, Some(40));
        assert_eq!(season.air_date.as_deref(), Some("2022-09-21"));
    }
}
