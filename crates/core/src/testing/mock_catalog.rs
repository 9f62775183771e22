//! Mock media catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::external_catalog::{
    ExternalCatalogError, MediaCatalog, TmdbEpisode, TmdbMovie, TmdbSeason, TmdbSeries,
};

/// A recorded catalog query for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCatalogQuery {
    SearchMovies { query: String, year: Option<u32> },
    MovieDetails { tmdb_id: u32 },
    SearchTv { query: String, year: Option<u32> },
    TvDetails { tmdb_id: u32 },
    SeasonDetails { tmdb_id: u32, season: u32 },
    EpisodeDetails { tmdb_id: u32, season: u32, episode: u32 },
}

/// A search query, movie or TV.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSearch {
    pub query: String,
    pub year: Option<u32>,
}

/// Mock implementation of the [`MediaCatalog`] trait.
///
/// Searches match on a case-insensitive substring of the title, and a year
/// narrows results to that exact year the way TMDB does.
///
/// # Example
///
/// ```rust,ignore
/// use trackprep_core::testing::{MockCatalog, fixtures};
///
/// let catalog = MockCatalog::new();
/// catalog.add_movie(fixtures::movie(603, "The Matrix", "1999-03-30")).await;
///
/// let results = catalog.search_movies("matrix", Some(1999)).await?;
/// assert_eq!(results.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    /// Search hits by ID.
    movies: Arc<RwLock<HashMap<u32, TmdbMovie>>>,
    /// Details records; fall back to the search hit when absent.
    movie_details: Arc<RwLock<HashMap<u32, TmdbMovie>>>,
    series: Arc<RwLock<HashMap<u32, TmdbSeries>>>,
    series_details: Arc<RwLock<HashMap<u32, TmdbSeries>>>,
    /// Seasons by (series_id, season_number).
    seasons: Arc<RwLock<HashMap<(u32, u32), TmdbSeason>>>,
    /// Episodes by (series_id, season_number, episode_number).
    episodes: Arc<RwLock<HashMap<(u32, u32, u32), TmdbEpisode>>>,
    /// Return every entry regardless of the query text.
    search_everything: Arc<RwLock<bool>>,
    queries: Arc<RwLock<Vec<RecordedCatalogQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ExternalCatalogError>>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub async fn add_movie(&self, movie: TmdbMovie) {
        self.movies.write().await.insert(movie.id, movie);
    }

    /// Details returned by `movie_details` for this ID.
    pub async fn add_movie_details(&self, movie: TmdbMovie) {
        self.movie_details.write().await.insert(movie.id, movie);
    }

    pub async fn add_series(&self, series: TmdbSeries) {
        self.series.write().await.insert(series.id, series);
    }

    pub async fn add_series_details(&self, series: TmdbSeries) {
        self.series_details.write().await.insert(series.id, series);
    }

    pub async fn add_season(&self, series_id: u32, season: TmdbSeason) {
        self.seasons
            .write()
            .await
            .insert((series_id, season.season_number), season);
    }

    pub async fn add_episode(&self, series_id: u32, episode: TmdbEpisode) {
        self.episodes.write().await.insert(
            (series_id, episode.season_number, episode.episode_number),
            episode,
        );
    }

    /// Make searches ignore the query text.
    pub async fn set_search_everything(&self, enabled: bool) {
        *self.search_everything.write().await = enabled;
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.queries.read().await.clone()
    }

    /// Movie and TV searches, in order.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.queries
            .read()
            .await
            .iter()
            .filter_map(|q| match q {
                RecordedCatalogQuery::SearchMovies { query, year }
                | RecordedCatalogQuery::SearchTv { query, year } => Some(RecordedSearch {
                    query: query.clone(),
                    year: *year,
                }),
                _ => None,
            })
            .collect()
    }

    pub async fn clear_recorded(&self) {
        self.queries.write().await.clear();
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ExternalCatalogError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<ExternalCatalogError> {
        self.next_error.write().await.take()
    }

    async fn record(&self, query: RecordedCatalogQuery) {
        self.queries.write().await.push(query);
    }

    async fn matches_query(&self, title: &str, query: &str) -> bool {
        *self.search_everything.read().await || title.to_lowercase().contains(&query.to_lowercase())
    }
}

#[async_trait]
impl MediaCatalog for MockCatalog {
    async fn search_movies(
        &self,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<TmdbMovie>, ExternalCatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.record(RecordedCatalogQuery::SearchMovies {
            query: query.to_string(),
            year,
        })
        .await;

        let movies = self.movies.read().await;
        let mut results = Vec::new();
        for movie in movies.values() {
            let year_match = year.map_or(true, |y| movie.year() == Some(y));
            if year_match && self.matches_query(&movie.title, query).await {
                results.push(movie.clone());
            }
        }
        results.sort_by_key(|m| m.id);
        Ok(results)
    }

    async fn movie_details(&self, tmdb_id: u32) -> Result<TmdbMovie, ExternalCatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.record(RecordedCatalogQuery::MovieDetails { tmdb_id }).await;

        if let Some(details) = self.movie_details.read().await.get(&tmdb_id) {
            return Ok(details.clone());
        }
        self.movies
            .read()
            .await
            .get(&tmdb_id)
            .cloned()
            .ok_or_else(|| ExternalCatalogError::NotFound(format!("Movie {} not found", tmdb_id)))
    }

    async fn search_tv(
        &self,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<TmdbSeries>, ExternalCatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.record(RecordedCatalogQuery::SearchTv {
            query: query.to_string(),
            year,
        })
        .await;

        let series = self.series.read().await;
        let mut results = Vec::new();
        for show in series.values() {
            let year_match = year.map_or(true, |y| show.year() == Some(y));
            if year_match && self.matches_query(&show.name, query).await {
                results.push(show.clone());
            }
        }
        results.sort_by_key(|s| s.id);
        Ok(results)
    }

    async fn tv_details(&self, tmdb_id: u32) -> Result<TmdbSeries, ExternalCatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.record(RecordedCatalogQuery::TvDetails { tmdb_id }).await;

        if let Some(details) = self.series_details.read().await.get(&tmdb_id) {
            return Ok(details.clone());
        }
        self.series
            .read()
            .await
            .get(&tmdb_id)
            .cloned()
            .ok_or_else(|| ExternalCatalogError::NotFound(format!("Series {} not found", tmdb_id)))
    }

    async fn season_details(
        &self,
        tmdb_id: u32,
        season: u32,
    ) -> Result<TmdbSeason, ExternalCatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.record(RecordedCatalogQuery::SeasonDetails { tmdb_id, season })
            .await;

        self.seasons
            .read()
            .await
            .get(&(tmdb_id, season))
            .cloned()
            .ok_or_else(|| {
                ExternalCatalogError::NotFound(format!(
                    "Season {} of series {} not found",
                    season, tmdb_id
                ))
            })
    }

    async fn episode_details(
        &self,
        tmdb_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<TmdbEpisode, ExternalCatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.record(RecordedCatalogQuery::EpisodeDetails {
            tmdb_id,
            season,
            episode,
        })
        .await;

        self.episodes
            .read()
            .await
            .get(&(tmdb_id, season, episode))
            .cloned()
            .ok_or_else(|| {
                ExternalCatalogError::NotFound(format!(
                    "Episode S{:02}E{:02} of series {} not found",
                    season, episode, tmdb_id
                ))
            })
    }
}
