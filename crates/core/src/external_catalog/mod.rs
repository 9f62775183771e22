//! External movie/TV catalog integration.
//!
//! The matcher only depends on the [`MediaCatalog`] trait; [`TmdbClient`] is
//! the production implementation and `testing::MockCatalog` the test double.

mod tmdb;
mod types;

pub use tmdb::{TmdbClient, DEFAULT_BASE_URL};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when interacting with the catalog.
#[derive(Debug, Error)]
pub enum ExternalCatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Movie/TV metadata lookups. Read-only.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Search for movies by title, optionally constrained to a release year.
    async fn search_movies(
        &self,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<TmdbMovie>, ExternalCatalogError>;

    /// Full movie record (genres, runtime, IMDb id).
    async fn movie_details(&self, tmdb_id: u32) -> Result<TmdbMovie, ExternalCatalogError>;

    /// Search for TV series by name, optionally constrained to a first-air year.
    async fn search_tv(
        &self,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<TmdbSeries>, ExternalCatalogError>;

    /// Full series record (genres, season and episode counts).
    async fn tv_details(&self, tmdb_id: u32) -> Result<TmdbSeries, ExternalCatalogError>;

    /// One season with its episode list.
    async fn season_details(
        &self,
        tmdb_id: u32,
        season: u32,
    ) -> Result<TmdbSeason, ExternalCatalogError>;

    /// One episode.
    async fn episode_details(
        &self,
        tmdb_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<TmdbEpisode, ExternalCatalogError>;
}
