//! Testing utilities and mock implementations.
//!
//! Mocks for the two external capabilities (catalog and content prober) so
//! matching and extraction can be exercised without network or ffprobe.
//!
//! # Example
//!
//! ```rust,ignore
//! use trackprep_core::testing::{fixtures, MockCatalog};
//!
//! let catalog = MockCatalog::new();
//! catalog.add_series(fixtures::series(83867, "Andor", "2022-09-21")).await;
//! catalog.add_season(83867, fixtures::season(1, 12)).await;
//! ```

mod mock_catalog;
mod mock_prober;

pub use mock_catalog::{MockCatalog, RecordedCatalogQuery, RecordedSearch};
pub use mock_prober::MockProber;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::external_catalog::{TmdbEpisode, TmdbMovie, TmdbSeason, TmdbSeries};

    /// A movie shaped like a search hit: no IMDb id, runtime or genres.
    pub fn movie(id: u32, title: &str, release_date: &str) -> TmdbMovie {
        TmdbMovie {
            id,
            title: title.to_string(),
            original_title: Some(title.to_string()),
            release_date: Some(release_date.to_string()),
            runtime_minutes: None,
            imdb_id: None,
            overview: Some(format!("A movie about {}.", title.to_lowercase())),
            poster_path: Some("/poster.jpg".to_string()),
            backdrop_path: Some("/backdrop.jpg".to_string()),
            genres: Vec::new(),
            production_companies: Vec::new(),
            vote_average: Some(7.5),
        }
    }

    /// A series shaped like a search hit: no season or episode counts.
    pub fn series(id: u32, name: &str, first_air_date: &str) -> TmdbSeries {
        TmdbSeries {
            id,
            name: name.to_string(),
            original_name: Some(name.to_string()),
            first_air_date: Some(first_air_date.to_string()),
            overview: Some(format!("A TV series about {}.", name.to_lowercase())),
            poster_path: Some("/poster.jpg".to_string()),
            backdrop_path: None,
            number_of_seasons: 0,
            number_of_episodes: 0,
            seasons: Vec::new(),
            genres: Vec::new(),
            networks: Vec::new(),
            vote_average: Some(8.0),
        }
    }

    pub fn season(season_number: u32, episodes: u32) -> TmdbSeason {
        TmdbSeason {
            season_number,
            name: Some(format!("Season {}", season_number)),
            overview: Some(format!("Season {} of the series.", season_number)),
            air_date: Some("2022-09-21".to_string()),
            episodes: (1..=episodes)
                .map(|e| episode(season_number, e, &format!("Episode {}", e)))
                .collect(),
            poster_path: None,
        }
    }

    pub fn episode(season_number: u32, episode_number: u32, name: &str) -> TmdbEpisode {
        TmdbEpisode {
            episode_number,
            season_number,
            name: name.to_string(),
            overview: Some(format!("{} description.", name)),
            runtime_minutes: Some(45),
            air_date: Some(format!("2022-09-{:02}", episode_number.min(28))),
            still_path: None,
            vote_average: Some(8.0),
        }
    }
}
