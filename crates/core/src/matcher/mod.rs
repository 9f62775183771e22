//! Catalog matching.
//!
//! [`CatalogMatcher`] resolves a [`crate::media::MediaInfo`] against a
//! [`crate::external_catalog::MediaCatalog`], scoring search hits with
//! [`scoring::score_candidate`] and caching results in [`MatchCache`].

mod cache;
mod engine;
pub mod scoring;
mod types;

pub use cache::{
    cache_key, now_secs, CacheEntry, CacheError, CacheLookup, CacheSnapshot, CacheStats,
    MatchCache,
};
pub use engine::{max_attempts, min_words, CatalogMatcher, ACCEPT_SCORE, MIN_WORD_RATIO};
pub use scoring::{score_candidate, select_best, CandidateTitles, CERTAIN_SCORE};
pub use types::{CatalogMatch, EpisodeMatch, SeasonMatch, LOW_CONFIDENCE_SCORE};
