//! Catalog matching: cache lookup, scored search with progressive title
//! shortening, detail enrichment, write-through caching.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::cache::{cache_key, CacheError, CacheLookup, CacheSnapshot, CacheStats, MatchCache};
use super::scoring::select_best;
use super::types::{CatalogMatch, EpisodeMatch, SeasonMatch};
use crate::external_catalog::{ExternalCatalogError, MediaCatalog, TmdbMovie, TmdbSeries};
use crate::media::{MediaInfo, MediaType};
use crate::metrics;

/// A candidate scoring at least this on a shortened title ends the search.
pub const ACCEPT_SCORE: f64 = 60.0;

/// Shortened titles keep at least this share of the original words.
pub const MIN_WORD_RATIO: f64 = 0.6;

/// Fewest words a shortened title may have.
pub fn min_words(word_count: usize) -> usize {
    ((word_count as f64 * MIN_WORD_RATIO).ceil() as usize).max(1)
}

/// Upper bound on searches for a title of `word_count` words.
pub fn max_attempts(word_count: usize) -> usize {
    word_count.saturating_sub(min_words(word_count)) + 1
}

/// Best hit of one search, before details are fetched.
#[derive(Debug, Clone)]
enum Hit {
    Movie(TmdbMovie),
    Series(TmdbSeries),
}

#[derive(Debug, Clone)]
struct ScoredHit {
    hit: Hit,
    score: f64,
    query: String,
}

/// Matches [`MediaInfo`] records against a [`MediaCatalog`].
///
/// The cache is loaded at construction and must be released with
/// [`CatalogMatcher::close`] (or [`CatalogMatcher::flush`]) to persist
/// recent inserts.
pub struct CatalogMatcher<C: MediaCatalog> {
    catalog: C,
    cache: Mutex<MatchCache>,
}

impl<C: MediaCatalog> CatalogMatcher<C> {
    pub fn new(catalog: C, cache: MatchCache) -> Self {
        Self {
            catalog,
            cache: Mutex::new(cache),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Resolve `info` to a catalog entry.
    ///
    /// Catalog failures degrade to "no match"; this never errors.
    pub async fn match_media(&self, info: &MediaInfo) -> Option<CatalogMatch> {
        let key = cache_key(info);

        let lookup = self.cache.lock().await.get(&key);
        metrics::CACHE_LOOKUPS
            .with_label_values(&[lookup.label()])
            .inc();
        if let CacheLookup::Hit(cached) = lookup {
            debug!(title = %info.title, tmdb_id = cached.tmdb_id, "Catalog cache hit");
            return Some(cached);
        }

        let best = self.search(info).await;
        let Some(best) = best else {
            warn!(title = %info.title, media_type = %info.media_type, "No catalog match");
            metrics::MATCH_RESULTS.with_label_values(&["unmatched"]).inc();
            return None;
        };

        let matched = self.enrich(best, info).await;
        if matched.is_low_confidence() {
            warn!(
                title = %info.title,
                matched = %matched.title,
                score = matched.score,
                "Low-confidence catalog match"
            );
            metrics::MATCH_RESULTS
                .with_label_values(&["low_confidence"])
                .inc();
        } else {
            info!(
                title = %info.title,
                matched = %matched.title,
                tmdb_id = matched.tmdb_id,
                score = matched.score,
                "Catalog match found"
            );
            metrics::MATCH_RESULTS.with_label_values(&["matched"]).inc();
        }

        let due = {
            let mut cache = self.cache.lock().await;
            cache.insert(key, matched.clone()).then(|| cache.snapshot())
        };
        if let Some(snapshot) = due {
            self.save(snapshot).await;
        }
        Some(matched)
    }

    /// Write a snapshot with the lock released; a failed write stays pending.
    async fn save(&self, snapshot: CacheSnapshot) {
        let pending = snapshot.pending();
        if let Err(e) = snapshot.persist().await {
            warn!(error = %e, "Failed to save match cache");
            self.cache.lock().await.requeue(pending);
        }
    }

    /// Progressive search: drop trailing words until a convincing hit turns
    /// up or the title would fall below [`min_words`].
    async fn search(&self, info: &MediaInfo) -> Option<ScoredHit> {
        let words: Vec<&str> = info.title.split_whitespace().collect();
        if words.is_empty() {
            return None;
        }
        let floor = min_words(words.len());

        let mut best: Option<ScoredHit> = None;
        let mut len = words.len();
        let mut attempts = 0usize;

        loop {
            attempts += 1;
            let query = words[..len].join(" ");
            let found = self
                .search_once(info.media_type, &query, info.year)
                .await;

            if let Some(found) = found {
                let full_title = len == words.len();
                if found.score >= ACCEPT_SCORE || full_title {
                    best = Some(found);
                    break;
                }
                if best.as_ref().map_or(true, |b| found.score > b.score) {
                    best = Some(found);
                }
            }

            if len <= floor {
                break;
            }
            len -= 1;
            debug!(title = %info.title, next = %words[..len].join(" "), "Retrying with a shorter title");
        }

        metrics::MATCH_ATTEMPTS
            .with_label_values(&[])
            .observe(attempts as f64);
        best
    }

    /// One title: search with the year, then without it if nothing came back.
    async fn search_once(
        &self,
        media_type: MediaType,
        query: &str,
        year: Option<u32>,
    ) -> Option<ScoredHit> {
        let found = self.search_scored(media_type, query, year, year).await;
        if found.is_some() || year.is_none() {
            return found;
        }
        debug!(query, "No results with year, retrying without");
        self.search_scored(media_type, query, None, year).await
    }

    /// Search and pick the best candidate; `score_year` is always the
    /// record's year so the bonus applies even to yearless searches.
    async fn search_scored(
        &self,
        media_type: MediaType,
        query: &str,
        search_year: Option<u32>,
        score_year: Option<u32>,
    ) -> Option<ScoredHit> {
        let (hit, score) = if media_type.is_episodic() {
            let results = self.catalog.search_tv(query, search_year).await;
            let results = record("search_tv", query, results)?;
            let (index, score) = select_best(query, score_year, results.iter())?;
            (Hit::Series(results[index].clone()), score)
        } else {
            let results = self.catalog.search_movies(query, search_year).await;
            let results = record("search_movies", query, results)?;
            let (index, score) = select_best(query, score_year, results.iter())?;
            (Hit::Movie(results[index].clone()), score)
        };

        Some(ScoredHit {
            hit,
            score,
            query: query.to_string(),
        })
    }

    /// Turn the winning hit into a [`CatalogMatch`], adding details when the
    /// catalog provides them.
    async fn enrich(&self, best: ScoredHit, info: &MediaInfo) -> CatalogMatch {
        debug!(query = %best.query, score = best.score, "Selected catalog candidate");
        match best.hit {
            Hit::Movie(movie) => {
                let base = CatalogMatch::from_movie(&movie, best.score);
                let details = self.catalog.movie_details(movie.id).await;
                match record_one("movie_details", movie.id, details) {
                    Some(details) => base.with_movie_details(details),
                    None => base,
                }
            }
            Hit::Series(series) => {
                let mut matched = CatalogMatch::from_series(&series, info.media_type, best.score);
                let details = self.catalog.tv_details(series.id).await;
                if let Some(details) = record_one("tv_details", series.id, details) {
                    matched = matched.with_series_details(details);
                }

                if let Some(season) = info.season {
                    let details = self.catalog.season_details(series.id, season).await;
                    matched.season = record_one("season_details", series.id, details).map(SeasonMatch::from);

                    if let Some(episode) = info.episode {
                        let details = self.catalog.episode_details(series.id, season, episode).await;
                        matched.episode =
                            record_one("episode_details", series.id, details).map(EpisodeMatch::from);
                    }
                }
                matched
            }
        }
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    pub async fn clear_cache(&self) -> Result<(), CacheError> {
        self.cache.lock().await.clear()
    }

    /// Persist the cache now, logging failures.
    pub async fn flush(&self) {
        let snapshot = self.cache.lock().await.snapshot();
        self.save(snapshot).await;
    }

    /// Final flush; consumes the matcher.
    pub async fn close(self) {
        let mut cache = self.cache.into_inner();
        if cache.pending() > 0 {
            if let Err(e) = cache.snapshot().persist().await {
                warn!(error = %e, "Failed to save match cache on close");
            }
        }
    }
}

/// Log and count a search outcome; errors and empty lists become `None`.
fn record<T>(
    operation: &str,
    query: &str,
    result: Result<Vec<T>, ExternalCatalogError>,
) -> Option<Vec<T>> {
    match result {
        Ok(results) if results.is_empty() => {
            metrics::CATALOG_REQUESTS
                .with_label_values(&[operation, "empty"])
                .inc();
            None
        }
        Ok(results) => {
            metrics::CATALOG_REQUESTS
                .with_label_values(&[operation, "ok"])
                .inc();
            Some(results)
        }
        Err(e) => {
            metrics::CATALOG_REQUESTS
                .with_label_values(&[operation, "error"])
                .inc();
            warn!(operation, query, error = %e, "Catalog search failed");
            None
        }
    }
}

/// Log and count a details outcome.
fn record_one<T>(operation: &str, tmdb_id: u32, result: Result<T, ExternalCatalogError>) -> Option<T> {
    match result {
        Ok(value) => {
            metrics::CATALOG_REQUESTS
                .with_label_values(&[operation, "ok"])
                .inc();
            Some(value)
        }
        Err(e) => {
            metrics::CATALOG_REQUESTS
                .with_label_values(&[operation, "error"])
                .inc();
            warn!(operation, tmdb_id, error = %e, "Catalog details unavailable, keeping search data");
            None
        }
    }
}
