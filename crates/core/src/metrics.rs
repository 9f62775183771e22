//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Match cache (hits, misses, lazy expiry)
//! - Catalog requests by operation and outcome
//! - Matching (titles tried per match, final outcome)

use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

// =============================================================================
// Cache
// =============================================================================

/// Cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trackprep_cache_lookups_total", "Total match cache lookups"),
        &["result"], // "hit", "miss", "expired"
    )
    .unwrap()
});

// =============================================================================
// Catalog
// =============================================================================

/// Catalog requests by operation and status.
pub static CATALOG_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "trackprep_catalog_requests_total",
            "Total catalog requests",
        ),
        // operation: "search_movies", "movie_details", "search_tv", "tv_details",
        //            "season_details", "episode_details"
        // status: "ok", "empty", "error"
        &["operation", "status"],
    )
    .unwrap()
});

// =============================================================================
// Matching
// =============================================================================

/// Titles tried per uncached match.
pub static MATCH_ATTEMPTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "trackprep_match_attempts",
            "Number of title variants searched per match",
        )
        .buckets(vec![1.0, 2.0, 3.0, 4.0, 6.0, 8.0]),
        &[],
    )
    .unwrap()
});

/// Match outcomes.
pub static MATCH_RESULTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trackprep_match_results_total", "Total match outcomes"),
        &["result"], // "matched", "low_confidence", "unmatched"
    )
    .unwrap()
});

/// All metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(CATALOG_REQUESTS.clone()),
        Box::new(MATCH_ATTEMPTS.clone()),
        Box::new(MATCH_RESULTS.clone()),
    ]
}

/// Render every metric in the Prometheus text format.
pub fn gather_text() -> String {
    let registry = Registry::new();
    for metric in all_metrics() {
        // Only fails on duplicate names, which all_metrics never has.
        let _ = registry.register(metric);
    }

    let mut buffer = Vec::new();
    if TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .is_err()
    {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
    }

    #[test]
    fn test_gather_text_contains_counters() {
        CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
        MATCH_RESULTS.with_label_values(&["unmatched"]).inc();
        let text = gather_text();
        assert!(text.contains("trackprep_cache_lookups_total"));
        assert!(text.contains("trackprep_match_results_total"));
    }
}
