//! Batch extraction: analyze, probe, match, one item at a time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::analyzer::{analyze_release, ContentProber, FilenameAnalyzer};
use crate::external_catalog::MediaCatalog;
use crate::matcher::{CatalogMatch, CatalogMatcher};
use crate::media::MediaInfo;
use crate::naming::enhance_source;

/// Why a single item produced no record.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Item has an empty name")]
    EmptyName,

    #[error("No catalog match for {title:?} (from {name:?})")]
    NoMatch { name: String, title: String },
}

/// One release to process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionItem {
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Downloaded content, probed when a prober is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_path: Option<PathBuf>,
}

impl ExtractionItem {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            content_path: None,
        }
    }

    pub fn with_content_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.content_path = Some(path.into());
        self
    }
}

/// A successfully matched item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRecord {
    pub name: String,
    pub media: MediaInfo,
    #[serde(rename = "tmdb")]
    pub matched: CatalogMatch,
}

/// Aggregate outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Succeeded, but with a low-confidence match.
    pub low_confidence: usize,
    pub records: Vec<ExtractionRecord>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Drives the analyzer, the optional prober and the matcher.
pub struct Extractor<C: MediaCatalog> {
    analyzer: FilenameAnalyzer,
    prober: Option<Box<dyn ContentProber>>,
    matcher: CatalogMatcher<C>,
}

impl<C: MediaCatalog> Extractor<C> {
    pub fn new(analyzer: FilenameAnalyzer, matcher: CatalogMatcher<C>) -> Self {
        Self {
            analyzer,
            prober: None,
            matcher,
        }
    }

    pub fn with_prober(mut self, prober: Box<dyn ContentProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn matcher(&self) -> &CatalogMatcher<C> {
        &self.matcher
    }

    /// Analyze `item` without touching the catalog.
    pub async fn analyze(&self, item: &ExtractionItem) -> MediaInfo {
        analyze_release(
            &self.analyzer,
            self.prober.as_deref(),
            &item.name,
            &item.category,
            item.content_path.as_deref(),
        )
        .await
    }

    pub async fn extract_one(&self, item: &ExtractionItem) -> Result<ExtractionRecord, ExtractError> {
        if item.name.trim().is_empty() {
            return Err(ExtractError::EmptyName);
        }

        let mut media = self.analyze(item).await;
        let matched = self
            .matcher
            .match_media(&media)
            .await
            .ok_or_else(|| ExtractError::NoMatch {
                name: item.name.clone(),
                title: media.title.clone(),
            })?;
        media.apply_match(&matched);
        enhance_source(&mut media, Some(&matched));

        Ok(ExtractionRecord {
            name: item.name.clone(),
            media,
            matched,
        })
    }

    /// Process every item in order. Failures are counted and logged.
    pub async fn extract_all(&self, items: &[ExtractionItem]) -> BatchReport {
        let mut report = BatchReport::default();
        info!(count = items.len(), "Starting extraction");

        for (index, item) in items.iter().enumerate() {
            info!(
                item = index + 1,
                total = items.len(),
                name = %item.name,
                "Processing"
            );
            match self.extract_one(item).await {
                Ok(record) => {
                    if record.matched.is_low_confidence() {
                        report.low_confidence += 1;
                    }
                    report.succeeded += 1;
                    report.records.push(record);
                }
                Err(e) => {
                    error!(name = %item.name, error = %e, "Failed to process item");
                    report.failed += 1;
                }
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            low_confidence = report.low_confidence,
            "Extraction complete"
        );
        report
    }

    /// Flush the match cache and release the extractor.
    pub async fn close(self) {
        self.matcher.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ProbeReport;
    use crate::matcher::MatchCache;
    use crate::testing::{fixtures, MockCatalog, MockProber};
    use tempfile::TempDir;

    async fn extractor(dir: &TempDir) -> Extractor<MockCatalog> {
        let catalog = MockCatalog::new();
        catalog.add_movie(fixtures::movie(603, "The Matrix", "1999-03-30")).await;
        catalog.add_series(fixtures::series(83867, "Andor", "2022-09-21")).await;
        let cache = MatchCache::load(dir.path().join("tmdb_cache.json"), 86_400, 10);
        Extractor::new(FilenameAnalyzer::default(), CatalogMatcher::new(catalog, cache))
    }

    #[tokio::test]
    async fn test_extract_one_applies_match() {
        let dir = TempDir::new().unwrap();
        let ex = extractor(&dir).await;

        let record = ex
            .extract_one(&ExtractionItem::new(
                "The.Matrix.1999.1080p.BluRay.x264-GRP.mkv",
                "movies",
            ))
            .await
            .unwrap();
        assert_eq!(record.media.tmdb_id, Some(603));
        assert_eq!(record.matched.title, "The Matrix");
    }

    #[tokio::test]
    async fn test_extract_one_tags_source_with_network() {
        let dir = TempDir::new().unwrap();
        let ex = extractor(&dir).await;
        let mut details = fixtures::series(83867, "Andor", "2022-09-21");
        details.networks = vec!["Disney+".to_string()];
        ex.matcher().catalog().add_series_details(details).await;

        let record = ex
            .extract_one(&ExtractionItem::new(
                "Andor.S01E03.1080p.WEB.x264-TEAM.mkv",
                "tvshows",
            ))
            .await
            .unwrap();
        assert_eq!(record.media.source.as_deref(), Some("WEB-DL.DSN"));
        assert_eq!(record.matched.networks, vec!["Disney+"]);
    }

    #[tokio::test]
    async fn test_empty_name_fails() {
        let dir = TempDir::new().unwrap();
        let ex = extractor(&dir).await;
        let result = ex.extract_one(&ExtractionItem::new("  ", "movies")).await;
        assert!(matches!(result, Err(ExtractError::EmptyName)));
    }

    #[tokio::test]
    async fn test_batch_continues_after_failures() {
        let dir = TempDir::new().unwrap();
        let ex = extractor(&dir).await;

        let items = vec![
            ExtractionItem::new("Unknown.Thing.2015.720p.WEB.x264-XYZ", "movies"),
            ExtractionItem::new("", "movies"),
            ExtractionItem::new("Andor.S01E03.FRENCH.1080p.WEB-DL.x264-TEAM.mkv", "tvshows"),
        ];
        let report = ex.extract_all(&items).await;

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.total(), 3);
        assert_eq!(report.records[0].media.season, Some(1));
        assert_eq!(report.records[0].matched.tmdb_id, 83867);
    }

    #[tokio::test]
    async fn test_prober_sees_content_path() {
        let dir = TempDir::new().unwrap();
        let prober = MockProber::new();
        prober
            .set_report(ProbeReport {
                audio_codec: Some("DTS".to_string()),
                ..Default::default()
            })
            .await;
        let ex = extractor(&dir).await.with_prober(Box::new(prober.clone()));

        let item = ExtractionItem::new("The.Matrix.1999.1080p.BluRay.x264-GRP", "movies")
            .with_content_path("/downloads/matrix");
        let record = ex.extract_one(&item).await.unwrap();

        assert_eq!(record.media.audio_codec.as_deref(), Some("DTS"));
        assert_eq!(prober.probed_paths().await, vec![PathBuf::from("/downloads/matrix")]);
    }

    #[tokio::test]
    async fn test_close_flushes_cache() {
        let dir = TempDir::new().unwrap();
        let ex = extractor(&dir).await;
        ex.extract_one(&ExtractionItem::new("The.Matrix.1999.1080p", "movies"))
            .await
            .unwrap();
        ex.close().await;
        assert!(dir.path().join("tmdb_cache.json").exists());
    }
}
