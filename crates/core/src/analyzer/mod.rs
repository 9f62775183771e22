//! Release-name analysis.
//!
//! - [`patterns`]: the ordered recognizer tables
//! - [`filename`]: name + category hint -> [`MediaInfo`]
//! - [`title`]: display-title reconstruction
//! - [`probe`]: optional stream probing that refines the guess

pub mod filename;
pub mod patterns;
pub mod probe;
pub mod title;

use std::path::Path;

use tracing::debug;

pub use filename::{FilenameAnalyzer, DEFAULT_VERSION};
pub use patterns::{PatternSet, TokenMatch};
pub use probe::{merge_probe, ContentProber, FfprobeProber, ProbeError, ProbeReport};

use crate::media::MediaInfo;

/// Analyze a release name, then refine it with the content at `path` when a
/// prober and a path are both available.
pub async fn analyze_release(
    analyzer: &FilenameAnalyzer,
    prober: Option<&dyn ContentProber>,
    filename: &str,
    category: &str,
    path: Option<&Path>,
) -> MediaInfo {
    let mut info = analyzer.analyze(filename, category);

    if let (Some(prober), Some(path)) = (prober, path) {
        let report = prober.probe(path).await;
        if report.is_empty() {
            debug!(prober = prober.name(), path = %path.display(), "No stream data, keeping filename guess");
        } else {
            merge_probe(&mut info, &report);
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProber;

    #[tokio::test]
    async fn test_analyze_release_without_prober() {
        let analyzer = FilenameAnalyzer::default();
        let info = analyze_release(&analyzer, None, "Film.2020.1080p.x264-GRP.mkv", "movie", None).await;
        assert_eq!(info.title, "Film");
        assert_eq!(info.video_codec.as_deref(), Some("X264"));
    }

    #[tokio::test]
    async fn test_analyze_release_merges_probe() {
        let analyzer = FilenameAnalyzer::default();
        let prober = MockProber::new();
        prober
            .set_report(ProbeReport {
                video_codec: Some("X265".to_string()),
                languages: ["English".to_string()].into(),
                ..Default::default()
            })
            .await;

        let info = analyze_release(
            &analyzer,
            Some(&prober),
            "Film.2020.FRENCH.1080p.x264-GRP.mkv",
            "movie",
            Some(Path::new("/downloads/film.mkv")),
        )
        .await;

        assert_eq!(info.video_codec.as_deref(), Some("X265"));
        assert!(info.is_multi_language);
        assert_eq!(prober.probed_paths().await.len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_release_skips_probe_without_path() {
        let analyzer = FilenameAnalyzer::default();
        let prober = MockProber::new();
        let _ = analyze_release(&analyzer, Some(&prober), "Film.2020.mkv", "movie", None).await;
        assert!(prober.probed_paths().await.is_empty());
    }
}
