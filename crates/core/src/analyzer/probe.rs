//! File content analysis via ffprobe.
//!
//! Probing is an optional enhancement: every failure degrades to an empty
//! [`ProbeReport`] and the filename-derived attributes are kept.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;
use walkdir::WalkDir;

use super::patterns::{language_for_code, MEDIA_EXTENSIONS};
use crate::config::ProbeConfig;
use crate::media::MediaInfo;

/// Errors that can occur while probing a single file.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Path does not exist.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// FFprobe exited with an error.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// FFprobe did not finish in time.
    #[error("Probe timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Failed to parse FFprobe output.
    #[error("Failed to parse probe output: {reason}")]
    ParseError { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Technical facts read from the media streams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub resolution: Option<String>,
    pub languages: BTreeSet<String>,
    pub subtitles: BTreeSet<String>,
    pub duration_secs: Option<f64>,
    pub bitrate: Option<u64>,
}

impl ProbeReport {
    pub fn is_empty(&self) -> bool {
        *self == ProbeReport::default()
    }
}

/// Source of ground-truth stream information.
#[async_trait]
pub trait ContentProber: Send + Sync {
    /// Returns the prober name for logging.
    fn name(&self) -> &str;

    /// Probe a file or a directory of media files. Never fails; an empty
    /// report means nothing could be read.
    async fn probe(&self, path: &Path) -> ProbeReport;
}

/// [`ContentProber`] backed by the `ffprobe` binary.
pub struct FfprobeProber {
    config: ProbeConfig,
}

impl FfprobeProber {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    async fn probe_file(&self, path: &Path) -> Result<ProbeReport, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let mut command = Command::new(&self.config.ffprobe_path);
        command
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .kill_on_drop(true);

        let output = timeout(Duration::from_secs(self.config.timeout_secs), command.output())
            .await
            .map_err(|_| ProbeError::Timeout {
                timeout_secs: self.config.timeout_secs,
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    ProbeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::ProbeFailed {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn probe_directory(&self, dir: &Path) -> ProbeReport {
        let mut reports = Vec::new();
        for file in media_files(dir) {
            match self.probe_file(&file).await {
                Ok(report) if !report.is_empty() => reports.push(report),
                Ok(_) => {}
                Err(e) => debug!(path = %file.display(), error = %e, "Skipping unprobeable file"),
            }
        }
        combine_reports(reports)
    }
}

#[async_trait]
impl ContentProber for FfprobeProber {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> ProbeReport {
        if !self.config.enabled {
            return ProbeReport::default();
        }
        if path.is_dir() {
            return self.probe_directory(path).await;
        }
        match self.probe_file(path).await {
            Ok(report) => report,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Probe failed, using filename data only");
                ProbeReport::default()
            }
        }
    }
}

/// Media files under `dir`, recursively, in a stable order.
pub fn media_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_media_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MEDIA_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Fold per-file reports: first codec/resolution seen wins, languages and
/// subtitles are unioned, duration and bitrate are averaged over the files.
pub fn combine_reports(reports: Vec<ProbeReport>) -> ProbeReport {
    let count = reports.len();
    let mut combined = ProbeReport::default();
    let mut duration_total = 0.0;
    let mut bitrate_total = 0u64;
    let mut saw_duration = false;
    let mut saw_bitrate = false;

    for report in reports {
        if combined.video_codec.is_none() {
            combined.video_codec = report.video_codec;
        }
        if combined.audio_codec.is_none() {
            combined.audio_codec = report.audio_codec;
        }
        if combined.resolution.is_none() {
            combined.resolution = report.resolution;
        }
        combined.languages.extend(report.languages);
        combined.subtitles.extend(report.subtitles);
        if let Some(d) = report.duration_secs {
            duration_total += d;
            saw_duration = true;
        }
        if let Some(b) = report.bitrate {
            bitrate_total += b;
            saw_bitrate = true;
        }
    }

    if count > 0 {
        if saw_duration {
            combined.duration_secs = Some(duration_total / count as f64);
        }
        if saw_bitrate {
            combined.bitrate = Some(bitrate_total / count as u64);
        }
    }
    combined
}

/// Overlay probed facts on filename-derived attributes.
///
/// Present probe values override codecs and resolution; languages and
/// subtitles are unioned.
pub fn merge_probe(info: &mut MediaInfo, report: &ProbeReport) {
    if let Some(codec) = &report.video_codec {
        info.video_codec = Some(codec.clone());
    }
    if let Some(codec) = &report.audio_codec {
        info.audio_codec = Some(codec.clone());
    }
    if let Some(resolution) = &report.resolution {
        info.resolution = Some(resolution.clone());
    }
    info.languages.extend(report.languages.iter().cloned());
    info.subtitles.extend(report.subtitles.iter().cloned());
    if info.languages.len() > 1 {
        info.is_multi_language = true;
    }
}

/// Canonical uppercase codec token for an ffprobe codec name.
pub fn normalize_codec(codec_name: &str) -> String {
    match codec_name.to_lowercase().as_str() {
        "h264" | "avc" | "avc1" => "H264".to_string(),
        "hevc" | "h265" => "X265".to_string(),
        "av1" => "AV1".to_string(),
        "vp9" => "VP9".to_string(),
        "aac" => "AAC".to_string(),
        "ac3" => "AC3".to_string(),
        "eac3" => "DDP".to_string(),
        "dts" => "DTS".to_string(),
        "truehd" => "TRUEHD".to_string(),
        "flac" => "FLAC".to_string(),
        "opus" => "OPUS".to_string(),
        "vorbis" => "VORBIS".to_string(),
        "mp3" => "MP3".to_string(),
        other => other.to_uppercase(),
    }
}

/// Resolution bucket from frame size. Width is checked too so that
/// letterboxed encodes (1920x800) land in the right bucket.
pub fn resolution_bucket(width: u32, height: u32) -> String {
    let bucket = if width >= 3600 || height >= 2000 {
        "2160P"
    } else if width >= 2400 || height >= 1400 {
        "1440P"
    } else if width >= 1800 || height >= 1000 {
        "1080P"
    } else if width >= 1200 || height >= 700 {
        "720P"
    } else if height >= 460 {
        "480P"
    } else if height >= 340 {
        "360P"
    } else {
        return format!("{}P", height);
    };
    bucket.to_string()
}

/// Display name for a stream language tag; unknown tags are kept uppercased.
fn stream_language(tag: &str) -> Option<String> {
    let tag = tag.trim();
    if tag.is_empty() || tag.eq_ignore_ascii_case("und") {
        return None;
    }
    Some(
        language_for_code(tag)
            .map(str::to_string)
            .unwrap_or_else(|| tag.to_uppercase()),
    )
}

/// Parses ffprobe JSON output.
pub fn parse_probe_output(output: &str) -> Result<ProbeReport, ProbeError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        #[serde(default)]
        format: Option<ProbeFormat>,
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    #[derive(Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
        bit_rate: Option<String>,
    }

    #[derive(Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        codec_name: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        #[serde(default)]
        tags: ProbeTags,
    }

    #[derive(Deserialize, Default)]
    struct ProbeTags {
        language: Option<String>,
    }

    let probe: ProbeOutput = serde_json::from_str(output).map_err(|e| ProbeError::ParseError {
        reason: e.to_string(),
    })?;

    let mut report = ProbeReport::default();
    if let Some(format) = &probe.format {
        report.duration_secs = format.duration.as_ref().and_then(|d| d.parse().ok());
        report.bitrate = format.bit_rate.as_ref().and_then(|b| b.parse().ok());
    }

    for stream in &probe.streams {
        let codec = stream
            .codec_name
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(normalize_codec);
        let language = stream.tags.language.as_deref().and_then(stream_language);

        match stream.codec_type.as_deref() {
            Some("video") => {
                // Cover art is exposed as a video stream; keep the first real one.
                if report.video_codec.is_none() {
                    report.video_codec = codec;
                    if let (Some(w), Some(h)) = (stream.width, stream.height) {
                        report.resolution = Some(resolution_bucket(w, h));
                    }
                }
            }
            Some("audio") => {
                if report.audio_codec.is_none() {
                    report.audio_codec = codec;
                }
                report.languages.extend(language);
            }
            Some("subtitle") => {
                report.subtitles.extend(language);
            }
            _ => {}
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MKV_PROBE: &str = r#"{
        "format": {
            "filename": "show.mkv",
            "format_name": "matroska,webm",
            "duration": "2700.5",
            "bit_rate": "8000000"
        },
        "streams": [
            {"codec_type": "video", "codec_name": "hevc", "width": 3840, "height": 2160},
            {"codec_type": "audio", "codec_name": "eac3", "tags": {"language": "fre"}},
            {"codec_type": "audio", "codec_name": "aac", "tags": {"language": "eng"}},
            {"codec_type": "subtitle", "codec_name": "subrip", "tags": {"language": "fre"}},
            {"codec_type": "subtitle", "codec_name": "subrip", "tags": {"language": "und"}}
        ]
    }"#;

    #[test]
    fn test_parse_probe_output() {
        let report = parse_probe_output(MKV_PROBE).unwrap();
        assert_eq!(report.video_codec.as_deref(), Some("X265"));
        assert_eq!(report.audio_codec.as_deref(), Some("DDP"));
        assert_eq!(report.resolution.as_deref(), Some("2160P"));
        assert!(report.languages.contains("French"));
        assert!(report.languages.contains("English"));
        assert_eq!(report.subtitles.len(), 1);
        assert!(report.subtitles.contains("French"));
        assert!((report.duration_secs.unwrap() - 2700.5).abs() < 0.01);
        assert_eq!(report.bitrate, Some(8_000_000));
    }

    #[test]
    fn test_parse_probe_output_invalid_json() {
        assert!(matches!(
            parse_probe_output("not json"),
            Err(ProbeError::ParseError { .. })
        ));
    }

    #[test]
    fn test_unknown_language_kept_uppercase() {
        let json = r#"{"streams": [{"codec_type": "audio", "codec_name": "dts", "tags": {"language": "tur"}}]}"#;
        let report = parse_probe_output(json).unwrap();
        assert!(report.languages.contains("TUR"));
        assert_eq!(report.audio_codec.as_deref(), Some("DTS"));
    }

    #[test]
    fn test_normalize_codec() {
        assert_eq!(normalize_codec("h264"), "H264");
        assert_eq!(normalize_codec("HEVC"), "X265");
        assert_eq!(normalize_codec("truehd"), "TRUEHD");
        assert_eq!(normalize_codec("mpeg2video"), "MPEG2VIDEO");
    }

    #[test]
    fn test_resolution_bucket() {
        assert_eq!(resolution_bucket(3840, 2160), "2160P");
        assert_eq!(resolution_bucket(1920, 800), "1080P");
        assert_eq!(resolution_bucket(1280, 720), "720P");
        assert_eq!(resolution_bucket(720, 480), "480P");
        assert_eq!(resolution_bucket(320, 240), "240P");
    }

    #[test]
    fn test_combine_reports() {
        let first = ProbeReport {
            video_codec: Some("X265".to_string()),
            languages: ["French".to_string()].into(),
            duration_secs: Some(100.0),
            bitrate: Some(4000),
            ..Default::default()
        };
        let second = ProbeReport {
            video_codec: Some("H264".to_string()),
            audio_codec: Some("AAC".to_string()),
            resolution: Some("1080P".to_string()),
            languages: ["English".to_string()].into(),
            duration_secs: Some(300.0),
            bitrate: Some(2000),
            ..Default::default()
        };

        let combined = combine_reports(vec![first, second]);
        assert_eq!(combined.video_codec.as_deref(), Some("X265"));
        assert_eq!(combined.audio_codec.as_deref(), Some("AAC"));
        assert_eq!(combined.resolution.as_deref(), Some("1080P"));
        assert_eq!(combined.languages.len(), 2);
        assert_eq!(combined.duration_secs, Some(200.0));
        assert_eq!(combined.bitrate, Some(3000));
    }

    #[test]
    fn test_combine_single_report_not_averaged() {
        let only = ProbeReport {
            duration_secs: Some(42.0),
            ..Default::default()
        };
        assert_eq!(combine_reports(vec![only]).duration_secs, Some(42.0));
        assert!(combine_reports(Vec::new()).is_empty());
    }

    #[test]
    fn test_merge_probe_overrides_and_unions() {
        let mut info = MediaInfo::new("Film");
        info.video_codec = Some("X264".to_string());
        info.audio_codec = Some("AAC".to_string());
        info.languages.insert("French".to_string());

        let report = ProbeReport {
            video_codec: Some("X265".to_string()),
            languages: ["English".to_string()].into(),
            subtitles: ["French".to_string()].into(),
            ..Default::default()
        };
        merge_probe(&mut info, &report);

        assert_eq!(info.video_codec.as_deref(), Some("X265"));
        // Absent probe value keeps the filename guess
        assert_eq!(info.audio_codec.as_deref(), Some("AAC"));
        assert_eq!(info.languages.len(), 2);
        assert!(info.is_multi_language);
        assert!(info.subtitles.contains("French"));
    }

    #[test]
    fn test_media_files_filters_extensions() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Season 1")).unwrap();
        fs::write(dir.path().join("Season 1/e02.mkv"), b"").unwrap();
        fs::write(dir.path().join("Season 1/e01.MP4"), b"").unwrap();
        fs::write(dir.path().join("info.nfo"), b"").unwrap();

        let files = media_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("Season 1/e01.MP4"));
    }

    #[tokio::test]
    async fn test_missing_binary_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("movie.mkv");
        fs::write(&file, b"not a video").unwrap();

        let prober = FfprobeProber::new(ProbeConfig {
            enabled: true,
            ffprobe_path: PathBuf::from("/nonexistent/ffprobe"),
            timeout_secs: 5,
        });
        assert!(prober.probe(&file).await.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_prober_returns_empty() {
        let prober = FfprobeProber::new(ProbeConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(prober.probe(Path::new("/anything.mkv")).await.is_empty());
    }
}
