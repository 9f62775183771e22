//! Filename analyzer: release name + category hint -> [`MediaInfo`].
//!
//! Each extraction step is a pure function over the lower-cased name that
//! returns its own partial result (values plus the byte offsets where they were
//! found). [`FilenameAnalyzer::analyze`] composes them and hands the offsets to
//! the title cleaner.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::patterns::{
    all_token_matches, TeamForm, TokenMatch, AUDIO_CODEC, HDR, LANGUAGES, PLATFORM, RESOLUTION,
    SOURCE, SPECIAL_VERSION, SUBTITLE_TOKENS, TEAM, TRASH, VIDEO_CODEC, YEAR,
};
use super::title;
use crate::config::AnalyzerConfig;
use crate::media::{MediaInfo, MediaType};

/// Version recorded when no special-version token is present.
pub const DEFAULT_VERSION: &str = "Original";

/// Technical tokens, one per attribute, first rule wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechnicalTokens {
    pub resolution: Option<TokenMatch>,
    pub video_codec: Option<TokenMatch>,
    pub hdr: Option<TokenMatch>,
    pub platform: Option<TokenMatch>,
    pub version: Option<TokenMatch>,
    pub audio_codec: Option<TokenMatch>,
    pub source: Option<TokenMatch>,
}

impl TechnicalTokens {
    fn all(&self) -> [&Option<TokenMatch>; 7] {
        [
            &self.resolution,
            &self.video_codec,
            &self.hdr,
            &self.platform,
            &self.version,
            &self.audio_codec,
            &self.source,
        ]
    }

    /// Offsets of every detected token.
    pub fn positions(&self) -> Vec<usize> {
        self.all()
            .into_iter()
            .filter_map(|t| t.as_ref().map(|m| m.start))
            .collect()
    }
}

/// Season/episode numbering found in a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeTokens {
    pub season: u32,
    pub episode: Option<u32>,
    /// Offset of the season marker.
    pub start: usize,
}

impl EpisodeTokens {
    pub fn full_season(&self) -> bool {
        self.episode.is_none()
    }
}

/// Audio languages and the multi-language marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageTokens {
    pub languages: BTreeSet<String>,
    pub multi_marker: Option<usize>,
    /// Earliest offset per detected language.
    pub positions: Vec<usize>,
}

impl LanguageTokens {
    pub fn is_multi_language(&self) -> bool {
        self.multi_marker.is_some() || self.languages.len() > 1
    }
}

/// Subtitle languages found by substring lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleTokens {
    pub subtitles: BTreeSet<String>,
    /// Offsets of tokens that start on a separator boundary.
    pub positions: Vec<usize>,
}

// ============================================================================
// Steps
// ============================================================================

/// Category hint first, then name tokens, then movie.
pub fn determine_type(name: &str, category: &str) -> MediaType {
    let category = category.to_lowercase();
    if category.contains("tv") || category.contains("series") {
        return MediaType::TvShow;
    }
    if category.contains("anime") || category.contains("manga") {
        return MediaType::Anime;
    }
    if category.contains("movie") || category.contains("film") {
        return MediaType::Movie;
    }

    let name = name.to_lowercase();
    if ["s0", "season", "episode"].iter().any(|t| name.contains(t)) {
        MediaType::TvShow
    } else if name.contains("anime") || name.contains("manga") {
        MediaType::Anime
    } else {
        MediaType::Movie
    }
}

pub fn extract_technical(name: &str) -> TechnicalTokens {
    TechnicalTokens {
        resolution: RESOLUTION.first_match(name),
        video_codec: VIDEO_CODEC.first_match(name),
        hdr: HDR.first_match(name),
        platform: PLATFORM.first_match(name),
        version: SPECIAL_VERSION.first_match(name),
        audio_codec: AUDIO_CODEC.first_match(name),
        source: SOURCE.first_match(name),
    }
}

/// First year-like token, unless it opens the name and another one follows
/// (`1917.2019.1080p` is the film "1917" from 2019).
pub fn extract_year(name: &str) -> Option<TokenMatch> {
    let mut years = all_token_matches(&YEAR, name).into_iter();
    let first = years.next()?;
    if first.start == 0 {
        if let Some(second) = years.next() {
            return Some(second);
        }
    }
    Some(first)
}

static EPISODE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:^|[^a-z0-9])(s(\d{1,2})[ ._-]?e(\d{1,3}))(?:[^0-9]|$)",
        r"(?i)(?:^|[^a-z0-9])((\d{1,2})x(\d{2,3}))(?:[^a-z0-9]|$)",
        r"(?i)(?:^|[^a-z0-9])(season[ ._-]?(\d{1,2})[ ._-]?episode[ ._-]?(\d{1,3}))(?:[^0-9]|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("episode pattern is valid"))
    .collect()
});

static SEASON_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:^|[^a-z0-9])((?:season|saison)[ ._-]?(\d{1,2}))(?:[^0-9]|$)",
        r"(?i)(?:^|[^a-z0-9])(s(\d{1,2}))(?:[^a-z0-9]|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("season pattern is valid"))
    .collect()
});

/// `01-12` style episode ranges denote a complete first season.
static EPISODE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])((\d{2,3})-(\d{2,3}))(?:[^a-z0-9]|$)")
        .expect("range pattern is valid")
});

/// Season/episode numbering, in structural priority order.
pub fn extract_season_episode(name: &str) -> Option<EpisodeTokens> {
    for pattern in EPISODE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(name) {
            let marker = caps.get(1)?;
            let season = caps.get(2)?.as_str().parse().ok()?;
            let episode = caps.get(3)?.as_str().parse().ok()?;
            return Some(EpisodeTokens {
                season,
                episode: Some(episode),
                start: marker.start(),
            });
        }
    }

    for pattern in SEASON_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(name) {
            let marker = caps.get(1)?;
            let season = caps.get(2)?.as_str().parse().ok()?;
            return Some(EpisodeTokens {
                season,
                episode: None,
                start: marker.start(),
            });
        }
    }

    let caps = EPISODE_RANGE.captures(name)?;
    let low: u32 = caps.get(2)?.as_str().parse().ok()?;
    let high: u32 = caps.get(3)?.as_str().parse().ok()?;
    if high <= low {
        return None;
    }
    Some(EpisodeTokens {
        season: 1,
        episode: None,
        start: caps.get(1)?.start(),
    })
}

/// Union of every language whose table entry matches, plus the multi marker.
pub fn extract_languages(name: &str, multi_marker: &Regex) -> LanguageTokens {
    let mut tokens = LanguageTokens::default();
    for language in LANGUAGES.iter() {
        if let Some(found) = language.patterns.earliest_match(name) {
            tokens.languages.insert(language.name.to_string());
            tokens.positions.push(found.start);
        }
    }
    tokens.multi_marker = multi_marker
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.start());
    tokens
}

pub fn extract_subtitles(name: &str) -> SubtitleTokens {
    let mut tokens = SubtitleTokens::default();
    for (token, language) in SUBTITLE_TOKENS {
        let Some(pos) = name.find(token) else {
            continue;
        };
        tokens.subtitles.insert(language.to_string());
        let on_boundary = name[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_ascii_alphanumeric());
        if on_boundary {
            tokens.positions.push(pos);
        }
    }
    tokens
}

/// Release group from the end of the stem, or a leading `[Group]` tag.
///
/// A trailing tag is only trusted when it follows technical noise
/// (`noise_floor`), otherwise the tail of a plain or hyphenated title
/// (`spider-man`) would be taken. Candidates that are numbers or technical
/// tokens are skipped, including the tail of a compound token (`web-dl`).
pub fn extract_team(stem: &str, noise_floor: Option<usize>, multi_marker: &Regex) -> Option<TokenMatch> {
    for rule in TEAM.iter() {
        let Some(group) = rule.regex.captures(stem).and_then(|caps| caps.get(1)) else {
            continue;
        };
        let candidate = group.as_str().trim();
        if candidate.is_empty() || is_reserved_token(candidate, multi_marker) {
            continue;
        }
        if rule.form != TeamForm::Leading && !noise_floor.is_some_and(|floor| group.start() > floor) {
            continue;
        }
        if rule.form == TeamForm::DashSuffix && ends_compound_token(stem, group.start(), group.end()) {
            continue;
        }
        return Some(TokenMatch {
            value: candidate.to_uppercase(),
            start: group.start(),
            end: group.end(),
        });
    }
    None
}

/// A technical token that starts before the dash and ends with the candidate.
fn ends_compound_token(stem: &str, start: usize, end: usize) -> bool {
    [&*SOURCE, &*AUDIO_CODEC, &*VIDEO_CODEC, &*HDR, &*PLATFORM, &*SPECIAL_VERSION]
        .iter()
        .any(|set| set.spans_to(stem, start, end))
}

fn is_reserved_token(candidate: &str, multi_marker: &Regex) -> bool {
    if candidate.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    let technical = [
        &*RESOLUTION,
        &*VIDEO_CODEC,
        &*HDR,
        &*PLATFORM,
        &*SPECIAL_VERSION,
        &*AUDIO_CODEC,
        &*SOURCE,
        &*TRASH,
    ];
    technical.iter().any(|set| set.matches_whole(candidate))
        || LANGUAGES.iter().any(|l| l.patterns.matches_whole(candidate))
        || multi_marker
            .captures(candidate)
            .and_then(|caps| caps.get(1))
            .is_some_and(|m| m.start() == 0 && m.end() == candidate.len())
}

// ============================================================================
// Analyzer
// ============================================================================

/// Turns release names into [`MediaInfo`] records.
#[derive(Debug, Clone)]
pub struct FilenameAnalyzer {
    multi_label: String,
    multi_marker: Regex,
    min_title_segments: usize,
}

impl FilenameAnalyzer {
    pub fn new(multi_label: impl Into<String>, min_title_segments: usize) -> Self {
        let multi_label = multi_label.into();
        let multi_marker = super::patterns::multi_marker(&multi_label);
        Self {
            multi_label,
            multi_marker,
            min_title_segments,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(&config.multi_language_label, config.min_title_segments)
    }

    pub fn multi_label(&self) -> &str {
        &self.multi_label
    }

    /// Analyze a release name. Never fails; unknown attributes stay unset.
    pub fn analyze(&self, filename: &str, category: &str) -> MediaInfo {
        let lower = filename.trim().to_lowercase();
        let stem = title::strip_extension(&lower);

        let media_type = determine_type(&lower, category);
        let technical = extract_technical(&lower);
        let year = extract_year(&lower);
        let episode = if media_type.is_episodic() {
            extract_season_episode(&lower)
        } else {
            None
        };
        let languages = extract_languages(&lower, &self.multi_marker);
        let subtitles = extract_subtitles(&lower);
        let trash = TRASH.earliest_match(&lower);

        let mut noise = technical.positions();
        noise.extend(year.as_ref().map(|y| y.start));
        noise.extend(episode.map(|e| e.start));
        let noise_floor = noise.iter().copied().min();

        let team = extract_team(stem, noise_floor, &self.multi_marker);

        noise.extend(team.as_ref().map(|t| t.start));
        noise.extend(languages.positions.iter().copied());
        noise.extend(languages.multi_marker);
        noise.extend(subtitles.positions.iter().copied());
        noise.extend(trash.map(|t| t.start));

        let title_start = title::leading_group_end(stem);
        let title = title::clean_title(stem, title_start, &noise, self.min_title_segments);

        let value = |t: &Option<TokenMatch>| t.as_ref().map(|m| m.value.clone());
        let is_multi_language = languages.is_multi_language();
        MediaInfo {
            title,
            year: year.and_then(|y| y.value.parse().ok()),
            media_type,
            source: value(&technical.source),
            version: Some(value(&technical.version).unwrap_or_else(|| DEFAULT_VERSION.to_string())),
            team: team.map(|t| t.value),
            resolution: value(&technical.resolution),
            video_codec: value(&technical.video_codec),
            audio_codec: value(&technical.audio_codec),
            hdr: value(&technical.hdr),
            platform: value(&technical.platform),
            languages: languages.languages,
            is_multi_language,
            subtitles: subtitles.subtitles,
            season: episode.map(|e| e.season),
            episode: episode.and_then(|e| e.episode),
            full_season: episode.is_some_and(|e| e.full_season()),
            tmdb_id: None,
            imdb_id: None,
        }
    }
}

impl Default for FilenameAnalyzer {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}
