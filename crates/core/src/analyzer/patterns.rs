//! Pattern library: ordered recognizers for release-name tokens.
//!
//! Every technical attribute has a [`PatternSet`]: a list of rules in priority
//! order. Evaluation stops at the first rule that matches anywhere in the name,
//! so rule order (not position in the name) decides between competing tokens.
//! The tables are plain data so their order can be audited and tested on its own.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// A token found in a release name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    /// Normalized value: uppercased, trailing whitespace trimmed.
    pub value: String,
    /// Byte offset of the token in the searched text.
    pub start: usize,
    /// Byte offset just past the token.
    pub end: usize,
}

/// Wrap an alternation so it only matches between separators.
///
/// Release names use `.`, `_`, `-`, spaces and brackets interchangeably, so
/// `\b` (which treats `_` as a word character) is not enough.
pub fn token_pattern(alternation: &str) -> String {
    format!(r"(?i)(?:^|[^a-z0-9])({})(?:[^a-z0-9]|$)", alternation)
}

/// An ordered list of recognizers for one attribute.
#[derive(Debug)]
pub struct PatternSet {
    name: &'static str,
    rules: Vec<Regex>,
}

impl PatternSet {
    /// Build a set from token alternations, highest priority first.
    ///
    /// The tables are compile-time constants; an invalid entry is a bug.
    pub fn from_tokens(name: &'static str, alternations: &[&str]) -> Self {
        let rules = alternations
            .iter()
            .map(|alt| {
                Regex::new(&token_pattern(alt))
                    .unwrap_or_else(|e| panic!("invalid {} pattern {:?}: {}", name, alt, e))
            })
            .collect();
        Self { name, rules }
    }

    /// Build a set from raw regexes whose first capture group is the token.
    pub fn from_raw(name: &'static str, patterns: &[&str]) -> Self {
        let rules = patterns
            .iter()
            .map(|p| {
                Regex::new(p)
                    .unwrap_or_else(|e| panic!("invalid {} pattern {:?}: {}", name, p, e))
            })
            .collect();
        Self { name, rules }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule (in priority order) that matches; its leftmost match wins.
    pub fn first_match(&self, text: &str) -> Option<TokenMatch> {
        self.rules.iter().find_map(|rule| capture_token(rule, text))
    }

    /// Index of the first rule that matches, for priority assertions.
    pub fn matching_rule(&self, text: &str) -> Option<usize> {
        self.rules.iter().position(|rule| rule.is_match(text))
    }

    /// Earliest position any rule matches at.
    pub fn earliest_match(&self, text: &str) -> Option<TokenMatch> {
        self.rules
            .iter()
            .filter_map(|rule| capture_token(rule, text))
            .min_by_key(|m| m.start)
    }

    /// Whether a token of this set ends at `end` and starts before `before`.
    ///
    /// Catches compound tokens such as `web-dl` whose tail alone is not a token.
    pub fn spans_to(&self, text: &str, before: usize, end: usize) -> bool {
        self.rules.iter().any(|rule| {
            all_token_matches(rule, text)
                .iter()
                .any(|m| m.end == end && m.start < before)
        })
    }

    /// Whether `candidate` as a whole is one of this set's tokens.
    pub fn matches_whole(&self, candidate: &str) -> bool {
        self.rules.iter().any(|rule| {
            capture_token(rule, candidate)
                .map(|m| m.start == 0 && m.end == candidate.len())
                .unwrap_or(false)
        })
    }
}

/// Extract capture group 1 of the leftmost match.
fn capture_token(rule: &Regex, text: &str) -> Option<TokenMatch> {
    let group = rule.captures(text)?.get(1)?;
    Some(TokenMatch {
        value: group.as_str().to_uppercase().trim_end().to_string(),
        start: group.start(),
        end: group.end(),
    })
}

/// All non-overlapping token matches of `rule`, in order.
///
/// Adjacent tokens share a separator, which `captures_iter` would consume
/// for the first one; resuming at the end of the group keeps it available.
pub fn all_token_matches(rule: &Regex, text: &str) -> Vec<TokenMatch> {
    let mut matches = Vec::new();
    let mut offset = 0;
    while offset < text.len() {
        let Some(found) = capture_token(rule, &text[offset..]) else {
            break;
        };
        let end = offset + found.end;
        matches.push(TokenMatch {
            value: found.value,
            start: offset + found.start,
            end,
        });
        offset = end;
    }
    matches
}

// ============================================================================
// Technical attributes
// ============================================================================

pub static RESOLUTION: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::from_tokens(
        "resolution",
        &[
            r"2160p|4klight|4k[^a-z0-9]sdr|4k|uhd",
            r"1080p|1080i|fhd|fullhd|hdlight|mhd|minihd",
            r"720p|hd",
            r"576p|480p|sd",
            r"360p|vga|vcd|ntsc",
        ],
    )
});

pub static HDR: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::from_tokens(
        "hdr",
        &[
            r"hdr10plus|hdr10\+",
            r"hdr10",
            r"dolby[^a-z0-9]?vision|dovi|dv\+|dv",
            r"hdr2100|hdr",
            r"hlg",
            r"12bit|10bit",
        ],
    )
});

pub static VIDEO_CODEC: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::from_tokens(
        "video_codec",
        &[
            r"x265|h\.?265|hevc",
            r"x264|h\.?264|avc",
            r"av1",
            r"vp9",
            r"vc-?1",
            r"xvid|divx",
        ],
    )
});

pub static AUDIO_CODEC: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::from_tokens(
        "audio_codec",
        &[
            r"truehd(?:[^a-z0-9]?atmos)?(?:[^a-z0-9]?\d\.\d)?",
            r"dts-?hd[^a-z0-9]?ma(?:[^a-z0-9]?\d\.\d)?|dts-?hdma(?:[^a-z0-9]?\d\.\d)?",
            r"dts-?hd(?:[^a-z0-9]?\d\.\d)?",
            r"dts(?:[^a-z0-9]?\d\.\d)?",
            r"ddp(?:[^a-z0-9]?\d\.\d)?|dd\+(?:[^a-z0-9]?\d\.\d)?|e-?ac-?3(?:[^a-z0-9]?\d\.\d)?",
            r"ac-?3(?:[^a-z0-9]?\d\.\d)?|dd(?:[^a-z0-9]?\d\.\d)?",
            r"aac(?:[^a-z0-9]?\d\.\d)?",
            r"atmos(?:[^a-z0-9]?\d\.\d)?",
            r"flac",
            r"opus",
            r"mp3",
            r"8ch|6ch",
        ],
    )
});

pub static SOURCE: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::from_tokens(
        "source",
        &[
            r"remux",
            r"web-?dl",
            r"web-?rip",
            r"bluray(?:5|9)?|blu-ray",
            r"bdrip|brrip|bd",
            r"hdtv",
            r"dvdrip|dvd5|dvd9|dvd",
            r"web",
        ],
    )
});

pub static PLATFORM: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::from_tokens(
        "platform",
        &[
            r"netflix|nf",
            r"amazon|amzn",
            r"disney[^a-z0-9]?plus|disney\+|dsnp|disney",
            r"hbo[^a-z0-9]?max|hmax|hbo[^a-z0-9]?go|hbo",
            r"apple[^a-z0-9]?tv\+|apple[^a-z0-9]?tv|atvp",
            r"hulu[^a-z0-9]?plus|hulu",
            r"crunchyroll",
            r"funimation",
            r"youtube",
            r"vimeo",
        ],
    )
});

pub static SPECIAL_VERSION: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::from_tokens(
        "version",
        &[
            r"extended[^a-z0-9](?:version|edition|cut)|extended",
            r"director'?s[^a-z0-9]?cut",
            r"unrated[^a-z0-9]version|unrated",
            r"remastered|remaster",
            r"final[^a-z0-9]cut",
            r"proper|repack",
            r"internal",
            r"hybrid",
            r"custom",
            r"fansub",
            r"[a-z]{3,6}logie",
            r"integrale|complete|complet",
        ],
    )
});

/// Markers that never belong to a title.
pub static TRASH: Lazy<PatternSet> =
    Lazy::new(|| PatternSet::from_tokens("trash", &[r"readnfo", r"subforced", r"nfofix"]));

/// Four-digit year in [1900, 2099].
pub static YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&token_pattern(r"(?:19|20)\d{2}")).expect("year pattern is valid")
});

/// Release-group tags anchored at the end (or, for fansubs, the start) of the stem.
///
/// Group names are bounded to 2-8 characters so that trailing words of a
/// plain title are not mistaken for a group.
pub static TEAM: Lazy<Vec<TeamRule>> = Lazy::new(|| {
    vec![
        TeamRule::new(r"-([a-z0-9]{2,8})$", TeamForm::DashSuffix),
        TeamRule::new(r"\[([a-z0-9]{2,8})\]$", TeamForm::Bracketed),
        TeamRule::new(r"\(([a-z0-9]{2,8})\)$", TeamForm::Bracketed),
        TeamRule::new(r"[ ._]([a-z0-9]{2,8})$", TeamForm::TrailingWord),
        TeamRule::new(r"^\[([a-z0-9][a-z0-9 ._-]{1,20})\]", TeamForm::Leading),
    ]
});

/// How a team tag is attached to the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamForm {
    /// `...x264-GROUP`
    DashSuffix,
    /// `...[GROUP]` or `...(GROUP)`
    Bracketed,
    /// `... GROUP`
    TrailingWord,
    /// `[Group] Title ...`
    Leading,
}

#[derive(Debug)]
pub struct TeamRule {
    pub regex: Regex,
    pub form: TeamForm,
}

impl TeamRule {
    fn new(pattern: &str, form: TeamForm) -> Self {
        Self {
            regex: Regex::new(pattern).expect("team pattern is valid"),
            form,
        }
    }
}

// ============================================================================
// Languages
// ============================================================================

/// Audio language tokens, one coherent table.
///
/// Two-letter codes that are also common title words ("de", "it", "no", "hi")
/// are deliberately absent; the three-letter and full-name forms cover them.
pub const LANGUAGE_TOKENS: &[(&str, &[&str])] = &[
    ("English", &["en", "eng", "english"]),
    (
        "French",
        &[
            "fr", "fre", "fra", "french", "truefrench", "vff", "vfi", "vfq", "vf2", "vf",
        ],
    ),
    ("Spanish", &["es", "spa", "esp", "spanish", "castellano"]),
    ("German", &["ger", "deu", "german", "deutsch"]),
    ("Italian", &["ita", "italian"]),
    ("Portuguese", &["pt", "por", "portuguese"]),
    ("Russian", &["ru", "rus", "russian"]),
    ("Japanese", &["ja", "jpn", "jap", "japanese"]),
    ("Chinese", &["zh", "chi", "zho", "chs", "cht", "chinese", "mandarin"]),
    ("Korean", &["ko", "kor", "korean"]),
    ("Arabic", &["ar", "ara", "arabic"]),
    ("Hindi", &["hin", "hindi"]),
    ("Norwegian", &["nor", "nob", "norwegian"]),
    ("Original", &["vo", "vost", "vostfr", "vosta"]),
];

/// One language and the recognizers that detect it.
#[derive(Debug)]
pub struct LanguageRule {
    pub name: &'static str,
    pub patterns: PatternSet,
}

pub static LANGUAGES: Lazy<Vec<LanguageRule>> = Lazy::new(|| {
    LANGUAGE_TOKENS
        .iter()
        .map(|&(name, tokens)| {
            let alternations: Vec<String> =
                tokens.iter().map(|t| regex_lite::escape(t)).collect();
            let refs: Vec<&str> = alternations.iter().map(String::as_str).collect();
            LanguageRule {
                name,
                patterns: PatternSet::from_tokens("language", &refs),
            }
        })
        .collect()
});

/// Display name for an ISO 639 code or language token (`fre` -> `French`).
pub fn language_for_code(code: &str) -> Option<&'static str> {
    let code = code.trim().to_lowercase();
    LANGUAGE_TOKENS
        .iter()
        .find(|(_, tokens)| tokens.iter().any(|t| *t == code))
        .map(|(name, _)| *name)
}

/// Regex for the multi-language marker: the configured label plus `multi`.
pub fn multi_marker(label: &str) -> Regex {
    let label = label.trim().to_lowercase();
    let alternation = if label.is_empty() || label == "multi" {
        "multi".to_string()
    } else {
        format!("{}|multi", regex_lite::escape(&label))
    };
    Regex::new(&token_pattern(&alternation)).expect("escaped multi marker is valid")
}

/// Subtitle tokens, matched by plain substring containment.
pub const SUBTITLE_TOKENS: &[(&str, &str)] = &[
    ("vostfr", "French"),
    ("subfr", "French"),
    ("suben", "English"),
    ("subit", "Italian"),
    ("subes", "Spanish"),
    ("subpt", "Portuguese"),
    ("subru", "Russian"),
    ("subja", "Japanese"),
    ("subzh", "Chinese"),
    ("subko", "Korean"),
    ("subar", "Arabic"),
    ("subhi", "Hindi"),
];

// ============================================================================
// Containers
// ============================================================================

/// Extensions stripped from a name before title cleaning.
pub const CONTAINER_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ts", "m2ts", "mts",
    "iso", "divx",
];

/// Extensions probed when analyzing a directory.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ts", "m2ts", "mts",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_pattern_respects_separators() {
        let re = Regex::new(&token_pattern("hd")).unwrap();
        assert!(re.is_match("movie.hd.mkv"));
        assert!(re.is_match("hd"));
        assert!(!re.is_match("movie.hdr.mkv"));
        assert!(!re.is_match("shd"));
    }

    #[test]
    fn test_resolution_priority_order() {
        // 1080p's rule sits before 720p's, whatever their order in the name.
        let m = RESOLUTION.first_match("show.720p.from.1080p.master").unwrap();
        assert_eq!(m.value, "1080P");
        assert_eq!(RESOLUTION.matching_rule("a.480p.2160p"), Some(0));
    }

    #[test]
    fn test_first_match_normalizes_uppercase() {
        let m = SOURCE.first_match("movie.2019.web-dl.x264").unwrap();
        assert_eq!(m.value, "WEB-DL");
        assert_eq!(m.start, 11);
        assert_eq!(m.end, 17);
    }

    #[test]
    fn test_source_web_is_lowest_priority() {
        assert_eq!(SOURCE.first_match("a.web.webrip").unwrap().value, "WEBRIP");
        assert_eq!(SOURCE.first_match("a.web.x264").unwrap().value, "WEB");
    }

    #[test]
    fn test_audio_codec_with_channels() {
        assert_eq!(
            AUDIO_CODEC.first_match("movie.ddp5.1.atmos.x265").unwrap().value,
            "DDP5.1"
        );
        assert_eq!(
            AUDIO_CODEC.first_match("movie.truehd.atmos.7.1").unwrap().value,
            "TRUEHD.ATMOS.7.1"
        );
        assert_eq!(AUDIO_CODEC.first_match("movie.aac.mkv").unwrap().value, "AAC");
    }

    #[test]
    fn test_hdr_prefers_specific_flavour() {
        assert_eq!(HDR.first_match("a.hdr.hdr10.dv").unwrap().value, "HDR10");
        assert_eq!(HDR.first_match("a.10bit.hdr").unwrap().value, "HDR");
    }

    #[test]
    fn test_spans_to_finds_compound_tokens() {
        let text = "movie.1080p.web-dl";
        assert!(SOURCE.spans_to(text, 16, text.len()));
        assert!(!SOURCE.spans_to(text, 12, text.len()));
        let audio = "movie.dts-hd";
        assert!(AUDIO_CODEC.spans_to(audio, 10, audio.len()));
        assert!(!VIDEO_CODEC.spans_to(audio, 10, audio.len()));
    }

    #[test]
    fn test_matches_whole() {
        assert!(VIDEO_CODEC.matches_whole("x264"));
        assert!(SOURCE.matches_whole("bluray"));
        assert!(!VIDEO_CODEC.matches_whole("x264team"));
        assert!(!SOURCE.matches_whole("ntb"));
    }

    #[test]
    fn test_year_all_matches_shares_separators() {
        let years = all_token_matches(&YEAR, "1917.2019.1080p");
        let values: Vec<&str> = years.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(values, vec!["1917", "2019"]);
        assert!(all_token_matches(&YEAR, "movie.2160p").is_empty());
    }

    #[test]
    fn test_language_for_code() {
        assert_eq!(language_for_code("fre"), Some("French"));
        assert_eq!(language_for_code("ENG"), Some("English"));
        assert_eq!(language_for_code("jpn"), Some("Japanese"));
        assert_eq!(language_for_code("xx"), None);
    }

    #[test]
    fn test_language_table_skips_ambiguous_words() {
        let german = LANGUAGES.iter().find(|l| l.name == "German").unwrap();
        assert!(german.patterns.first_match("le.seigneur.de.anneaux").is_none());
        assert!(german.patterns.first_match("film.german.dl").is_some());
    }

    #[test]
    fn test_multi_marker_uses_label() {
        let re = multi_marker("MULTi");
        assert!(re.is_match("film.multi.1080p"));
        let re = multi_marker("vf2-multi");
        assert!(re.is_match("film.vf2-multi.1080p"));
        assert!(!re.is_match("film.multiverse.1080p"));
    }

    #[test]
    fn test_tables_are_not_empty() {
        for set in [&*RESOLUTION, &*HDR, &*VIDEO_CODEC, &*AUDIO_CODEC, &*SOURCE] {
            assert!(!set.is_empty(), "{} has no rules", set.name());
        }
        assert_eq!(TEAM.len(), 5);
    }
}
