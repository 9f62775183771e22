//! Display-title reconstruction.
//!
//! The title is whatever precedes the first recognized noise token; it is not
//! rebuilt by removing tokens from the whole name.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::patterns::CONTAINER_EXTENSIONS;

static LEADING_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[[^\]]*\][ ._-]*").expect("leading group pattern is valid"));

const SEPARATORS: &[char] = &['.', '_', '-', '[', ']', '(', ')'];

/// Strip a known container extension, keeping the name if nothing would remain.
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if CONTAINER_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
                && stem.chars().any(char::is_alphanumeric) =>
        {
            stem
        }
        _ => name,
    }
}

/// Byte offset where the title starts once a leading `[Group]` tag is skipped.
pub fn leading_group_end(stem: &str) -> usize {
    match LEADING_GROUP.find(stem) {
        Some(m) if stem[m.end()..].chars().any(char::is_alphanumeric) => m.end(),
        _ => 0,
    }
}

/// Number of separator-delimited segments.
pub fn segment_count(text: &str) -> usize {
    text.split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .filter(|s| !s.is_empty())
        .count()
}

/// Build the display title from a stem.
///
/// `noise` holds byte offsets (into `stem`) of recognized tokens. Offsets before
/// `title_start`, past the end of the stem, or that would leave no title are ignored.
/// Names with fewer than `min_segments` segments are not truncated.
pub fn clean_title(stem: &str, title_start: usize, noise: &[usize], min_segments: usize) -> String {
    let body = &stem[title_start..];
    if segment_count(body) < min_segments {
        return title_case(&collapse_separators(body));
    }

    let cut = noise
        .iter()
        .copied()
        .filter(|&pos| pos > title_start && pos < stem.len())
        .filter(|&pos| stem[title_start..pos].chars().any(char::is_alphanumeric))
        .min()
        .unwrap_or(stem.len());

    title_case(&collapse_separators(&stem[title_start..cut]))
}

/// Turn separator characters into single spaces and trim.
pub fn collapse_separators(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Capitalize the first letter of every word and lower-case the rest.
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
