//! Candidate scoring.
//!
//! Title agreement dominates, the year is a tie-breaker, and a large length
//! difference drags a candidate down. Movie and TV hits are scored the same
//! way through [`CandidateTitles`].

use strsim::normalized_levenshtein;

use crate::external_catalog::{TmdbMovie, TmdbSeries};

/// A score at or above this ends the candidate scan.
pub const CERTAIN_SCORE: f64 = 100.0;

const EXACT_TITLE: f64 = 100.0;
const EXACT_ORIGINAL: f64 = 90.0;
const QUERY_IN_TITLE: f64 = 70.0;
const QUERY_IN_ORIGINAL: f64 = 60.0;
const TITLE_IN_QUERY: f64 = 50.0;
const ORIGINAL_IN_QUERY: f64 = 40.0;
const SIMILARITY_WEIGHT: f64 = 30.0;
const YEAR_EXACT: f64 = 20.0;
const YEAR_CLOSE: f64 = 10.0;
const YEAR_TOLERANCE: u32 = 2;
const LENGTH_SLACK: usize = 10;

/// The parts of a search hit that scoring looks at.
#[derive(Debug, Clone, Copy)]
pub struct CandidateTitles<'a> {
    pub title: &'a str,
    pub original_title: Option<&'a str>,
    pub year: Option<u32>,
}

impl<'a> From<&'a TmdbMovie> for CandidateTitles<'a> {
    fn from(movie: &'a TmdbMovie) -> Self {
        Self {
            title: &movie.title,
            original_title: movie.original_title.as_deref(),
            year: movie.year(),
        }
    }
}

impl<'a> From<&'a TmdbSeries> for CandidateTitles<'a> {
    fn from(series: &'a TmdbSeries) -> Self {
        Self {
            title: &series.name,
            original_title: series.original_name.as_deref(),
            year: series.year(),
        }
    }
}

/// Score one candidate against the query title and year.
pub fn score_candidate(query: &str, query_year: Option<u32>, candidate: CandidateTitles<'_>) -> f64 {
    let query = query.trim().to_lowercase();
    let title = candidate.title.trim().to_lowercase();
    let original = candidate
        .original_title
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());

    let mut score = if query == title {
        EXACT_TITLE
    } else if original.as_deref() == Some(query.as_str()) {
        EXACT_ORIGINAL
    } else if !title.is_empty() && title.contains(&query) {
        QUERY_IN_TITLE
    } else if original.as_deref().is_some_and(|o| o.contains(&query)) {
        QUERY_IN_ORIGINAL
    } else if !title.is_empty() && query.contains(&title) {
        TITLE_IN_QUERY
    } else if original.as_deref().is_some_and(|o| query.contains(o)) {
        ORIGINAL_IN_QUERY
    } else {
        let best = original
            .as_deref()
            .map(|o| normalized_levenshtein(&query, o))
            .unwrap_or(0.0)
            .max(normalized_levenshtein(&query, &title));
        best * SIMILARITY_WEIGHT
    };

    if let (Some(wanted), Some(actual)) = (query_year, candidate.year) {
        if wanted == actual {
            score += YEAR_EXACT;
        } else if wanted.abs_diff(actual) <= YEAR_TOLERANCE {
            score += YEAR_CLOSE;
        }
    }

    let length_diff = query.chars().count().abs_diff(title.chars().count());
    if length_diff > LENGTH_SLACK {
        score -= length_diff as f64;
    }

    score
}

/// Index and score of the best candidate.
///
/// Ties keep the first candidate seen; a certain score stops the scan.
pub fn select_best<'a, T: 'a, I>(query: &str, year: Option<u32>, candidates: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'a T>,
    &'a T: Into<CandidateTitles<'a>>,
{
    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in candidates.into_iter().enumerate() {
        let score = score_candidate(query, year, candidate.into());
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
        if score >= CERTAIN_SCORE {
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate<'a>(title: &'a str, original: Option<&'a str>, year: Option<u32>) -> CandidateTitles<'a> {
        CandidateTitles {
            title,
            original_title: original,
            year,
        }
    }

    #[test]
    fn test_exact_title_with_year() {
        let score = score_candidate("The Matrix", Some(1999), candidate("The Matrix", None, Some(1999)));
        assert_eq!(score, 120.0);
    }

    #[test]
    fn test_exact_title_is_case_insensitive() {
        assert_eq!(score_candidate("andor", None, candidate("Andor", None, None)), 100.0);
    }

    #[test]
    fn test_exact_original_title() {
        let score = score_candidate(
            "la casa de papel",
            None,
            candidate("Money Heist", Some("La casa de papel"), None),
        );
        assert_eq!(score, 90.0);
    }

    #[test]
    fn test_substring_tiers() {
        // query inside the title
        assert_eq!(score_candidate("Dune", None, candidate("Dune Part Two", None, None)), 70.0);
        // query inside the original title
        assert_eq!(
            score_candidate("Amelie", None, candidate("Amelie", Some("Le Fabuleux Destin d'Amelie"), None)),
            100.0
        );
        assert_eq!(
            score_candidate("Destin", None, candidate("Amelie", Some("Le Destin"), None)),
            60.0
        );
        // title inside the query
        assert_eq!(score_candidate("Alien Director", None, candidate("Alien", None, None)), 50.0);
        // original inside the query
        assert_eq!(score_candidate("Leon Version", None, candidate("The Professional", Some("Leon"), None)), 40.0);
    }

    #[test]
    fn test_similarity_fallback() {
        let score = score_candidate("Matrx", None, candidate("Matrix", None, None));
        assert!(score > 20.0 && score < 30.0, "score was {}", score);
    }

    #[test]
    fn test_year_bonus_tiers() {
        let exact = score_candidate("Dune", Some(2021), candidate("Dune", None, Some(2021)));
        let close = score_candidate("Dune", Some(2021), candidate("Dune", None, Some(2019)));
        let far = score_candidate("Dune", Some(2021), candidate("Dune", None, Some(1984)));
        assert_eq!(exact, 120.0);
        assert_eq!(close, 110.0);
        assert_eq!(far, 100.0);
        // Year missing on one side: no bonus
        assert_eq!(score_candidate("Dune", None, candidate("Dune", None, Some(2021))), 100.0);
    }

    #[test]
    fn test_length_penalty() {
        // "it" is in the title, which is 27 characters longer
        let score = score_candidate("It", None, candidate("It Chapter Two Extended Story", None, None));
        assert_eq!(score, 70.0 - 27.0);
    }

    #[test]
    fn test_empty_original_title_ignored() {
        let score = score_candidate("xyz", None, candidate("Totally Different", Some(""), None));
        assert!(score < 30.0);
    }

    #[test]
    fn test_select_best_tie_keeps_first() {
        let movies = [
            crate::testing::fixtures::movie(1, "Dune Messiah", "2030-01-01"),
            crate::testing::fixtures::movie(2, "Dune World", "2031-01-01"),
        ];
        let (index, score) = select_best("Dune", None, movies.iter()).unwrap();
        assert_eq!(index, 0);
        assert_eq!(score, 70.0);
    }

    #[test]
    fn test_select_best_order_independent() {
        use crate::testing::fixtures::movie;
        let a = movie(10, "Heat Wave", "2010-01-01");
        let b = movie(11, "Heat", "1995-12-15");
        let c = movie(12, "The Heat", "2013-06-28");

        let forward = [a.clone(), b.clone(), c.clone()];
        let backward = [c, b, a];
        let (fi, _) = select_best("Heat", Some(1995), forward.iter()).unwrap();
        let (bi, _) = select_best("Heat", Some(1995), backward.iter()).unwrap();
        assert_eq!(forward[fi].id, 11);
        assert_eq!(backward[bi].id, 11);
    }

    #[test]
    fn test_select_best_empty() {
        let none: [TmdbMovie; 0] = [];
        assert!(select_best("Anything", None, none.iter()).is_none());
    }
}
