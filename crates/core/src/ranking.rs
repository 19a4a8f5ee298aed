//! Related-content relevance rules.
//!
//! A sibling post scores [`CATEGORY_MATCH_WEIGHT`] for sharing the category
//! and [`TAG_MATCH_WEIGHT`] if any of the source post's tags appears in its
//! tag string. The tag contribution is capped: matching three tags scores the
//! same as matching one. The repository evaluates the same rules in SQL and
//! binds these weights, so the two cannot drift apart.

use crate::post::TAG_DELIMITER;

pub const CATEGORY_MATCH_WEIGHT: i32 = 2;
pub const TAG_MATCH_WEIGHT: i32 = 1;

/// Number of related posts returned with a single post.
pub const DEFAULT_RELATED_LIMIT: i64 = 6;

/// Tag terms used for matching: comma-split, trimmed, blanks dropped.
///
/// Blank terms would match every candidate as a substring, so they never
/// take part in ranking.
pub fn tag_terms(tags_csv: &str) -> Vec<String> {
    tags_csv
        .split(TAG_DELIMITER)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether any term occurs in a candidate's stored tag string (case-sensitive).
pub fn tags_overlap(candidate_tags: &str, terms: &[String]) -> bool {
    terms.iter().any(|term| candidate_tags.contains(term.as_str()))
}

/// Relevance score for one candidate.
pub fn relevance_score(category_match: bool, tag_match: bool) -> i32 {
    let mut score = 0;
    if category_match {
        score += CATEGORY_MATCH_WEIGHT;
    }
    if tag_match {
        score += TAG_MATCH_WEIGHT;
    }
    score
}
