//! Post slug derivation and collision suffixing.

/// Slug used when a title contains no ASCII alphanumerics at all.
pub const FALLBACK_SLUG: &str = "post";

/// How many candidates the repository tries before giving up on a title.
pub const MAX_SLUG_ATTEMPTS: u32 = 5;

/// Generate a URL-safe slug from a post title.
///
/// Lowercases, turns every run of non-alphanumeric characters into a single
/// hyphen, and trims hyphens from both ends.
pub fn generate_slug(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut prev_hyphen = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }

    let trimmed = result.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// The slug to try on a given attempt.
///
/// Attempt 0 is the bare slug, attempt 1 appends `-<unix-timestamp>`, and
/// later attempts append a counter after the timestamp so writers racing
/// within the same second still converge on distinct values.
pub fn slug_candidate(base: &str, timestamp: i64, attempt: u32) -> String {
    match attempt {
        0 => base.to_string(),
        1 => format!("{base}-{timestamp}"),
        n => format!("{base}-{timestamp}-{n}"),
    }
}

/// Check that an explicitly supplied slug is already URL-safe.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
