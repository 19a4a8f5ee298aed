//! Post field parsing, validation, and derived values.
//!
//! Requests arrive either as multipart forms (every value a string) or as JSON
//! (numbers, booleans, and arrays mixed in). Both are normalized into
//! [`PostFieldsInput`] before anything here runs, so validation only ever
//! sees one shape.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::CoreError;
use crate::slug::is_valid_slug;
use crate::types::DbId;

/// Number of characters of stripped content kept in a derived excerpt.
pub const EXCERPT_CHARS: usize = 200;

/// Appended to every derived excerpt.
pub const EXCERPT_ELLIPSIS: &str = "...";

/// Stored tag lists are a single comma-delimited string.
pub const TAG_DELIMITER: char = ',';

pub const MSG_TITLE_REQUIRED: &str = "Title is required and cannot be empty";
pub const MSG_CONTENT_REQUIRED: &str = "Content is required and cannot be empty";
pub const MSG_CATEGORY_REQUIRED: &str = "Valid category is required";

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Editorial status of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub const ALL: [PostStatus; 3] = [PostStatus::Draft, PostStatus::Published, PostStatus::Archived];

    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PostStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| CoreError::invalid(invalid_status_message(s)))
    }
}

fn invalid_status_message(s: &str) -> String {
    format!("Invalid status '{s}'. Valid statuses: draft, published, archived")
}

// ---------------------------------------------------------------------------
// Loose scalar deserialization
// ---------------------------------------------------------------------------

/// Render any JSON scalar as text. Arrays are joined with the tag delimiter so
/// `"tags": ["a", "b"]` and `"tags": "a,b"` land in the same place.
fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(value_to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

/// Accept strings, numbers, booleans, or arrays and keep them as text.
pub fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_string))
}

/// Like [`loose_string`], but trims and maps blank values to `None`.
pub fn loose_trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_string(deserializer)?.and_then(non_blank))
}

/// Trim a value, dropping it entirely if nothing is left.
pub fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_string())
    }
}

/// Interpret a form or query flag. `1`, `true`, `on` and `yes` are true;
/// anything else, including an empty string, is false.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Parse a positive numeric category id.
pub fn parse_category_id(raw: Option<&str>) -> Option<DbId> {
    raw.and_then(|s| s.trim().parse::<DbId>().ok())
        .filter(|id| *id > 0)
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Editorial fields of a create or update request, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFieldsInput {
    #[serde(default, deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub meta_title: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub meta_description: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub is_featured: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub status: Option<String>,
    /// Only honoured on update; creation always derives the slug from the title.
    #[serde(default, deserialize_with = "loose_trimmed")]
    pub slug: Option<String>,
    /// `None` leaves stored related books untouched; `Some(vec![])` clears them.
    #[serde(default)]
    pub related_books: Option<Vec<RelatedBookInput>>,
}

/// One entry of a `related_books` payload.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RelatedBookInput {
    #[serde(default, deserialize_with = "loose_trimmed")]
    #[validate(required(message = "title is required"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "loose_trimmed")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "loose_trimmed")]
    #[validate(required(message = "purchase_link is required"))]
    pub purchase_link: Option<String>,
    #[serde(default, deserialize_with = "loose_trimmed")]
    pub cover_image: Option<String>,
    #[serde(default, deserialize_with = "loose_trimmed")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "loose_trimmed")]
    pub price: Option<String>,
}

impl RelatedBookInput {
    /// Reason this entry cannot be stored, if any.
    pub fn rejection(&self) -> Option<String> {
        self.validate().err().map(|errors| {
            let mut messages: Vec<String> = errors
                .field_errors()
                .into_values()
                .flat_map(|errs| errs.iter())
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            messages.sort();
            messages.join(", ")
        })
    }
}

/// Parse the JSON-encoded `related_books` form field.
pub fn parse_related_books(raw: &str) -> Result<Vec<RelatedBookInput>, CoreError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
        .map_err(|e| CoreError::invalid(format!("related_books must be a JSON array: {e}")))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Post fields after validation, trimmed and typed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPost {
    pub title: String,
    /// Stored exactly as submitted.
    pub content: String,
    pub category_id: DbId,
    pub excerpt: Option<String>,
    /// Normalized delimited form, `None` when the field was absent.
    pub tags: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub is_featured: bool,
    pub status: PostStatus,
    pub slug: Option<String>,
}

/// Validate the editorial fields shared by create and update.
///
/// Title, content and category are always required. Every violation is
/// collected before returning so the caller can fix the whole request at
/// once. `category_known` reports whether the parsed category id exists.
pub fn validate_post_fields(
    input: &PostFieldsInput,
    category_known: bool,
) -> Result<ValidatedPost, CoreError> {
    let mut errors = Vec::new();

    let title = input.title.clone().and_then(non_blank);
    if title.is_none() {
        errors.push(MSG_TITLE_REQUIRED.to_string());
    }

    let content = input
        .content
        .clone()
        .filter(|c| !c.trim().is_empty());
    if content.is_none() {
        errors.push(MSG_CONTENT_REQUIRED.to_string());
    }

    let category_id = parse_category_id(input.category_id.as_deref()).filter(|_| category_known);
    if category_id.is_none() {
        errors.push(MSG_CATEGORY_REQUIRED.to_string());
    }

    let status = match input.status.as_deref().map(str::trim) {
        None | Some("") => Some(PostStatus::default()),
        Some(raw) => match raw.parse::<PostStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                errors.push(invalid_status_message(raw));
                None
            }
        },
    };

    if let Some(slug) = input.slug.as_deref() {
        if !is_valid_slug(slug) {
            errors.push(
                "Slug must contain only lowercase letters, digits and inner hyphens".to_string(),
            );
        }
    }

    match (title, content, category_id, status) {
        (Some(title), Some(content), Some(category_id), Some(status)) if errors.is_empty() => {
            Ok(ValidatedPost {
                title,
                content,
                category_id,
                excerpt: input.excerpt.as_deref().map(|e| e.trim().to_string()),
                tags: input.tags.as_deref().map(normalize_tags),
                meta_title: input.meta_title.as_deref().map(|m| m.trim().to_string()),
                meta_description: input
                    .meta_description
                    .as_deref()
                    .map(|m| m.trim().to_string()),
                is_featured: input.is_featured.as_deref().is_some_and(parse_flag),
                status,
                slug: input.slug.clone(),
            })
        }
        _ => Err(CoreError::Validation(errors)),
    }
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// Remove HTML tags, leaving text content in place.
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

/// Excerpt derived from content: the first 200 characters of the text with
/// tags removed, followed by an ellipsis.
pub fn derive_excerpt(content: &str) -> String {
    let text = strip_tags(content);
    let mut excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
    excerpt.push_str(EXCERPT_ELLIPSIS);
    excerpt
}

/// Normalize a delimited tag string: entries trimmed, empties dropped.
pub fn normalize_tags(raw: &str) -> String {
    split_tags(raw).join(",")
}

/// Split a stored tag string into its ordered entries.
pub fn split_tags(stored: &str) -> Vec<String> {
    stored
        .split(TAG_DELIMITER)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Write outcomes
// ---------------------------------------------------------------------------

/// Which non-fatal step of a write went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialFailureKind {
    /// A related-book entry was missing a required field and was not stored.
    RelatedBookSkipped,
    /// A related-book cover upload was rejected; the entry was stored without it.
    CoverUploadFailed,
    /// Replacing the related-book set failed after the post itself was saved.
    RelatedBooksNotSaved,
}

/// A warning attached to an otherwise successful create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialFailure {
    pub kind: PartialFailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub message: String,
}

impl PartialFailure {
    pub fn new(kind: PartialFailureKind, index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            index,
            message: message.into(),
        }
    }
}

/// Result of a successful create or update.
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    pub id: DbId,
    pub slug: String,
    pub warnings: Vec<PartialFailure>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn valid_input() -> PostFieldsInput {
        PostFieldsInput {
            title: Some("  My Post  ".into()),
            content: Some("<p>Body</p>".into()),
            category_id: Some("3".into()),
            ..Default::default()
        }
    }

    // -- validate_post_fields -------------------------------------------------

    #[test]
    fn validation_trims_title_and_applies_defaults() {
        let post = validate_post_fields(&valid_input(), true).unwrap();
        assert_eq!(post.title, "My Post");
        assert_eq!(post.category_id, 3);
        assert_eq!(post.status, PostStatus::Draft);
        assert!(!post.is_featured);
        assert_eq!(post.tags, None);
    }

    #[test]
    fn validation_reports_every_violation() {
        let input = PostFieldsInput {
            title: Some("   ".into()),
            content: Some("".into()),
            category_id: Some("books".into()),
            ..Default::default()
        };
        let err = validate_post_fields(&input, false).unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) => {
            assert_eq!(errors, vec![
                MSG_TITLE_REQUIRED.to_string(),
                MSG_CONTENT_REQUIRED.to_string(),
                MSG_CATEGORY_REQUIRED.to_string(),
            ]);
        });
    }

    #[test]
    fn validation_rejects_unknown_category() {
        let err = validate_post_fields(&valid_input(), false).unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) if errors == vec![MSG_CATEGORY_REQUIRED.to_string()]);
    }

    #[test]
    fn validation_rejects_unknown_status() {
        let input = PostFieldsInput {
            status: Some("live".into()),
            ..valid_input()
        };
        assert_matches!(
            validate_post_fields(&input, true),
            Err(CoreError::Validation(errors)) if errors.len() == 1 && errors[0].contains("live")
        );
    }

    #[test]
    fn validation_rejects_malformed_slug() {
        let input = PostFieldsInput {
            slug: Some("Not A Slug".into()),
            ..valid_input()
        };
        assert_matches!(validate_post_fields(&input, true), Err(CoreError::Validation(_)));
    }

    #[test]
    fn validation_normalizes_tags_and_flag() {
        let input = PostFieldsInput {
            tags: Some(" rust, ,web ,".into()),
            is_featured: Some("true".into()),
            status: Some("published".into()),
            ..valid_input()
        };
        let post = validate_post_fields(&input, true).unwrap();
        assert_eq!(post.tags.as_deref(), Some("rust,web"));
        assert!(post.is_featured);
        assert_eq!(post.status, PostStatus::Published);
    }

    // -- excerpt ---------------------------------------------------------------

    #[test]
    fn excerpt_takes_first_200_stripped_characters() {
        let content = format!("<p>{}</p>", "A".repeat(500));
        let excerpt = derive_excerpt(&content);
        assert_eq!(excerpt, format!("{}...", "A".repeat(200)));
    }

    #[test]
    fn excerpt_of_short_content_still_gets_ellipsis() {
        assert_eq!(derive_excerpt("<h1>Hi</h1> <em>there</em>"), "Hi there...");
    }

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        let content = "é".repeat(300);
        assert_eq!(derive_excerpt(&content).chars().count(), 203);
    }

    // -- tags --------------------------------------------------------------------

    #[test]
    fn split_empty_tags_yields_nothing() {
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn split_preserves_order() {
        assert_eq!(split_tags("b,a,c"), vec!["b", "a", "c"]);
    }

    // -- loose deserialization ---------------------------------------------------

    #[test]
    fn json_input_accepts_numbers_bools_and_arrays() {
        let input: PostFieldsInput = serde_json::from_value(serde_json::json!({
            "title": "T",
            "content": "C",
            "category_id": 7,
            "is_featured": true,
            "tags": ["rust", "axum"],
        }))
        .unwrap();
        assert_eq!(input.category_id.as_deref(), Some("7"));
        assert_eq!(input.is_featured.as_deref(), Some("true"));
        assert_eq!(input.tags.as_deref(), Some("rust,axum"));
        assert!(input.related_books.is_none());
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    // -- related books -------------------------------------------------------------

    #[test]
    fn related_book_without_purchase_link_is_rejected() {
        let books = parse_related_books(
            r#"[{"title": "Dune", "purchase_link": "https://shop/dune"}, {"title": "Emma", "purchase_link": "  "}]"#,
        )
        .unwrap();
        assert_eq!(books.len(), 2);
        assert!(books[0].rejection().is_none());
        assert_eq!(books[1].rejection().as_deref(), Some("purchase_link is required"));
    }

    #[test]
    fn related_books_must_be_an_array() {
        assert_matches!(parse_related_books("{\"title\": 1}"), Err(CoreError::Validation(_)));
        assert!(parse_related_books("").unwrap().is_empty());
    }
}
