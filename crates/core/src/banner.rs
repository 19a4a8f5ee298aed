//! Hero banner rules.

use serde::Deserialize;

use crate::error::CoreError;
use crate::post::{loose_string, loose_trimmed, parse_flag};
use crate::types::DbId;

/// The homepage carousel shows at most this many active banners.
pub const MAX_ACTIVE_BANNERS: i64 = 4;

/// Banner fields as submitted, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BannerFieldsInput {
    #[serde(default, deserialize_with = "loose_trimmed")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub subtitle: Option<String>,
    /// Also accepted as `blog_id`.
    #[serde(default, alias = "blog_id", deserialize_with = "loose_trimmed")]
    pub post_id: Option<String>,
    #[serde(default, deserialize_with = "loose_trimmed")]
    pub link_url: Option<String>,
    #[serde(default, deserialize_with = "loose_trimmed")]
    pub sort_order: Option<String>,
    #[serde(default, deserialize_with = "loose_trimmed")]
    pub is_active: Option<String>,
}

/// Validated banner fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBanner {
    pub title: String,
    pub subtitle: Option<String>,
    pub post_id: Option<DbId>,
    pub link_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Validate banner fields, collecting every violation.
pub fn validate_banner_fields(input: &BannerFieldsInput) -> Result<ValidatedBanner, CoreError> {
    let mut errors = Vec::new();

    if input.title.is_none() {
        errors.push("Title is required and cannot be empty".to_string());
    }

    let post_id = match input.post_id.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<DbId>() {
            Ok(id) if id > 0 => Some(id),
            _ => {
                errors.push(format!("Invalid post id '{raw}'"));
                None
            }
        },
    };

    let sort_order = match input.sort_order.as_deref() {
        None => 0,
        Some(raw) => raw.parse::<i32>().unwrap_or_else(|_| {
            errors.push(format!("Sort order must be an integer, got '{raw}'"));
            0
        }),
    };

    match &input.title {
        Some(title) if errors.is_empty() => Ok(ValidatedBanner {
            title: title.clone(),
            subtitle: input
                .subtitle
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            post_id,
            link_url: input.link_url.clone(),
            sort_order,
            is_active: input.is_active.as_deref().map_or(true, parse_flag),
        }),
        _ => Err(CoreError::Validation(errors)),
    }
}

/// Reject activating a banner when the active limit is already reached.
///
/// `other_active` counts active banners excluding the one being written.
pub fn check_active_limit(is_active: bool, other_active: i64) -> Result<(), CoreError> {
    if is_active && other_active >= MAX_ACTIVE_BANNERS {
        return Err(CoreError::Conflict(format!(
            "At most {MAX_ACTIVE_BANNERS} banners can be active. Deactivate one first."
        )));
    }
    Ok(())
}
