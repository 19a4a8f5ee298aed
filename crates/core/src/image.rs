//! Image reference normalization.
//!
//! The only images the site will display are those under the managed upload
//! root. Stored references are always root-relative (`/uploads/...`) and get
//! the public base URL prepended at the moment they are served, so moving the
//! site to another host needs no data migration.

use url::Url;

/// URL path prefix of the managed upload namespace.
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

/// Reduce an image reference to the root-relative form that may be stored.
///
/// - blank values become `None`;
/// - absolute or protocol-relative URLs are kept only when their path is
///   under `/uploads/`, in which case only that path is kept;
/// - anything else is treated as a path on this site and made root-relative.
pub fn managed_path(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.starts_with("//") {
        return None;
    }

    if let Ok(url) = Url::parse(raw) {
        let path = url.path();
        return path
            .starts_with(UPLOAD_URL_PREFIX)
            .then(|| path.to_string());
    }

    if raw.starts_with('/') {
        Some(raw.to_string())
    } else {
        Some(format!("/{raw}"))
    }
}

/// Whether a reference names an external location the site does not control.
pub fn is_untrusted(raw: &str) -> bool {
    !raw.trim().is_empty() && managed_path(raw).is_none()
}

/// Join the public base URL with a root-relative path.
pub fn public_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Turn a stored reference into the URL handed to clients, or `None` if there
/// is nothing safe to show.
pub fn resolve_public_image(base: &str, stored: Option<&str>) -> Option<String> {
    stored
        .and_then(managed_path)
        .map(|path| public_url(base, &path))
}
