//! List pagination and filter-pattern helpers.

/// Page size used when a page number is requested without a limit.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Resolved paging for a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    /// `None` returns every matching row.
    pub limit: Option<i64>,
    pub offset: i64,
}

/// Resolve `?page=&limit=` into a window.
///
/// Without a limit and with page 1 (or no page) the whole result set is
/// returned. Asking for a later page without a limit uses
/// [`DEFAULT_PAGE_SIZE`].
pub fn resolve_page(page: Option<i64>, limit: Option<i64>) -> PageWindow {
    let page = page.unwrap_or(1).max(1);
    let limit = match limit.filter(|l| *l > 0) {
        Some(l) => Some(l.min(MAX_PAGE_SIZE)),
        None if page > 1 => Some(DEFAULT_PAGE_SIZE),
        None => None,
    };
    let offset = limit.map_or(0, |l| (page - 1).saturating_mul(l));
    PageWindow {
        page,
        limit,
        offset,
    }
}

/// Number of pages for `total` rows; 1 when unpaginated.
pub fn total_pages(total: i64, limit: Option<i64>) -> i64 {
    match limit {
        Some(l) if l > 0 => (total + l - 1) / l,
        _ => 1,
    }
}

/// Build a `%term%` LIKE pattern, escaping LIKE metacharacters in the term.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
