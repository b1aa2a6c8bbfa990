//! Page arithmetic for list endpoints

use serde::Serialize;

/// Page size used when the caller does not supply a valid one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: u32,
    pub page_size: u32,
    /// Items before this page: `(page - 1) * page_size`.
    pub offset: u64,
}

/// Page metadata returned alongside list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationResponse {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl PaginationParams {
    /// Clamp `page` to at least 1 and `page_size` to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        Self {
            page,
            page_size,
            offset: u64::from(page - 1) * u64::from(page_size),
        }
    }

    /// Build from raw query-string values.
    ///
    /// Missing, unparseable, or non-positive values fall back to page 1
    /// and [`DEFAULT_PAGE_SIZE`]; oversized page sizes clamp to
    /// [`MAX_PAGE_SIZE`].
    #[must_use]
    pub fn from_query(page: Option<&str>, page_size: Option<&str>) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let page_size = parse_positive(page_size).unwrap_or(DEFAULT_PAGE_SIZE);
        Self::new(page, page_size)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    // Past u32::MAX saturates.
    let value: i64 = raw?.trim().parse().ok()?;
    (value > 0).then(|| u32::try_from(value).unwrap_or(u32::MAX))
}

/// Page metadata for `total_items` under `params`.
///
/// `total_pages` is the ceiling of `total_items / page_size` and never
/// less than 1, so an empty listing still reports one page.
#[must_use]
pub fn create_response(params: PaginationParams, total_items: u64) -> PaginationResponse {
    let page_size = u64::from(params.page_size.max(1));
    let total_pages = total_items.div_ceil(page_size).max(1);

    PaginationResponse {
        page: params.page,
        page_size: params.page_size,
        total_items,
        total_pages,
        has_more: u64::from(params.page) < total_pages,
    }
}
