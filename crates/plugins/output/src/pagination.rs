//! Pagination for list-returning tools.
//!
//! Two strategies with separate parameter types and defaults:
//!
//! - **Server-side**: `page`/`perPage` are forwarded to the Buildkite API and the
//!   upstream `Link` header is handed back in a [`PaginatedResult`].
//! - **Client-side**: the whole collection is fetched, then sliced locally into a
//!   self-describing [`ClientPaginatedResult`].

use buildkite_core::ListOptions;
use serde::{Deserialize, Serialize};

/// Default page for both strategies.
pub const DEFAULT_PAGE: i64 = 1;

/// Server-side default page size. Kept at one item to bound response size.
pub const DEFAULT_SERVER_PER_PAGE: i64 = 1;

/// Client-side default page size.
pub const DEFAULT_CLIENT_PER_PAGE: usize = 25;

// =============================================================================
// Server-side
// =============================================================================

/// Page selection forwarded verbatim to the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerPaginationParams {
    pub page: i64,
    pub per_page: i64,
}

impl ServerPaginationParams {
    /// Derive params from optional request values.
    ///
    /// `page` is floored at 1. `per_page` is not range-checked here; the
    /// upstream API validates it.
    pub fn from_request(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            per_page: per_page.unwrap_or(DEFAULT_SERVER_PER_PAGE),
        }
    }
}

impl Default for ServerPaginationParams {
    fn default() -> Self {
        Self::from_request(None, None)
    }
}

impl From<ServerPaginationParams> for ListOptions {
    fn from(params: ServerPaginationParams) -> Self {
        ListOptions {
            page: params.page,
            per_page: params.per_page,
        }
    }
}

/// Upstream response headers carried back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkHeaders {
    #[serde(rename = "Link")]
    pub link: String,
}

/// A page of items exactly as returned upstream, plus the `Link` header for
/// cursor continuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub headers: LinkHeaders,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, link: impl Into<String>) -> Self {
        Self {
            items,
            headers: LinkHeaders { link: link.into() },
        }
    }
}

// =============================================================================
// Client-side
// =============================================================================

/// Page selection applied to an in-memory collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientPaginationParams {
    pub page: usize,
    pub per_page: usize,
}

impl ClientPaginationParams {
    /// Derive params from optional request values.
    ///
    /// Values below 1 are raised to 1 so the page math never divides by zero.
    pub fn from_request(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: clamp_positive(page, DEFAULT_PAGE as usize),
            per_page: clamp_positive(per_page, DEFAULT_CLIENT_PER_PAGE),
        }
    }
}

impl Default for ClientPaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE as usize,
            per_page: DEFAULT_CLIENT_PER_PAGE,
        }
    }
}

fn clamp_positive(value: Option<i64>, default: usize) -> usize {
    match value {
        None => default,
        Some(v) => usize::try_from(v.max(1)).unwrap_or(usize::MAX),
    }
}

/// A locally computed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPaginatedResult<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Slice `items` into the requested page.
///
/// A page past the end yields empty `items`, never an error. `total_pages` is at
/// least 1 even for an empty collection.
pub fn paginate<T>(items: Vec<T>, params: ClientPaginationParams) -> ClientPaginatedResult<T> {
    let ClientPaginationParams { page, per_page } = params;
    let page = page.max(1);
    let per_page = per_page.max(1);

    let total = items.len();
    let total_pages = total.div_ceil(per_page).max(1);
    let start = (page - 1).saturating_mul(per_page);

    let items: Vec<T> = if start >= total {
        Vec::new()
    } else {
        items.into_iter().skip(start).take(per_page).collect()
    };

    ClientPaginatedResult {
        items,
        page,
        per_page,
        total,
        total_pages,
        has_next: page < total_pages,
        has_prev: page > 1,
    }
}
