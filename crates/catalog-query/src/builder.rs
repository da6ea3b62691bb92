//! Translates raw, optional list parameters into a normalized filter, sort
//! order, and pagination window.
//!
//! Pure transformation: no I/O, no faults. Malformed numeric parameters
//! fall back to the defaults silently, matching permissive search UX.

use catalog_types::{
    Filter, Genre, ListParams, PriceRange, SortKey, Window, DEFAULT_PAGE_NUMBER,
    DEFAULT_PAGE_SIZE,
};

/// Normalized query plan for one list request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub filter: Filter,
    pub sort: SortKey,
    pub window: Window,
}

/// Build a query plan. `genre` arrives pre-validated by the caller; the
/// builder does not re-check enumeration membership.
pub fn build(params: &ListParams, genre: Option<Genre>) -> QueryPlan {
    let keywords = params
        .keywords
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let min = parse_price(params.min_price.as_deref());
    let max = parse_price(params.max_price.as_deref());
    let price = if min.is_none() && max.is_none() {
        None
    } else {
        Some(PriceRange { min, max })
    };

    let sort = match params.sort_by.as_deref().map(str::trim) {
        Some("price") => SortKey::Price,
        Some("year") => SortKey::Year,
        _ => SortKey::Author,
    };

    let page_number = parse_positive(params.page_number.as_deref(), DEFAULT_PAGE_NUMBER);
    let page_size = parse_positive(params.page_size.as_deref(), DEFAULT_PAGE_SIZE);

    QueryPlan {
        filter: Filter {
            keywords,
            genre,
            price,
        },
        sort,
        window: Window {
            // Saturate: extreme page parameters must degrade, never fault.
            skip: page_number.saturating_sub(1).saturating_mul(page_size),
            limit: page_size,
        },
    }
}

fn parse_price(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite())
}

fn parse_positive(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}
