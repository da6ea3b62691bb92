//! Query-plan types: filter, sort key, pagination window, result page.

use serde::{Deserialize, Serialize};

use crate::{Book, Genre};

pub const DEFAULT_PAGE_NUMBER: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Raw list-endpoint parameters as they arrive from the client.
/// Numeric fields stay textual so malformed values can fall back to the
/// defaults instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub min_price: Option<String>,
    #[serde(default)]
    pub max_price: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub page_size: Option<String>,
    #[serde(default)]
    pub page_number: Option<String>,
}

/// Price bounds; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        if let Some(min) = self.min {
            if price < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if price > max {
                return false;
            }
        }
        true
    }
}

/// Structural predicate over book fields. Each clause is present only when
/// its source parameter was supplied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    /// Free-text clause over title/description/author.
    pub keywords: Option<String>,
    pub genre: Option<Genre>,
    pub price: Option<PriceRange>,
}

impl Filter {
    /// Reference matching semantics, used by the in-memory store. The
    /// keyword clause is a case-insensitive substring match over the
    /// indexed text fields.
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(ref keywords) = self.keywords {
            let needle = keywords.to_lowercase();
            let hit = book.title.to_lowercase().contains(&needle)
                || book.description.to_lowercase().contains(&needle)
                || book.author.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        if let Some(genre) = self.genre {
            if book.genre != genre {
                return false;
            }
        }
        if let Some(ref range) = self.price {
            if !range.contains(book.price) {
                return false;
            }
        }
        true
    }
}

/// Sort order for the match set. All keys sort ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Author,
    Price,
    Year,
}

impl SortKey {
    /// Total order over books: sort field first, id as tiebreak so that
    /// pagination windows are stable across calls.
    pub fn compare(self, a: &Book, b: &Book) -> std::cmp::Ordering {
        let primary = match self {
            SortKey::Author => a.author.cmp(&b.author),
            SortKey::Price => a
                .price
                .partial_cmp(&b.price)
                .unwrap_or(std::cmp::Ordering::Equal),
            SortKey::Year => a.publication_year.cmp(&b.publication_year),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Contiguous slice of the sorted match set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: u64,
}

/// One page of results plus the unwindowed match count.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub books: Vec<Book>,
    #[serde(rename = "totalCount")]
    pub total_count: u64,
}
