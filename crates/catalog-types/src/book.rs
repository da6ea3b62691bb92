//! Book records, field patches, and structural validation.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::CatalogError;

/// Name of the document collection holding book records.
pub const BOOK_COLLECTION: &str = "Book";

/// Accepted publication-year range.
pub const MIN_PUBLICATION_YEAR: i32 = 1900;
pub const MAX_PUBLICATION_YEAR: i32 = 2100;

/// Minimum length of an ISBN string (hyphenated ISBN-13).
pub const MIN_ISBN_LEN: usize = 14;

/// Validated book identifier (UUID, assigned at creation).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    /// Assign a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a caller-supplied identifier. A malformed identifier fails
    /// fast, before any store interaction is attempted.
    pub fn parse(s: &str) -> Result<Self, CatalogError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CatalogError::InvalidIdentifier(s.to_string()))
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Closed genre enumeration. Serialized names match the legacy catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Fiction,
    #[serde(rename = "Magical Realism")]
    MagicalRealism,
    Dystopian,
    Mystery,
    #[serde(rename = "Young Adult")]
    YoungAdult,
    #[serde(rename = "Non-Fiction")]
    NonFiction,
}

impl Genre {
    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Fiction => "Fiction",
            Genre::MagicalRealism => "Magical Realism",
            Genre::Dystopian => "Dystopian",
            Genre::Mystery => "Mystery",
            Genre::YoungAdult => "Young Adult",
            Genre::NonFiction => "Non-Fiction",
        }
    }

    /// Parse from a query-string or stored value (case-insensitive,
    /// separators ignored).
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-', '_'], "");
        match normalized.as_str() {
            "fiction" => Some(Genre::Fiction),
            "magicalrealism" => Some(Genre::MagicalRealism),
            "dystopian" => Some(Genre::Dystopian),
            "mystery" => Some(Genre::Mystery),
            "youngadult" => Some(Genre::YoungAdult),
            "nonfiction" => Some(Genre::NonFiction),
            _ => None,
        }
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque image payload attached to a record. Encoding is the client's
/// concern; the catalog carries the bytes as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAttachment {
    #[serde(default)]
    pub data: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub publication_year: i32,
    pub price: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAttachment>,
}

/// Create-request body: a book without an identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub genre: Genre,
    #[serde(deserialize_with = "de_year")]
    pub publication_year: i32,
    #[serde(deserialize_with = "de_price")]
    pub price: f64,
    pub description: String,
    #[serde(default)]
    pub image: Option<ImageAttachment>,
}

impl NewBook {
    /// Check the structural invariants before the record reaches the store.
    pub fn validate(&self) -> Result<(), CatalogError> {
        validate_isbn(&self.isbn)?;
        validate_text("title", &self.title)?;
        validate_text("author", &self.author)?;
        validate_text("description", &self.description)?;
        validate_year(self.publication_year)?;
        validate_price(self.price)?;
        Ok(())
    }

    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            isbn: self.isbn,
            title: self.title,
            author: self.author,
            genre: self.genre,
            publication_year: self.publication_year,
            price: self.price,
            description: self.description,
            image: self.image,
        }
    }
}

/// Partial update: only supplied fields are changed. Numeric fields accept
/// a JSON number or a numeric string and are coerced before persistence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookPatch {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<Genre>,
    #[serde(default, deserialize_with = "de_opt_year")]
    pub publication_year: Option<i32>,
    #[serde(default, deserialize_with = "de_opt_price")]
    pub price: Option<f64>,
    pub description: Option<String>,
    pub image: Option<ImageAttachment>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.isbn.is_none()
            && self.title.is_none()
            && self.author.is_none()
            && self.genre.is_none()
            && self.publication_year.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.image.is_none()
    }

    /// Field-wise invariant check over the supplied fields only.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.is_empty() {
            return Err(CatalogError::Validation("no fields to update".to_string()));
        }
        if let Some(ref isbn) = self.isbn {
            validate_isbn(isbn)?;
        }
        if let Some(ref title) = self.title {
            validate_text("title", title)?;
        }
        if let Some(ref author) = self.author {
            validate_text("author", author)?;
        }
        if let Some(ref description) = self.description {
            validate_text("description", description)?;
        }
        if let Some(year) = self.publication_year {
            validate_year(year)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    /// Apply the patch in place, leaving unsupplied fields unchanged.
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(ref isbn) = self.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(ref title) = self.title {
            book.title = title.clone();
        }
        if let Some(ref author) = self.author {
            book.author = author.clone();
        }
        if let Some(genre) = self.genre {
            book.genre = genre;
        }
        if let Some(year) = self.publication_year {
            book.publication_year = year;
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(ref description) = self.description {
            book.description = description.clone();
        }
        if let Some(ref image) = self.image {
            book.image = Some(image.clone());
        }
    }
}

fn validate_isbn(isbn: &str) -> Result<(), CatalogError> {
    if isbn.trim().len() < MIN_ISBN_LEN {
        return Err(CatalogError::Validation(format!(
            "isbn must be at least {} characters",
            MIN_ISBN_LEN
        )));
    }
    Ok(())
}

fn validate_text(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn validate_year(year: i32) -> Result<(), CatalogError> {
    if !(MIN_PUBLICATION_YEAR..=MAX_PUBLICATION_YEAR).contains(&year) {
        return Err(CatalogError::Validation(format!(
            "publication_year must be between {} and {}",
            MIN_PUBLICATION_YEAR, MAX_PUBLICATION_YEAR
        )));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), CatalogError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::Validation(
            "price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrText {
    Num(f64),
    Text(String),
}

fn coerce_price<E: serde::de::Error>(v: NumOrText) -> Result<f64, E> {
    match v {
        NumOrText::Num(n) => Ok(n),
        NumOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| E::custom(format!("price is not a number: {:?}", s))),
    }
}

fn de_price<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    coerce_price(NumOrText::deserialize(de)?)
}

fn de_opt_price<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    match Option::<NumOrText>::deserialize(de)? {
        None => Ok(None),
        Some(v) => coerce_price(v).map(Some),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrText {
    Num(i64),
    Text(String),
}

fn coerce_year<E: serde::de::Error>(v: IntOrText) -> Result<i32, E> {
    let n = match v {
        IntOrText::Num(n) => n,
        IntOrText::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| E::custom(format!("publication_year is not an integer: {:?}", s)))?,
    };
    i32::try_from(n).map_err(|_| E::custom("publication_year out of range"))
}

fn de_year<'de, D: Deserializer<'de>>(de: D) -> Result<i32, D::Error> {
    coerce_year(IntOrText::deserialize(de)?)
}

fn de_opt_year<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i32>, D::Error> {
    match Option::<IntOrText>::deserialize(de)? {
        None => Ok(None),
        Some(v) => coerce_year(v).map(Some),
    }
}
