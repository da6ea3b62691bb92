//! SQLite-backed book store (persistence across restarts).
//!
//! The filter is compiled to SQL so matching and sorting happen in the
//! database; semantics mirror `Filter::matches` and `SortKey::compare`.

use catalog_types::{
    Book, BookId, BookPatch, BookStore, Filter, Genre, ImageAttachment, SortKey, StoreError,
    UpdateResult, Window,
};
use rusqlite::OptionalExtension;
use std::path::Path;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    isbn TEXT NOT NULL,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    genre TEXT NOT NULL,
    publication_year INTEGER NOT NULL,
    price REAL NOT NULL,
    description TEXT NOT NULL,
    image TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_author ON books(author);
CREATE INDEX IF NOT EXISTS idx_books_genre ON books(genre);
"#;

/// (id, isbn, title, author, genre, publication_year, price, description, image)
type RawRow = (
    String,
    String,
    String,
    String,
    String,
    i64,
    f64,
    String,
    Option<String>,
);

const SELECT_COLS: &str = "id, isbn, title, author, genre, publication_year, price, description, image";

/// SQLite-backed implementation of `BookStore`.
pub struct SqliteBookStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteBookStore {
    /// Open (or create) the database at the given path and initialize the
    /// schema. An unreachable file surfaces as `Unavailable`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Other(e.to_string()))?;
        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Other(format!("failed to acquire lock: {}", e)))
    }
}

fn other(e: rusqlite::Error) -> StoreError {
    StoreError::Other(e.to_string())
}

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn row_to_book(raw: RawRow) -> Result<Book, StoreError> {
    let (id, isbn, title, author, genre, year, price, description, image) = raw;
    let id = BookId::parse(&id).map_err(|_| StoreError::Other(format!("corrupt id: {}", id)))?;
    let genre = Genre::parse(&genre)
        .ok_or_else(|| StoreError::Other(format!("corrupt genre: {}", genre)))?;
    let image: Option<ImageAttachment> = match image {
        Some(json) => {
            Some(serde_json::from_str(&json).map_err(|e| StoreError::Other(e.to_string()))?)
        }
        None => None,
    };
    Ok(Book {
        id,
        isbn,
        title,
        author,
        genre,
        publication_year: year as i32,
        price,
        description,
        image,
    })
}

fn image_json(image: &Option<ImageAttachment>) -> Result<Option<String>, StoreError> {
    match image {
        Some(img) => serde_json::to_string(img)
            .map(Some)
            .map_err(|e| StoreError::Other(e.to_string())),
        None => Ok(None),
    }
}

fn filter_sql(filter: &Filter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    if let Some(ref keywords) = filter.keywords {
        let needle = format!("%{}%", keywords.to_lowercase());
        clauses
            .push("(LOWER(title) LIKE ? OR LOWER(description) LIKE ? OR LOWER(author) LIKE ?)");
        params.push(Box::new(needle.clone()));
        params.push(Box::new(needle.clone()));
        params.push(Box::new(needle));
    }
    if let Some(genre) = filter.genre {
        clauses.push("genre = ?");
        params.push(Box::new(genre.as_str().to_string()));
    }
    if let Some(ref range) = filter.price {
        if let Some(min) = range.min {
            clauses.push("price >= ?");
            params.push(Box::new(min));
        }
        if let Some(max) = range.max {
            clauses.push("price <= ?");
            params.push(Box::new(max));
        }
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (where_sql, params)
}

fn order_sql(sort: SortKey) -> &'static str {
    // id as tiebreak keeps pagination windows stable.
    match sort {
        SortKey::Author => "author, id",
        SortKey::Price => "price, id",
        SortKey::Year => "publication_year, id",
    }
}

#[async_trait::async_trait]
impl BookStore for SqliteBookStore {
    async fn find_many(
        &self,
        filter: &Filter,
        sort: SortKey,
        window: Window,
    ) -> Result<Vec<Book>, StoreError> {
        let (where_sql, mut params) = filter_sql(filter);
        let sql = format!(
            "SELECT {} FROM books{} ORDER BY {} LIMIT ? OFFSET ?",
            SELECT_COLS,
            where_sql,
            order_sql(sort)
        );
        // Clamp rather than wrap: a window beyond i64 range selects nothing.
        params.push(Box::new(i64::try_from(window.limit).unwrap_or(i64::MAX)));
        params.push(Box::new(i64::try_from(window.skip).unwrap_or(i64::MAX)));

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(other)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let raw: Vec<RawRow> = stmt
            .query_map(param_refs.as_slice(), read_raw)
            .map_err(other)?
            .collect::<rusqlite::Result<_>>()
            .map_err(other)?;
        drop(stmt);
        drop(conn);
        raw.into_iter().map(row_to_book).collect()
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let (where_sql, params) = filter_sql(filter);
        let sql = format!("SELECT COUNT(*) FROM books{}", where_sql);
        let conn = self.lock()?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(other)?;
        Ok(count as u64)
    }

    async fn find_one(&self, id: &BookId) -> Result<Option<Book>, StoreError> {
        let sql = format!("SELECT {} FROM books WHERE id = ?", SELECT_COLS);
        let conn = self.lock()?;
        let raw = conn
            .query_row(&sql, [id.to_string()], read_raw)
            .optional()
            .map_err(other)?;
        drop(conn);
        raw.map(row_to_book).transpose()
    }

    async fn insert_one(&self, book: Book) -> Result<BookId, StoreError> {
        let image = image_json(&book.image)?;
        let now = chrono::Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO books (id, isbn, title, author, genre, publication_year, price, description, image, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                book.id.to_string(),
                book.isbn,
                book.title,
                book.author,
                book.genre.as_str(),
                book.publication_year as i64,
                book.price,
                book.description,
                image,
                now,
                now,
            ],
        )
        .map_err(other)?;
        Ok(book.id)
    }

    async fn update_one(
        &self,
        id: &BookId,
        patch: &BookPatch,
    ) -> Result<UpdateResult, StoreError> {
        let sql = format!("SELECT {} FROM books WHERE id = ?", SELECT_COLS);
        let conn = self.lock()?;
        let raw = conn
            .query_row(&sql, [id.to_string()], read_raw)
            .optional()
            .map_err(other)?;
        let Some(raw) = raw else {
            return Ok(UpdateResult {
                matched: 0,
                modified: 0,
            });
        };
        let current = row_to_book(raw)?;
        let mut updated = current.clone();
        patch.apply_to(&mut updated);
        if updated == current {
            return Ok(UpdateResult {
                matched: 1,
                modified: 0,
            });
        }
        let image = image_json(&updated.image)?;
        conn.execute(
            "UPDATE books SET isbn = ?1, title = ?2, author = ?3, genre = ?4, publication_year = ?5, \
             price = ?6, description = ?7, image = ?8, updated_at = ?9 WHERE id = ?10",
            rusqlite::params![
                updated.isbn,
                updated.title,
                updated.author,
                updated.genre.as_str(),
                updated.publication_year as i64,
                updated.price,
                updated.description,
                image,
                chrono::Utc::now().to_rfc3339(),
                id.to_string(),
            ],
        )
        .map_err(other)?;
        Ok(UpdateResult {
            matched: 1,
            modified: 1,
        })
    }

    async fn delete_one(&self, id: &BookId) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let deleted = conn
            .execute("DELETE FROM books WHERE id = ?", [id.to_string()])
            .map_err(other)?;
        Ok(deleted as u64)
    }
}
