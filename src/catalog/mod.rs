//! Book metadata keyed by the dense catalog index.

mod genres;
mod table;

pub use genres::normalize_genres;
pub use table::{CatalogTable, ColumnMap, ParsedCatalog, TableError};

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fill value for a missing title or author.
pub const UNKNOWN: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub index: usize,
    pub title: String,
    pub author: String,
    pub description: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("book index {index} out of range, catalog holds {total} books")]
pub struct OutOfRange {
    pub index: i64,
    pub total: usize,
}

/// Checks a caller-supplied index against `[0, total)`.
pub fn resolve_index(raw: i64, total: usize) -> Result<usize, OutOfRange> {
    usize::try_from(raw)
        .ok()
        .filter(|index| *index < total)
        .ok_or(OutOfRange { index: raw, total })
}

pub struct CatalogStore {
    books: Vec<BookRecord>,
    titles_lower: Vec<String>,
}

impl CatalogStore {
    /// Builds the store from books in dataset order; each book's `index` is set to
    /// its position.
    pub fn new(mut books: Vec<BookRecord>) -> Self {
        for (position, book) in books.iter_mut().enumerate() {
            book.index = position;
        }
        let titles_lower = books.iter().map(|b| b.title.to_lowercase()).collect();
        Self {
            books,
            titles_lower,
        }
    }

    pub fn total(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, index: i64) -> Result<&BookRecord, OutOfRange> {
        let index = resolve_index(index, self.books.len())?;
        Ok(&self.books[index])
    }

    pub(crate) fn get_at(&self, index: usize) -> Option<&BookRecord> {
        self.books.get(index)
    }

    /// Case-insensitive substring match on titles, in dataset order, capped at `limit`.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&BookRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.titles_lower
            .iter()
            .enumerate()
            .filter(|(_, title)| title.contains(&needle))
            .take(limit)
            .map(|(index, _)| &self.books[index])
            .collect()
    }

    /// Draws `min(count, total)` distinct books uniformly at random.
    pub fn random_sample(&self, count: usize) -> Vec<&BookRecord> {
        self.random_sample_with(&mut rand::thread_rng(), count)
    }

    pub fn random_sample_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
    ) -> Vec<&BookRecord> {
        let amount = count.min(self.books.len());
        index::sample(rng, self.books.len(), amount)
            .into_iter()
            .map(|index| &self.books[index])
            .collect()
    }
}
