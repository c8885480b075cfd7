use super::genres::normalize_genres;
use super::{BookRecord, UNKNOWN};
use serde::Deserialize;
use serde_json::{Map, Value};

const TITLE_COLUMNS: [&str; 4] = ["Book", "Title", "book", "title"];
const AUTHOR_COLUMNS: [&str; 2] = ["Author", "author"];
const DESCRIPTION_COLUMNS: [&str; 2] = ["Description", "description"];
const GENRES_COLUMNS: [&str; 2] = ["Genres", "genres"];

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("could not find {0} column in book data")]
    MissingColumn(&'static str),
    #[error("catalog row {row} is not an object")]
    InvalidRow { row: usize },
}

/// Tabular catalog artifact in either of the two pandas JSON orientations.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CatalogTable {
    Split {
        columns: Vec<String>,
        data: Vec<Vec<Value>>,
    },
    Records(Vec<Value>),
}

/// Books decoded from a catalog artifact, in artifact row order.
#[derive(Debug, Default)]
pub struct ParsedCatalog {
    pub books: Vec<BookRecord>,
    /// Rows where title, author or description had to be default-filled.
    pub defaulted_rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub title: usize,
    pub author: Option<usize>,
    pub description: Option<usize>,
    pub genres: Option<usize>,
}

impl ColumnMap {
    /// Resolves the positions of the known columns. Names are compared after trimming.
    pub fn resolve(columns: &[String]) -> Result<Self, TableError> {
        let title =
            find_column(columns, &TITLE_COLUMNS).ok_or(TableError::MissingColumn("title"))?;
        Ok(Self {
            title,
            author: find_column(columns, &AUTHOR_COLUMNS),
            description: find_column(columns, &DESCRIPTION_COLUMNS),
            genres: find_column(columns, &GENRES_COLUMNS),
        })
    }
}

fn find_column(columns: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|name| columns.iter().position(|col| col.trim() == *name))
}

impl CatalogTable {
    pub fn into_catalog(self) -> Result<ParsedCatalog, TableError> {
        let (columns, rows) = match self {
            CatalogTable::Split { columns, data } => (columns, data),
            CatalogTable::Records(records) => records_to_rows(records)?,
        };
        if rows.is_empty() {
            return Ok(ParsedCatalog::default());
        }

        let map = ColumnMap::resolve(&columns)?;
        let mut parsed = ParsedCatalog {
            books: Vec::with_capacity(rows.len()),
            defaulted_rows: 0,
        };
        for (index, row) in rows.iter().enumerate() {
            let cell = |col: Option<usize>| col.and_then(|c| row.get(c)).and_then(cell_text);
            let title = cell(Some(map.title));
            let author = cell(map.author);
            let description = cell(map.description);
            if title.is_none() || author.is_none() || description.is_none() {
                parsed.defaulted_rows += 1;
            }
            parsed.books.push(BookRecord {
                index,
                title: title.unwrap_or_else(|| UNKNOWN.to_string()),
                author: author.unwrap_or_else(|| UNKNOWN.to_string()),
                description: description.unwrap_or_default(),
                genres: normalize_genres(map.genres.and_then(|c| row.get(c))),
            });
        }
        Ok(parsed)
    }
}

fn records_to_rows(records: Vec<Value>) -> Result<(Vec<String>, Vec<Vec<Value>>), TableError> {
    let mut columns: Vec<String> = Vec::new();
    let mut objects: Vec<Map<String, Value>> = Vec::with_capacity(records.len());
    for (row, record) in records.into_iter().enumerate() {
        let Value::Object(object) = record else {
            return Err(TableError::InvalidRow { row });
        };
        for key in object.keys() {
            let key = key.trim();
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
        objects.push(object);
    }

    let rows = objects
        .into_iter()
        .map(|object| {
            let mut cells = vec![Value::Null; columns.len()];
            for (key, value) in object {
                if let Some(pos) = columns.iter().position(|c| c == key.trim()) {
                    cells[pos] = value;
                }
            }
            cells
        })
        .collect();
    Ok((columns, rows))
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
