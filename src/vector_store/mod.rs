//! Vector store abstraction plus the in-memory and pgvector backends.

pub mod memory;
pub mod postgres;

use crate::error::{RagError, Result};
use crate::metric::SearchMode;

pub use memory::MemoryStore;
pub use postgres::{PgVectorStore, StoreConfig};

/// Persisted chunk text plus its vector.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Identity assigned by the store on insert.
    pub id: i64,
    /// Chunk text as submitted during ingestion.
    pub text: String,
    /// Embedding stored alongside the text.
    pub embedding: Vec<f32>,
}

/// Stored document ranked against a query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Matched row.
    pub document: StoredDocument,
    /// Distance or similarity, depending on the [`SearchMode`] used.
    pub score: f64,
}

/// Storage for (chunk text, vector) rows with nearest-neighbour lookup.
///
/// The vector width is fixed per store; changing it requires [`VectorStore::reset`].
pub trait VectorStore {
    /// Width every stored and queried vector must have.
    fn dimensions(&self) -> usize;

    /// Persists one row and returns its identity.
    fn insert(&mut self, text: &str, embedding: &[f32]) -> Result<i64>;

    /// Persists rows in order, returning how many were written.
    fn insert_many(&mut self, rows: &[(&str, &[f32])]) -> Result<usize> {
        for (text, embedding) in rows {
            self.insert(text, embedding)?;
        }
        Ok(rows.len())
    }

    /// Up to `top_k` rows closest to `embedding`, best-first under `mode`.
    fn search(&self, embedding: &[f32], mode: SearchMode, top_k: usize)
        -> Result<Vec<SearchResult>>;

    /// Number of stored rows.
    fn count(&self) -> Result<usize>;

    /// Deletes every row and re-creates the store with a new vector width.
    fn reset(&mut self, dimensions: usize) -> Result<()>;
}

impl<S: VectorStore + ?Sized> VectorStore for Box<S> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn insert(&mut self, text: &str, embedding: &[f32]) -> Result<i64> {
        (**self).insert(text, embedding)
    }

    fn insert_many(&mut self, rows: &[(&str, &[f32])]) -> Result<usize> {
        (**self).insert_many(rows)
    }

    fn search(
        &self,
        embedding: &[f32],
        mode: SearchMode,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        (**self).search(embedding, mode, top_k)
    }

    fn count(&self) -> Result<usize> {
        (**self).count()
    }

    fn reset(&mut self, dimensions: usize) -> Result<()> {
        (**self).reset(dimensions)
    }
}

/// Fully-qualified Postgres table name (schema + table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: String,
    table: String,
}

impl TableName {
    /// Builds a new table identifier; both parts must be non-blank.
    pub fn new<S, T>(schema: S, table: T) -> Result<Self>
    where
        S: Into<String>,
        T: Into<String>,
    {
        let schema = schema.into();
        let table = table.into();
        if schema.trim().is_empty() {
            return Err(RagError::invalid("schema name is required"));
        }
        if table.trim().is_empty() {
            return Err(RagError::invalid("table name is required"));
        }
        Ok(Self { schema, table })
    }

    /// `"schema"."table"` with embedded quotes escaped.
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }

    /// Raw schema string.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Raw table string.
    pub fn table(&self) -> &str {
        &self.table
    }
}

/// Quotes Postgres identifiers, escaping embedded quotes.
pub fn quote_ident(input: &str) -> String {
    format!("\"{}\"", input.replace('"', "\"\""))
}

pub(crate) fn check_dimensions(expected: usize, embedding: &[f32]) -> Result<()> {
    crate::error::ensure_dimensions(expected, embedding.len())
}
