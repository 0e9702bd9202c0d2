//! Brute-force in-process vector store.

use crate::error::{RagError, Result};
use crate::metric::SearchMode;
use crate::vector_store::{check_dimensions, SearchResult, StoredDocument, VectorStore};

/// Keeps every row in memory and scores all of them on each search.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    dimensions: usize,
    documents: Vec<StoredDocument>,
    next_id: i64,
}

impl MemoryStore {
    /// Creates an empty store for vectors of width `dimensions`.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::invalid("vector dimensions must be positive"));
        }
        Ok(Self {
            dimensions,
            documents: Vec::new(),
            next_id: 1,
        })
    }

    /// Rows in insertion order.
    pub fn documents(&self) -> &[StoredDocument] {
        &self.documents
    }
}

impl VectorStore for MemoryStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn insert(&mut self, text: &str, embedding: &[f32]) -> Result<i64> {
        check_dimensions(self.dimensions, embedding)?;
        let id = self.next_id;
        self.next_id += 1;
        self.documents.push(StoredDocument {
            id,
            text: text.to_string(),
            embedding: embedding.to_vec(),
        });
        Ok(id)
    }

    fn search(
        &self,
        embedding: &[f32],
        mode: SearchMode,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        check_dimensions(self.dimensions, embedding)?;
        let mut results: Vec<SearchResult> = self
            .documents
            .iter()
            .map(|document| SearchResult {
                score: mode.score(&document.embedding, embedding),
                document: document.clone(),
            })
            .collect();
        results.sort_by(|a, b| {
            mode.compare_scores(a.score, b.score)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        results.truncate(top_k);
        Ok(results)
    }

    fn count(&self) -> Result<usize> {
        Ok(self.documents.len())
    }

    fn reset(&mut self, dimensions: usize) -> Result<()> {
        *self = Self::new(dimensions)?;
        Ok(())
    }
}
