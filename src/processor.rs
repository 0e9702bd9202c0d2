//! Ingestion and retrieval orchestration over an embedding gateway and a vector store.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::chunker::Chunker;
use crate::embedder::EmbeddingGateway;
use crate::embeddings::EmbeddingInput;
use crate::error::{ensure_dimensions, RagError, Result};
use crate::metric::SearchMode;
use crate::vector_store::{SearchResult, VectorStore};

/// Knobs for turning a document into stored rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestParams {
    /// Characters per chunk.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub overlap: usize,
    /// Requested embedding width; must match the store.
    pub dimensions: usize,
    /// Maximum chunks per embedding request; `None` sends the whole document at once.
    pub batch_size: Option<usize>,
}

/// Knobs for a single retrieval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    /// Metric used for ranking and thresholding.
    pub search_mode: SearchMode,
    /// Maximum results fetched from the store.
    pub top_k: usize,
    /// Cutoff applied in the metric's direction.
    pub score_threshold: f64,
    /// Requested embedding width; must match the store.
    pub dimensions: usize,
}

/// Counters describing a finished ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Chunks produced by the chunker.
    pub chunks: usize,
    /// Embedding requests sent.
    pub requests: usize,
    /// Rows written to the store.
    pub stored: usize,
}

/// Chunks surviving retrieval, best-first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalContext {
    results: Vec<SearchResult>,
}

impl RetrievalContext {
    /// Ranked results with their scores.
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    /// Chunk texts in relevance order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.results.iter().map(|result| result.document.text.as_str())
    }

    /// Number of chunks retained.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True when nothing passed the threshold.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Chunk texts separated by blank lines, as embedded in the user prompt.
    pub fn render(&self) -> String {
        self.texts().collect::<Vec<_>>().join("\n\n")
    }
}

impl From<Vec<SearchResult>> for RetrievalContext {
    fn from(results: Vec<SearchResult>) -> Self {
        Self { results }
    }
}

/// Drives chunk → embed → store on ingestion and embed → search → filter on retrieval.
pub struct TextProcessor<G, S> {
    gateway: G,
    store: S,
}

impl<G, S> TextProcessor<G, S>
where
    G: EmbeddingGateway,
    S: VectorStore,
{
    /// Wraps an already-constructed gateway and store.
    pub fn new(gateway: G, store: S) -> Self {
        Self { gateway, store }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Underlying store, mutably (for resets).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Gives back the gateway and store.
    pub fn into_parts(self) -> (G, S) {
        (self.gateway, self.store)
    }

    /// Reads `path` and ingests its contents.
    pub fn process_text_file(&mut self, path: &Path, params: &IngestParams) -> Result<IngestReport> {
        let text = fs::read_to_string(path)
            .map_err(RagError::io(format!("failed to read {}", path.display())))?;
        info!(path = %path.display(), chars = text.chars().count(), "loaded document");
        self.ingest(&text, params)
    }

    /// Chunks, embeds and stores `text`.
    ///
    /// A failed embedding request aborts the run; rows written for earlier
    /// batches stay in the store.
    pub fn ingest(&mut self, text: &str, params: &IngestParams) -> Result<IngestReport> {
        ensure_dimensions(self.store.dimensions(), params.dimensions)?;
        let chunker = Chunker::new(params.chunk_size, params.overlap)?;
        if params.batch_size == Some(0) {
            return Err(RagError::invalid("embedding batch size must be positive"));
        }

        let chunks: Vec<&str> = chunker.chunks(text).map(|chunk| chunk.text).collect();
        let mut report = IngestReport {
            chunks: chunks.len(),
            ..IngestReport::default()
        };
        if chunks.is_empty() {
            info!("document is empty; nothing to ingest");
            return Ok(report);
        }

        let batch_size = params.batch_size.unwrap_or(chunks.len());
        for batch in chunks.chunks(batch_size) {
            let vectors = self
                .gateway
                .get_embeddings(params.dimensions, EmbeddingInput::Batch(batch))?
                .into_ordered(batch.len())?;
            report.requests += 1;
            for vector in &vectors {
                ensure_dimensions(params.dimensions, vector.len())?;
            }
            let rows: Vec<(&str, &[f32])> = batch
                .iter()
                .copied()
                .zip(vectors.iter().map(Vec::as_slice))
                .collect();
            report.stored += self.store.insert_many(&rows)?;
            debug!(
                batch = report.requests,
                stored = report.stored,
                total = report.chunks,
                "stored embedding batch"
            );
        }

        info!(
            chunks = report.chunks,
            requests = report.requests,
            stored = report.stored,
            "ingestion complete"
        );
        Ok(report)
    }

    /// Embeds `query`, searches the store and keeps results passing the threshold.
    ///
    /// An empty context is a normal outcome, not an error.
    pub fn search(&self, query: &str, params: &SearchParams) -> Result<RetrievalContext> {
        if params.top_k == 0 {
            return Err(RagError::invalid("top_k must be positive"));
        }
        ensure_dimensions(self.store.dimensions(), params.dimensions)?;

        let vector = self
            .gateway
            .get_embeddings(params.dimensions, EmbeddingInput::Single(query))?
            .into_ordered(1)?
            .pop()
            .ok_or_else(|| RagError::Protocol("gateway returned no query embedding".to_string()))?;
        ensure_dimensions(params.dimensions, vector.len())?;

        let candidates = self
            .store
            .search(&vector, params.search_mode, params.top_k)?;
        let fetched = candidates.len();
        let results: Vec<SearchResult> = candidates
            .into_iter()
            .filter(|result| {
                params
                    .search_mode
                    .passes(result.score, params.score_threshold)
            })
            // stores are trusted to rank, not to honour the cap
            .take(params.top_k)
            .collect();
        info!(
            mode = %params.search_mode,
            fetched,
            kept = results.len(),
            threshold = params.score_threshold,
            "retrieval complete"
        );
        Ok(RetrievalContext::from(results))
    }
}
