//! In-process gateway doubles for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::embedder::EmbeddingGateway;
use crate::embeddings::{EmbeddingInput, IndexedEmbedding};
use crate::error::{RagError, Result};

/// Answers from a fixed text → vector table and records batch sizes.
///
/// Unscripted texts embed as `[chars, 0, 0, ...]`. Entries are returned in
/// reverse array order so callers must rely on the position index.
pub(crate) struct ScriptedGateway {
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
    requests: RefCell<Vec<usize>>,
    fail_after: Option<usize>,
    calls: Cell<usize>,
}

impl ScriptedGateway {
    pub(crate) fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
            fail_after: None,
            calls: Cell::new(0),
        }
    }

    pub(crate) fn with(mut self, text: &str, vector: &[f32]) -> Self {
        self.vectors.insert(text.to_string(), vector.to_vec());
        self
    }

    /// Lets `calls` requests through, then answers 503.
    pub(crate) fn failing_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    /// Batch sizes of the requests that succeeded.
    pub(crate) fn requests(&self) -> Vec<usize> {
        self.requests.borrow().clone()
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        self.vectors.get(text).cloned().unwrap_or_else(|| {
            let mut vector = vec![0.0; self.dimensions];
            vector[0] = text.chars().count() as f32;
            vector
        })
    }
}

impl EmbeddingGateway for ScriptedGateway {
    fn get_embeddings(
        &self,
        _dimensions: usize,
        inputs: EmbeddingInput<'_>,
    ) -> Result<IndexedEmbedding> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if self.fail_after.is_some_and(|limit| call >= limit) {
            return Err(RagError::TransportFailure {
                status: 503,
                body: "scripted outage".to_string(),
            });
        }
        let texts: Vec<&str> = match inputs {
            EmbeddingInput::Single(text) => vec![text],
            EmbeddingInput::Batch(texts) => texts.to_vec(),
        };
        self.requests.borrow_mut().push(texts.len());
        IndexedEmbedding::from_entries(
            texts
                .iter()
                .enumerate()
                .rev()
                .map(|(index, text)| (index, self.vector_for(text))),
        )
    }
}
