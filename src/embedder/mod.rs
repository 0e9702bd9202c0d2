//! Embedding gateways.

pub mod dial;

use crate::embeddings::{EmbeddingInput, IndexedEmbedding};
use crate::error::Result;

pub use dial::DialEmbedder;

/// Service that maps strings to fixed-width vectors.
///
/// Implementations make exactly one request per call; callers do not retry.
pub trait EmbeddingGateway {
    /// Embeds `inputs` at the requested width, keyed by submitted position.
    fn get_embeddings(&self, dimensions: usize, inputs: EmbeddingInput<'_>)
        -> Result<IndexedEmbedding>;
}

impl<G: EmbeddingGateway + ?Sized> EmbeddingGateway for &G {
    fn get_embeddings(
        &self,
        dimensions: usize,
        inputs: EmbeddingInput<'_>,
    ) -> Result<IndexedEmbedding> {
        (**self).get_embeddings(dimensions, inputs)
    }
}

impl<G: EmbeddingGateway + ?Sized> EmbeddingGateway for Box<G> {
    fn get_embeddings(
        &self,
        dimensions: usize,
        inputs: EmbeddingInput<'_>,
    ) -> Result<IndexedEmbedding> {
        (**self).get_embeddings(dimensions, inputs)
    }
}
