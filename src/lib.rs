#![warn(missing_docs)]
//! Retrieval-augmented question answering over a single text document.
//!
//! A document is split into overlapping character windows, embedded through a
//! DIAL deployment and stored in pgvector. Questions are embedded the same way,
//! matched against the stored chunks and answered by a chat deployment that
//! only sees the chunks passing the configured score threshold.

pub mod chunker;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod embedder;
pub mod embeddings;
pub mod error;
pub mod http;
pub mod logging;
pub mod metric;
pub mod processor;
pub mod prompt;
pub mod session;
pub mod vector_store;

#[cfg(test)]
mod test_util;

pub use chunker::{Chunk, Chunker};
pub use completion::{CompletionClient, DialCompletionClient};
pub use config::{RagArgs, RagSettings};
pub use conversation::{Conversation, Message, Role};
pub use embedder::{DialEmbedder, EmbeddingGateway};
pub use embeddings::{EmbeddingInput, IndexedEmbedding};
pub use error::{RagError, Result};
pub use metric::{ScoreDirection, SearchMode};
pub use processor::{IngestParams, IngestReport, RetrievalContext, SearchParams, TextProcessor};
pub use session::{Answer, ChatSession};
pub use vector_store::{
    MemoryStore, PgVectorStore, SearchResult, StoreConfig, StoredDocument, TableName, VectorStore,
};
