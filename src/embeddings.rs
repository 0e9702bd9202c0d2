//! Shared embedding data structures used by gateways and the text processor.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{RagError, Result};

/// Payload submitted to an embedding gateway: one string or an ordered batch.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum EmbeddingInput<'a> {
    /// A lone string (used for queries).
    Single(&'a str),
    /// An ordered, non-empty batch (used for document chunks).
    Batch(&'a [&'a str]),
}

impl EmbeddingInput<'_> {
    /// Number of strings submitted.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(items) => items.len(),
        }
    }

    /// True for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Vectors keyed by the position of their input in the submitted batch.
///
/// Gateways may answer in any array order; only the position index is trusted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedEmbedding {
    vectors: BTreeMap<usize, Vec<f32>>,
}

impl IndexedEmbedding {
    /// Builds the mapping, rejecting a position reported twice.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, Vec<f32>)>,
    {
        let mut vectors = BTreeMap::new();
        for (index, vector) in entries {
            if vectors.insert(index, vector).is_some() {
                return Err(RagError::Protocol(format!(
                    "embedding index {index} returned more than once"
                )));
            }
        }
        Ok(Self { vectors })
    }

    /// Vector for the input submitted at `position`.
    pub fn get(&self, position: usize) -> Option<&[f32]> {
        self.vectors.get(&position).map(Vec::as_slice)
    }

    /// Number of vectors returned.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// True when the gateway returned nothing.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Reassembles vectors into submission order for a batch of `expected` inputs.
    ///
    /// Every position in `[0, expected)` must be present exactly once.
    pub fn into_ordered(self, expected: usize) -> Result<Vec<Vec<f32>>> {
        if self.vectors.len() != expected {
            return Err(RagError::Protocol(format!(
                "gateway returned {} embeddings for {} inputs",
                self.vectors.len(),
                expected
            )));
        }
        // BTreeMap iterates by key; with `expected` distinct keys this is 0..expected iff the last key fits
        if let Some((&last, _)) = self.vectors.last_key_value() {
            if last >= expected {
                return Err(RagError::Protocol(format!(
                    "embedding index {last} outside batch of {expected}"
                )));
            }
        }
        Ok(self.vectors.into_values().collect())
    }
}
