//! DIAL (OpenAI-compatible) embeddings client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedder::EmbeddingGateway;
use crate::embeddings::{EmbeddingInput, IndexedEmbedding};
use crate::error::{RagError, Result};
use crate::http;

/// Blocking client for `/openai/deployments/{deployment}/embeddings`.
#[derive(Clone)]
pub struct DialEmbedder {
    client: Client,
    endpoint: String,
}

impl DialEmbedder {
    /// Builds a client for one embedding deployment.
    ///
    /// # Arguments
    /// * `api_key` - Value for the `api-key` header; blank keys are rejected
    /// * `base_url` - Proxy host, e.g. [`http::DEFAULT_DIAL_BASE_URL`]
    /// * `deployment` - Deployment name such as `text-embedding-3-small-1`
    /// * `timeout` - Per-request timeout; expiry surfaces as a transport failure
    pub fn new(api_key: &str, base_url: &str, deployment: &str, timeout: Duration) -> Result<Self> {
        let endpoint = http::deployment_url(base_url, deployment, "embeddings")?;
        let client = http::build_client(api_key, timeout)?;
        Ok(Self { client, endpoint })
    }

    /// Fully-qualified embeddings endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EmbeddingGateway for DialEmbedder {
    fn get_embeddings(
        &self,
        dimensions: usize,
        inputs: EmbeddingInput<'_>,
    ) -> Result<IndexedEmbedding> {
        if inputs.is_empty() {
            return Err(RagError::invalid("embedding batch must not be empty"));
        }
        debug!(
            endpoint = %self.endpoint,
            inputs = inputs.len(),
            dimensions,
            "requesting embeddings"
        );
        let request = EmbeddingRequest {
            input: inputs,
            dimensions,
        };
        let response: EmbeddingResponse = http::post_json(&self.client, &self.endpoint, &request)?;
        IndexedEmbedding::from_entries(
            response
                .data
                .into_iter()
                .map(|entry| (entry.index, entry.embedding)),
        )
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: EmbeddingInput<'a>,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}
