//! Pipeline settings and the command-line flags shared by the binaries.

use std::time::Duration;

use clap::Args;

use crate::chunker::Chunker;
use crate::completion::DialCompletionClient;
use crate::embedder::DialEmbedder;
use crate::error::{RagError, Result};
use crate::http::DEFAULT_DIAL_BASE_URL;
use crate::metric::SearchMode;
use crate::processor::{IngestParams, SearchParams};
use crate::vector_store::StoreConfig;

/// Validated chunking, embedding and retrieval knobs.
#[derive(Clone, Debug, PartialEq)]
pub struct RagSettings {
    chunk_size: usize,
    overlap: usize,
    dimensions: usize,
    embed_batch_size: Option<usize>,
    search_mode: SearchMode,
    top_k: usize,
    score_threshold: f64,
}

impl RagSettings {
    /// Constructs settings, rejecting values no pipeline run could use.
    pub fn new(
        chunk_size: usize,
        overlap: usize,
        dimensions: usize,
        embed_batch_size: Option<usize>,
        search_mode: SearchMode,
        top_k: usize,
        score_threshold: f64,
    ) -> Result<Self> {
        Chunker::new(chunk_size, overlap)?;
        if dimensions == 0 {
            return Err(RagError::invalid("dimensions must be positive"));
        }
        if embed_batch_size == Some(0) {
            return Err(RagError::invalid("embedding batch size must be positive"));
        }
        if top_k == 0 {
            return Err(RagError::invalid("top_k must be positive"));
        }
        if !score_threshold.is_finite() {
            return Err(RagError::invalid("score threshold must be a finite number"));
        }
        Ok(Self {
            chunk_size,
            overlap,
            dimensions,
            embed_batch_size,
            search_mode,
            top_k,
            score_threshold,
        })
    }

    /// Characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by consecutive chunks.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Embedding width requested from the gateway and expected by the store.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Chunks per embedding request, `None` for one request per document.
    pub fn embed_batch_size(&self) -> Option<usize> {
        self.embed_batch_size
    }

    /// Ranking metric.
    pub fn search_mode(&self) -> SearchMode {
        self.search_mode
    }

    /// Maximum chunks retrieved per query.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Relevance cutoff, interpreted in the metric's direction.
    pub fn score_threshold(&self) -> f64 {
        self.score_threshold
    }

    /// Parameters for [`crate::TextProcessor::ingest`].
    pub fn ingest_params(&self) -> IngestParams {
        IngestParams {
            chunk_size: self.chunk_size,
            overlap: self.overlap,
            dimensions: self.dimensions,
            batch_size: self.embed_batch_size,
        }
    }

    /// Parameters for [`crate::TextProcessor::search`].
    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            search_mode: self.search_mode,
            top_k: self.top_k,
            score_threshold: self.score_threshold,
            dimensions: self.dimensions,
        }
    }
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: 400,
            overlap: 40,
            dimensions: 384,
            embed_batch_size: None,
            search_mode: SearchMode::Euclidean,
            top_k: 5,
            score_threshold: 0.5,
        }
    }
}

/// Flags shared by every binary; flatten into a `clap::Parser`.
#[derive(Args, Debug, Clone)]
pub struct RagArgs {
    /// DIAL API key sent as the `api-key` header
    #[arg(long, env = "DIAL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// DIAL proxy base URL
    #[arg(long, env = "RAG_DIAL_BASE", default_value = DEFAULT_DIAL_BASE_URL)]
    pub dial_base_url: String,

    /// Embedding deployment name
    #[arg(
        long,
        env = "RAG_EMBEDDING_DEPLOYMENT",
        default_value = "text-embedding-3-small-1"
    )]
    pub embedding_deployment: String,

    /// Chat completion deployment name
    #[arg(long, env = "RAG_COMPLETION_DEPLOYMENT", default_value = "gpt-4o")]
    pub completion_deployment: String,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "RAG_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// Characters per chunk
    #[arg(long, env = "RAG_CHUNK_SIZE", default_value_t = 400)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, env = "RAG_OVERLAP", default_value_t = 40)]
    pub overlap: usize,

    /// Embedding width; must match the vector table
    #[arg(long, env = "RAG_DIMENSIONS", default_value_t = 384)]
    pub dimensions: usize,

    /// Chunks per embedding request (unset = whole document in one request)
    #[arg(long, env = "RAG_EMBED_BATCH")]
    pub embed_batch_size: Option<usize>,

    /// Ranking metric
    #[arg(long, env = "RAG_SEARCH_MODE", value_enum, default_value_t = SearchMode::Euclidean)]
    pub search_mode: SearchMode,

    /// Maximum chunks retrieved per question
    #[arg(long, env = "RAG_TOP_K", default_value_t = 5)]
    pub top_k: usize,

    /// Distance ceiling (euclidean) or similarity floor (cosine, inner-product)
    #[arg(long, env = "RAG_SCORE_THRESHOLD", default_value_t = 0.5)]
    pub score_threshold: f64,

    /// Postgres host
    #[arg(long, env = "RAG_DB_HOST", default_value = "localhost")]
    pub db_host: String,

    /// Postgres port
    #[arg(long, env = "RAG_DB_PORT", default_value_t = 5433)]
    pub db_port: u16,

    /// Postgres database
    #[arg(long, env = "RAG_DB_NAME", default_value = "vectordb")]
    pub db_name: String,

    /// Postgres user
    #[arg(long, env = "RAG_DB_USER", default_value = "postgres")]
    pub db_user: String,

    /// Postgres password
    #[arg(
        long,
        env = "RAG_DB_PASSWORD",
        default_value = "postgres",
        hide_env_values = true
    )]
    pub db_password: String,

    /// Schema holding the vector table
    #[arg(long, env = "RAG_DB_SCHEMA", default_value = "public")]
    pub db_schema: String,

    /// Vector table name
    #[arg(long, env = "RAG_DB_TABLE", default_value = "documents")]
    pub db_table: String,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "RAG_LOG", default_value = "warn")]
    pub log_filter: String,
}

impl RagArgs {
    /// Converts the parsed flags into validated [`RagSettings`].
    pub fn build_settings(&self) -> Result<RagSettings> {
        RagSettings::new(
            self.chunk_size,
            self.overlap,
            self.dimensions,
            self.embed_batch_size,
            self.search_mode,
            self.top_k,
            self.score_threshold,
        )
    }

    /// Postgres connection parameters.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            database: self.db_name.clone(),
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            schema: self.db_schema.clone(),
            table: self.db_table.clone(),
        }
    }

    /// API key, rejecting a missing or blank value.
    pub fn api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(RagError::invalid("missing DIAL API key")),
        }
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Embedding client for the configured deployment.
    pub fn embedder(&self) -> Result<DialEmbedder> {
        DialEmbedder::new(
            self.api_key()?,
            &self.dial_base_url,
            &self.embedding_deployment,
            self.request_timeout(),
        )
    }

    /// Chat completion client for the configured deployment.
    pub fn completion_client(&self) -> Result<DialCompletionClient> {
        DialCompletionClient::new(
            self.api_key()?,
            &self.dial_base_url,
            &self.completion_deployment,
            self.request_timeout(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RagArgs,
    }

    fn parse_with_key(api_key: &str, extra: &[&str]) -> RagArgs {
        let mut argv = vec!["harness", "--api-key", api_key];
        argv.extend_from_slice(extra);
        Harness::parse_from(argv).args
    }

    fn parse(extra: &[&str]) -> RagArgs {
        parse_with_key("secret", extra)
    }

    #[test]
    fn defaults_match_settings_default() {
        let args = parse(&[]);
        assert_eq!(args.build_settings().unwrap(), RagSettings::default());
        assert_eq!(args.store_config(), StoreConfig::default());
        assert_eq!(args.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--chunk-size",
            "200",
            "--overlap",
            "20",
            "--search-mode",
            "cosine",
            "--score-threshold",
            "0.8",
            "--embed-batch-size",
            "16",
            "--db-port",
            "5432",
        ]);
        let settings = args.build_settings().unwrap();
        assert_eq!(settings.chunk_size(), 200);
        assert_eq!(settings.search_mode(), SearchMode::Cosine);
        assert_eq!(settings.ingest_params().batch_size, Some(16));
        assert_eq!(settings.search_params().score_threshold, 0.8);
        assert_eq!(args.store_config().port, 5432);
    }

    #[test]
    fn rejects_unusable_settings() {
        assert!(parse(&["--overlap", "400"]).build_settings().is_err());
        assert!(parse(&["--top-k", "0"]).build_settings().is_err());
        assert!(parse(&["--dimensions", "0"]).build_settings().is_err());
        assert!(parse(&["--embed-batch-size", "0"]).build_settings().is_err());
    }

    #[test]
    fn api_key_must_not_be_blank() {
        assert_eq!(parse(&[]).api_key().unwrap(), "secret");
        let blank = parse_with_key("  ", &[]);
        assert!(matches!(
            blank.api_key(),
            Err(RagError::InvalidConfiguration(_))
        ));
        assert!(blank.embedder().is_err());
    }

    #[test]
    fn clients_use_configured_deployments() {
        let args = parse(&["--dial-base-url", "http://127.0.0.1:9"]);
        assert_eq!(
            args.embedder().unwrap().endpoint(),
            "http://127.0.0.1:9/openai/deployments/text-embedding-3-small-1/embeddings"
        );
        assert_eq!(
            args.completion_client().unwrap().endpoint(),
            "http://127.0.0.1:9/openai/deployments/gpt-4o/chat/completions"
        );
    }
}
