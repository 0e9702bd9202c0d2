//! Error taxonomy shared by the chunker, gateways, stores and processor.

use std::io;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = RagError> = std::result::Result<T, E>;

/// Failures surfaced by ingestion, retrieval and generation.
///
/// Nothing in the crate recovers from these locally; they propagate to the
/// caller unchanged and abort only the operation that raised them.
#[derive(Debug, Error)]
pub enum RagError {
    /// Bad chunking parameters, a missing API key or another start-up setting.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Upstream answered with a non-success status.
    #[error("upstream request failed ({status}): {body}")]
    TransportFailure {
        /// HTTP status code returned by the service.
        status: u16,
        /// Raw response body, or a placeholder when it could not be read.
        body: String,
    },
    /// The request never produced a response (connect error, timeout, ...).
    #[error("request to {endpoint} failed: {source}")]
    Http {
        /// Endpoint that was being called.
        endpoint: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// Upstream answered with a body that does not match the expected shape.
    #[error("malformed response: {0}")]
    Protocol(String),
    /// A vector width disagrees with the store's configured width.
    #[error("vector dimension mismatch: store expects {expected}, got {actual}")]
    DimensionMismatch {
        /// Width the store was created with.
        expected: usize,
        /// Width that was supplied.
        actual: usize,
    },
    /// The database rejected an insert, query or reset.
    #[error("{context}: {source}")]
    StoreFailure {
        /// What the store was doing.
        context: String,
        /// Driver error.
        #[source]
        source: tokio_postgres::Error,
    },
    /// Local I/O failed (reading the document, starting the runtime).
    #[error("{context}: {source}")]
    Io {
        /// What was being read or created.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl RagError {
    /// Shorthand for [`RagError::InvalidConfiguration`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// True for failures talking to an HTTP service, whether or not a response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportFailure { .. } | Self::Http { .. })
    }

    pub(crate) fn store(context: impl Into<String>) -> impl FnOnce(tokio_postgres::Error) -> Self {
        let context = context.into();
        move |source| Self::StoreFailure { context, source }
    }

    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }
}

/// Fails with [`RagError::DimensionMismatch`] unless `actual == expected`.
pub(crate) fn ensure_dimensions(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(RagError::DimensionMismatch { expected, actual })
    }
}
