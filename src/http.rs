//! Blocking HTTP plumbing shared by the DIAL embedding and completion clients.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{RagError, Result};

/// Default DIAL proxy host.
pub const DEFAULT_DIAL_BASE_URL: &str = "https://ai-proxy.lab.epam.com";

/// Per-request timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Builds a client that sends `api-key` and JSON headers on every request.
pub(crate) fn build_client(api_key: &str, timeout: Duration) -> Result<Client> {
    if api_key.trim().is_empty() {
        return Err(RagError::invalid("missing DIAL API key"));
    }
    let mut headers = HeaderMap::new();
    headers.insert(
        "api-key",
        HeaderValue::from_str(api_key.trim())
            .map_err(|_| RagError::invalid("API key contains invalid header characters"))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|err| RagError::invalid(format!("failed to build HTTP client: {err}")))
}

/// `{base}/openai/deployments/{deployment}/{operation}`.
pub(crate) fn deployment_url(base_url: &str, deployment: &str, operation: &str) -> Result<String> {
    let base = base_url.trim().trim_end_matches('/');
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(RagError::invalid(format!(
            "DIAL base URL must be an http(s) URL, got '{base_url}'"
        )));
    }
    let deployment = deployment.trim();
    if deployment.is_empty() {
        return Err(RagError::invalid("missing deployment name"));
    }
    Ok(format!("{base}/openai/deployments/{deployment}/{operation}"))
}

/// POSTs `body` as JSON and decodes a successful reply.
///
/// Non-2xx answers become [`RagError::TransportFailure`] carrying the raw body.
pub(crate) fn post_json<B, T>(client: &Client, endpoint: &str, body: &B) -> Result<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = client
        .post(endpoint)
        .json(body)
        .send()
        .map_err(|source| RagError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;
    let status = response.status();
    debug!(endpoint, status = status.as_u16(), "received response");
    if !status.is_success() {
        return Err(RagError::TransportFailure {
            status: status.as_u16(),
            body: read_body(response),
        });
    }
    let text = response.text().map_err(|source| RagError::Http {
        endpoint: endpoint.to_string(),
        source,
    })?;
    serde_json::from_str(&text)
        .map_err(|err| RagError::Protocol(format!("unexpected response from {endpoint}: {err}")))
}

fn read_body(response: Response) -> String {
    response
        .text()
        .unwrap_or_else(|_| "<body unavailable>".to_string())
}
