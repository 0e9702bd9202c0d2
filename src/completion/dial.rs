//! DIAL chat completions client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::completion::CompletionClient;
use crate::conversation::{Message, Role};
use crate::error::{RagError, Result};
use crate::http;

/// Blocking client for `/openai/deployments/{deployment}/chat/completions`.
#[derive(Clone)]
pub struct DialCompletionClient {
    client: Client,
    endpoint: String,
}

impl DialCompletionClient {
    /// Builds a client for one chat deployment such as `gpt-4o`.
    pub fn new(api_key: &str, base_url: &str, deployment: &str, timeout: Duration) -> Result<Self> {
        let endpoint = http::deployment_url(base_url, deployment, "chat/completions")?;
        let client = http::build_client(api_key, timeout)?;
        Ok(Self { client, endpoint })
    }

    /// Fully-qualified chat completions endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CompletionClient for DialCompletionClient {
    fn get_completion(&self, messages: &[Message]) -> Result<Message> {
        debug!(endpoint = %self.endpoint, messages = messages.len(), "requesting completion");
        let body = ChatRequest { messages };
        let parsed: ChatResponse = http::post_json(&self.client, &self.endpoint, &body)?;
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Protocol("completion returned no choices".to_string()))?;
        Ok(Message::new(
            reply.message.role.unwrap_or(Role::Assistant),
            reply.message.content.unwrap_or_default(),
        ))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    content: Option<String>,
}
