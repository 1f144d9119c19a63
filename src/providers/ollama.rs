//! Ollama provider implementation for Polychat
//!
//! This module implements the Provider trait for Ollama, connecting to a
//! local or remote Ollama server. Model listing queries `/api/tags` with a
//! short timeout and falls back to a fixed model list on any failure;
//! chat turns stream newline-delimited JSON from `/api/chat`.

use crate::config::OllamaConfig;
use crate::error::{PolychatError, Result};
use crate::providers::{chat_history, ChatStream, Message, Provider, StreamFragment};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Models offered when the server cannot be queried.
///
/// Listing must never fail: any transport or parse problem degrades to
/// this list instead.
pub const FALLBACK_MODELS: &[&str] = &["llama3", "llama2", "mistral", "qwen:7b", "qwen:14b"];

/// Timeout for the model-listing request
const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Ollama chat provider
///
/// # Examples
///
/// ```no_run
/// use polychat::config::OllamaConfig;
/// use polychat::providers::{OllamaProvider, Provider};
///
/// # async fn example() -> polychat::error::Result<()> {
/// let config = OllamaConfig {
///     host: "http://localhost:11434".to_string(),
///     model: "llama3".to_string(),
/// };
/// let provider = OllamaProvider::new(config)?;
/// let models = provider.list_models().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for `/api/chat`
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

/// Message structure for the Ollama wire format
#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

/// One newline-delimited JSON object from the `/api/chat` response body
#[derive(Debug, Deserialize)]
struct OllamaChatChunk {
    #[serde(default)]
    message: OllamaChunkMessage,
    #[serde(default)]
    done: bool,
}

/// Incremental message payload within a chat chunk
#[derive(Debug, Default, Deserialize)]
struct OllamaChunkMessage {
    #[serde(default)]
    content: String,
}

/// Response from `/api/tags`
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModelTag>,
}

/// Model metadata from `/api/tags`
#[derive(Debug, Deserialize)]
struct OllamaModelTag {
    name: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("polychat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PolychatError::Provider(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self { client, config })
    }

    /// The configured Ollama host
    pub fn host(&self) -> &str {
        &self.config.host
    }
}

/// The fixed fallback model list as owned strings
fn fallback_models() -> Vec<String> {
    FALLBACK_MODELS.iter().map(|s| s.to_string()).collect()
}

/// Parse one line of the streamed chat body.
///
/// A malformed line is skipped (logged at debug), never fatal to the
/// stream; blank lines yield `None` silently.
fn parse_stream_line(line: &[u8]) -> Option<OllamaChatChunk> {
    let trimmed = std::str::from_utf8(line).ok()?.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<OllamaChatChunk>(trimmed) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            tracing::debug!("Skipping malformed Ollama stream line: {}", e);
            None
        }
    }
}

/// Convert the conversation window to the Ollama wire shape
fn to_wire_messages(window: &[Message]) -> Vec<OllamaMessage> {
    window
        .iter()
        .map(|m| OllamaMessage {
            role: m.role.clone(),
            content: m.content.clone(),
        })
        .collect()
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn stream_chat(&self, prompt: &str, history: &[Message]) -> Result<ChatStream> {
        let url = format!("{}/api/chat", self.config.host);
        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: to_wire_messages(&chat_history(history, prompt)),
            stream: true,
        };

        tracing::debug!(
            "Sending Ollama chat request: model={}, {} messages",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PolychatError::Provider(format!("Ollama request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PolychatError::Provider(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let (tx, rx) = mpsc::channel::<Result<StreamFragment>>(32);

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = body.next().await {
                let chunk: Bytes = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx
                            .send(Err(PolychatError::Stream(format!(
                                "Ollama stream failed: {}",
                                e
                            ))
                            .into()))
                            .await;
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let Some(parsed) = parse_stream_line(&line) else {
                        continue;
                    };
                    if !parsed.message.content.is_empty()
                        && tx
                            .send(Ok(StreamFragment::OutputText(parsed.message.content)))
                            .await
                            .is_err()
                    {
                        // Consumer stopped iterating; returning drops the
                        // response and closes the connection.
                        return;
                    }
                    if parsed.done {
                        return;
                    }
                }
            }

            // Final line may arrive without a trailing newline
            if let Some(parsed) = parse_stream_line(&buffer) {
                if !parsed.message.content.is_empty() {
                    let _ = tx
                        .send(Ok(StreamFragment::OutputText(parsed.message.content)))
                        .await;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.config.host);
        tracing::debug!("Fetching models from Ollama: {}", url);

        let response = match self
            .client
            .get(&url)
            .timeout(MODEL_LIST_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    "Failed to reach Ollama at {}: {}; using fallback model list",
                    url,
                    e
                );
                return Ok(fallback_models());
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                "Ollama returned {} listing models; using fallback model list",
                response.status()
            );
            return Ok(fallback_models());
        }

        match response.json::<OllamaTagsResponse>().await {
            Ok(tags) => {
                let models: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
                tracing::debug!("Fetched {} models from Ollama", models.len());
                Ok(models)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse Ollama tags response: {}; using fallback model list",
                    e
                );
                Ok(fallback_models())
            }
        }
    }

    fn current_model(&self) -> String {
        self.config.model.clone()
    }
}
