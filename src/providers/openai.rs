//! OpenAI provider implementation for Polychat
//!
//! This module implements the Provider trait for the hosted OpenAI
//! backend, streaming server-sent events from the `/responses` endpoint.
//! The API key is resolved from configuration, then the `OPENAI_API_KEY`
//! environment variable, then the OS keyring; construction fails when no
//! key can be found.

use crate::config::{OpenAiConfig, SearchContextSize};
use crate::error::{PolychatError, Result};
use crate::providers::{chat_history, ChatStream, Message, Provider, StreamFragment};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Models offered by the hosted backend.
///
/// The hosted model list is static; there is no listing endpoint worth
/// querying for this set.
pub const OPENAI_MODELS: &[&str] = &[
    "gpt-4.1",
    "gpt-4.1-mini",
    "o3-pro",
    "o3",
    "o4-mini",
    "gpt-4o",
];

/// Default API base when no override is configured
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Keyring service and user names for stored API keys
const KEYRING_SERVICE: &str = "polychat";
const KEYRING_USER: &str = "openai";

/// Whether a model name belongs to the reasoning series.
///
/// Reasoning models reject the web-search tool and instead emit
/// reasoning-summary deltas alongside output text.
pub fn is_reasoning_model(name: &str) -> bool {
    name.to_lowercase().starts_with('o')
}

/// OpenAI chat provider
#[derive(Debug)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    web_search: bool,
    search_context_size: SearchContextSize,
    api_base: String,
}

/// Request structure for `/responses`
#[derive(Debug, Serialize)]
pub(crate) struct ResponsesRequest {
    model: String,
    input: Vec<ResponsesInputMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WebSearchTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<ReasoningOptions>,
}

/// One conversation turn in the request input
#[derive(Debug, Serialize)]
struct ResponsesInputMessage {
    role: String,
    content: String,
}

/// Web-search tool declaration
#[derive(Debug, Serialize)]
struct WebSearchTool {
    #[serde(rename = "type")]
    tool_type: String,
    search_context_size: String,
    user_location: UserLocation,
}

/// Forced tool selection, sent alongside the tool declaration so the
/// search actually runs instead of being left to the model's discretion
#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    tool_type: String,
}

/// Approximate location hint for web search
#[derive(Debug, Serialize)]
struct UserLocation {
    #[serde(rename = "type")]
    location_type: String,
    country: String,
    city: String,
    region: String,
}

/// Reasoning options for the reasoning-series models
#[derive(Debug, Serialize)]
struct ReasoningOptions {
    summary: String,
}

/// One server-sent event payload from the `/responses` stream
#[derive(Debug, Deserialize)]
struct ResponsesEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    delta: Option<String>,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider instance
    ///
    /// # Arguments
    ///
    /// * `config` - OpenAI configuration section
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if no API key is found in the config,
    /// the `OPENAI_API_KEY` environment variable, or the OS keyring
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let api_key = resolve_api_key(&config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("polychat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PolychatError::Provider(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!("Initialized OpenAI provider: model={}", config.model);

        Ok(Self {
            client,
            api_key,
            model: config.model,
            web_search: config.web_search,
            search_context_size: config.search_context_size,
            api_base: config
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }

    /// Build the streaming request body for a conversation window
    pub(crate) fn build_request(&self, window: &[Message]) -> ResponsesRequest {
        let input = window
            .iter()
            .map(|m| ResponsesInputMessage {
                role: m.role.clone(),
                content: m.content.clone(),
            })
            .collect();

        let reasoning = is_reasoning_model(&self.model);
        let tools = if self.web_search_enabled() {
            Some(vec![WebSearchTool {
                tool_type: "web_search_preview".to_string(),
                search_context_size: self.search_context_size.as_str().to_string(),
                user_location: UserLocation {
                    location_type: "approximate".to_string(),
                    country: "GB".to_string(),
                    city: "London".to_string(),
                    region: "London".to_string(),
                },
            }])
        } else {
            None
        };

        ResponsesRequest {
            model: self.model.clone(),
            input,
            stream: true,
            tool_choice: tools.as_ref().map(|_| ToolChoice {
                tool_type: "web_search_preview".to_string(),
            }),
            tools,
            reasoning: reasoning.then(|| ReasoningOptions {
                summary: "auto".to_string(),
            }),
        }
    }
}

/// Resolve the API key: config, then environment, then keyring
fn resolve_api_key(config: &OpenAiConfig) -> Result<String> {
    if let Some(key) = &config.api_key {
        if !key.is_empty() {
            return Ok(key.clone());
        }
    }

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER) {
        if let Ok(key) = entry.get_password() {
            if !key.is_empty() {
                tracing::debug!("Using OpenAI API key from keyring");
                return Ok(key);
            }
        }
    }

    Err(PolychatError::MissingCredentials("openai".to_string()).into())
}

/// Extract the data payload from one SSE line, if any.
///
/// Returns `None` for blank lines, comments, and non-data fields;
/// the `[DONE]` sentinel comes through as a payload for the caller
/// to match on.
fn sse_data_payload(line: &str) -> Option<&str> {
    let line = line.trim_end_matches('\r');
    line.strip_prefix("data:").map(str::trim_start)
}

/// Map one parsed event to a stream fragment, if it carries one
fn fragment_from_event(event: ResponsesEvent) -> Option<StreamFragment> {
    let delta = event.delta?;
    if event.event_type.contains("output_text.delta") {
        Some(StreamFragment::OutputText(delta))
    } else if event.event_type.contains("reasoning_summary_text.delta") {
        Some(StreamFragment::ReasoningSummary(delta))
    } else {
        None
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn stream_chat(&self, prompt: &str, history: &[Message]) -> Result<ChatStream> {
        let url = format!("{}/responses", self.api_base);
        let request = self.build_request(&chat_history(history, prompt));

        tracing::debug!(
            "Sending OpenAI responses request: model={}, {} input messages",
            request.model,
            request.input.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PolychatError::Provider(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PolychatError::Provider(format!(
                "OpenAI returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let (tx, rx) = mpsc::channel::<Result<StreamFragment>>(32);

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx
                            .send(Err(PolychatError::Stream(format!(
                                "OpenAI stream failed: {}",
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
                    let Ok(line) = std::str::from_utf8(&line) else {
                        continue;
                    };
                    let Some(payload) = sse_data_payload(line.trim_end()) else {
                        continue;
                    };
                    if payload == "[DONE]" {
                        return;
                    }
                    let event = match serde_json::from_str::<ResponsesEvent>(payload) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::debug!("Skipping malformed OpenAI event: {}", e);
                            continue;
                        }
                    };
                    if let Some(fragment) = fragment_from_event(event) {
                        if tx.send(Ok(fragment)).await.is_err() {
                            // Consumer stopped iterating; returning drops
                            // the response and closes the connection.
                            return;
                        }
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(OPENAI_MODELS.iter().map(|s| s.to_string()).collect())
    }

    fn current_model(&self) -> String {
        self.model.clone()
    }

    fn web_search_enabled(&self) -> bool {
        self.web_search && !is_reasoning_model(&self.model)
    }
}
