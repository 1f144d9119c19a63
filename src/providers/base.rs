//! Base provider trait and common types for Polychat
//!
//! This module defines the Provider trait that all chat backends implement,
//! along with the message type shared by the wire layer and the session
//! store, and the streamed-fragment types produced during a chat turn.

use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Role string for user messages
pub const ROLE_USER: &str = "user";
/// Role string for assistant messages
pub const ROLE_ASSISTANT: &str = "assistant";

/// Attachment kind for image uploads
pub const FILETYPE_IMAGE: &str = "image";

/// A single conversation message
///
/// The serialized form of this struct is the on-disk session contract:
/// `{role, content}` with an optional `filetype: "image"` + `file: <base64>`
/// pair when the message carries an attachment. Attachment bytes round-trip
/// byte-identically through the base64 field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user, assistant)
    pub role: String,
    /// Text content of the message
    pub content: String,
    /// Attachment kind, when present ("image")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
    /// Attachment bytes, persisted as base64 text
    #[serde(
        default,
        with = "base64_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    pub file: Option<Vec<u8>>,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use polychat::providers::Message;
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_USER.to_string(),
            content: content.into(),
            filetype: None,
            file: None,
        }
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use polychat::providers::Message;
    ///
    /// let msg = Message::assistant("Hello, user!");
    /// assert_eq!(msg.role, "assistant");
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_ASSISTANT.to_string(),
            content: content.into(),
            filetype: None,
            file: None,
        }
    }

    /// Creates a user message carrying an image attachment
    ///
    /// # Examples
    ///
    /// ```
    /// use polychat::providers::Message;
    ///
    /// let msg = Message::user_with_image("Uploaded image: cat.png", vec![0x89, 0x50]);
    /// assert_eq!(msg.filetype.as_deref(), Some("image"));
    /// ```
    pub fn user_with_image(content: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            role: ROLE_USER.to_string(),
            content: content.into(),
            filetype: Some(FILETYPE_IMAGE.to_string()),
            file: Some(bytes),
        }
    }

    /// Whether this message is a text turn that belongs in provider history.
    ///
    /// Only user/assistant messages with non-empty text qualify; system or
    /// attachment-only entries are excluded from what is sent to a backend.
    pub fn is_chat_turn(&self) -> bool {
        (self.role == ROLE_USER || self.role == ROLE_ASSISTANT) && !self.content.is_empty()
    }

    /// Whether this message carries an image attachment
    pub fn has_attachment(&self) -> bool {
        self.filetype.as_deref() == Some(FILETYPE_IMAGE) && self.file.is_some()
    }
}

/// Base64 (de)serialization for the optional attachment byte field
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_str(&STANDARD.encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(s) => STANDARD
                .decode(s.as_bytes())
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

/// One incremental piece of a streamed response
///
/// Providers normalize their wire formats to this enum at the boundary:
/// plain-text backends emit only `OutputText`; reasoning-series models also
/// emit `ReasoningSummary` deltas on a separate channel.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFragment {
    /// Answer-text delta (the channel rendered to the user)
    OutputText(String),
    /// Reasoning-summary delta (logged, not rendered as the answer)
    ReasoningSummary(String),
}

impl StreamFragment {
    /// The delta text, regardless of channel
    pub fn text(&self) -> &str {
        match self {
            Self::OutputText(s) | Self::ReasoningSummary(s) => s,
        }
    }

    /// Whether this fragment belongs to the answer-text channel
    pub fn is_output(&self) -> bool {
        matches!(self, Self::OutputText(_))
    }
}

/// A finite, consumed-once sequence of streamed response fragments.
///
/// The stream is backed by a task holding the underlying HTTP response;
/// dropping the stream cancels the task and releases the connection. A
/// transport failure mid-stream surfaces as a single `Err` item after which
/// the stream ends.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamFragment>> + Send>>;

/// Provider trait for chat backends
///
/// All backends (OpenAI, Ollama) implement this trait. The trait provides
/// a uniform `(prompt, history) -> stream of fragments` contract plus model
/// discovery.
///
/// # Examples
///
/// ```no_run
/// use polychat::providers::{ChatStream, Message, Provider, StreamFragment};
/// use polychat::error::Result;
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct EchoProvider;
///
/// #[async_trait]
/// impl Provider for EchoProvider {
///     async fn stream_chat(&self, prompt: &str, _history: &[Message]) -> Result<ChatStream> {
///         let fragment = StreamFragment::OutputText(prompt.to_string());
///         let items: Vec<Result<StreamFragment>> = vec![Ok(fragment)];
///         Ok(Box::pin(futures::stream::iter(items)))
///     }
///
///     fn current_model(&self) -> String {
///         "echo".to_string()
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Stream a response to `prompt` given the conversation `history`
    ///
    /// Implementations filter `history` to user/assistant text turns and
    /// append the prompt if it is not already the final turn.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be issued or the backend rejects
    /// it. Failures after streaming has begun are reported as an `Err` item
    /// within the returned stream instead.
    async fn stream_chat(&self, prompt: &str, history: &[Message]) -> Result<ChatStream>;

    /// List available model names for this provider
    ///
    /// # Default Implementation
    ///
    /// The default implementation returns an error indicating that model
    /// listing is not supported by this provider.
    async fn list_models(&self) -> Result<Vec<String>> {
        Err(crate::error::PolychatError::Provider(
            "Model listing is not supported by this provider".to_string(),
        )
        .into())
    }

    /// Name of the model this provider is configured to use
    fn current_model(&self) -> String;

    /// Whether web search will actually be used for the current model
    fn web_search_enabled(&self) -> bool {
        false
    }
}

/// Builds the conversation window sent to a backend.
///
/// Filters `history` down to user/assistant text turns and appends `prompt`
/// as a user turn unless the filtered history already ends with it.
///
/// # Examples
///
/// ```
/// use polychat::providers::{chat_history, Message};
///
/// let history = vec![
///     Message::user("Hi"),
///     Message::assistant("Hello!"),
/// ];
/// let window = chat_history(&history, "How are you?");
/// assert_eq!(window.len(), 3);
/// assert_eq!(window[2].content, "How are you?");
/// ```
pub fn chat_history(history: &[Message], prompt: &str) -> Vec<Message> {
    let mut window: Vec<Message> = history
        .iter()
        .filter(|m| m.is_chat_turn())
        .map(|m| Message {
            role: m.role.clone(),
            content: m.content.clone(),
            filetype: None,
            file: None,
        })
        .collect();

    let ends_with_prompt = window
        .last()
        .map(|m| m.role == ROLE_USER && m.content == prompt)
        .unwrap_or(false);

    if !ends_with_prompt {
        window.push(Message::user(prompt));
    }

    window
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_user() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content, "Hello");
        assert!(msg.filetype.is_none());
        assert!(msg.file.is_none());
    }

    #[test]
    fn test_message_assistant() {
        let msg = Message::assistant("Hi there");
        assert_eq!(msg.role, "assistant");
        assert_eq!(msg.content, "Hi there");
    }

    #[test]
    fn test_message_user_with_image() {
        let msg = Message::user_with_image("Uploaded image: cat.png", vec![1, 2, 3]);
        assert_eq!(msg.role, "user");
        assert!(msg.has_attachment());
        assert_eq!(msg.file.as_deref(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_message_serialization_plain() {
        let msg = Message::user("Test");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"content\":\"Test\""));
        // Attachment fields are omitted entirely for text messages
        assert!(!json.contains("filetype"));
        assert!(!json.contains("file"));
    }

    #[test]
    fn test_message_serialization_attachment_is_base64() {
        let msg = Message::user_with_image("img", vec![0x00, 0xff, 0x10]);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"filetype\":\"image\""));
        assert!(json.contains("\"file\":\"AP8Q\""));
    }

    #[test]
    fn test_message_attachment_roundtrip_byte_identical() {
        let original: Vec<u8> = (0u8..=255).collect();
        let msg = Message::user_with_image("img", original.clone());
        let json = serde_json::to_string(&msg).unwrap();
        let decoded: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.file.as_deref(), Some(original.as_slice()));
    }

    #[test]
    fn test_message_deserialization_without_attachment_fields() {
        let json = r#"{"role":"assistant","content":"hi"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role, "assistant");
        assert!(msg.file.is_none());
    }

    #[test]
    fn test_message_deserialization_rejects_bad_base64() {
        let json = r#"{"role":"user","content":"img","filetype":"image","file":"%%%"}"#;
        assert!(serde_json::from_str::<Message>(json).is_err());
    }

    #[test]
    fn test_is_chat_turn() {
        assert!(Message::user("hi").is_chat_turn());
        assert!(Message::assistant("hi").is_chat_turn());
        assert!(!Message::user("").is_chat_turn());
        let system = Message {
            role: "system".to_string(),
            content: "You are helpful".to_string(),
            filetype: None,
            file: None,
        };
        assert!(!system.is_chat_turn());
    }

    #[test]
    fn test_stream_fragment_accessors() {
        let out = StreamFragment::OutputText("a".to_string());
        let reasoning = StreamFragment::ReasoningSummary("b".to_string());
        assert!(out.is_output());
        assert!(!reasoning.is_output());
        assert_eq!(out.text(), "a");
        assert_eq!(reasoning.text(), "b");
    }

    #[test]
    fn test_chat_history_filters_non_turns() {
        let history = vec![
            Message {
                role: "system".to_string(),
                content: "setup".to_string(),
                filetype: None,
                file: None,
            },
            Message::user("question"),
            Message::assistant("answer"),
            // Attachment-only entry: no text content
            Message::user_with_image("", vec![1, 2, 3]),
        ];

        let window = chat_history(&history, "next");
        assert_eq!(window.len(), 3);
        assert!(window.iter().all(|m| m.role == "user" || m.role == "assistant"));
        assert!(window.iter().all(|m| m.file.is_none()));
        assert_eq!(window.last().unwrap().content, "next");
    }

    #[test]
    fn test_chat_history_does_not_duplicate_prompt() {
        let history = vec![Message::user("question")];
        let window = chat_history(&history, "question");
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_chat_history_appends_prompt_to_empty_history() {
        let window = chat_history(&[], "hello");
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].role, "user");
        assert_eq!(window[0].content, "hello");
    }

    #[test]
    fn test_chat_history_strips_attachment_bytes_from_turns() {
        let history = vec![Message::user_with_image("Uploaded image: a.png", vec![9])];
        let window = chat_history(&history, "what is in the image?");
        assert_eq!(window.len(), 2);
        assert!(window[0].file.is_none());
        assert_eq!(window[0].content, "Uploaded image: a.png");
    }
}
