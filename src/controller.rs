//! Chat session controller for Polychat
//!
//! The controller owns the conversation state: which session is active,
//! its messages, and whether private mode is on. Every mutation is
//! persisted through the session store unless private mode suppresses it.

use crate::error::{PolychatError, Result};
use crate::providers::{Message, Provider, StreamFragment};
use crate::storage::SessionStore;
use futures::StreamExt;

/// Greeting seeded into every freshly created session
const WELCOME_MESSAGE: &str = "New session started. How can I help?";

/// Notice shown after the active session is deleted
const DELETED_NOTICE: &str = "Session deleted. Use /new to start a new one.";

/// Controller for the active chat session
///
/// State transitions:
/// - no active session: prompts and attachments are rejected with a
///   `Session` error and nothing is recorded
/// - active session: turns accumulate in memory and are written through
///   to the store after each change
/// - private mode: in-memory behavior is unchanged but nothing touches
///   the store
pub struct ChatController {
    store: SessionStore,
    current: Option<String>,
    messages: Vec<Message>,
    private_mode: bool,
    uploader_token: u64,
}

impl ChatController {
    /// Create a controller with no active session
    pub fn new(store: SessionStore, private_mode: bool) -> Self {
        Self {
            store,
            current: None,
            messages: Vec::new(),
            private_mode,
            uploader_token: 0,
        }
    }

    /// Name of the active session, if any
    pub fn current_session(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Messages of the active session
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether private mode is on
    pub fn is_private(&self) -> bool {
        self.private_mode
    }

    /// Monotonic token bumped after each accepted attachment
    pub fn uploader_token(&self) -> u64 {
        self.uploader_token
    }

    /// Create a new session and make it active
    ///
    /// The generated name is unique among saved sessions; the new session
    /// is seeded with a greeting and persisted unless private mode is on.
    ///
    /// # Errors
    ///
    /// Returns error if the session list cannot be read or the new session
    /// cannot be persisted
    pub fn create_session(&mut self) -> Result<String> {
        let name = self.generate_session_name()?;

        self.current = Some(name.clone());
        self.messages = vec![Message::assistant(WELCOME_MESSAGE)];
        self.persist()?;

        tracing::info!("Created session {}", name);
        Ok(name)
    }

    /// Switch to a saved session
    ///
    /// In private mode the store is not read; the name becomes active but
    /// the in-memory history carries over unchanged.
    ///
    /// # Errors
    ///
    /// Returns error if the session file exists but cannot be loaded
    pub fn switch_session(&mut self, name: &str) -> Result<()> {
        if !self.private_mode {
            self.messages = self.store.load(name)?;
        }
        self.current = Some(name.to_string());

        tracing::info!("Switched to session {}", name);
        Ok(())
    }

    /// Delete the active session
    ///
    /// Afterwards no session is active and prompts are rejected until a
    /// new one is created.
    ///
    /// # Errors
    ///
    /// Returns a `Session` error if no session is active, or a storage
    /// error if the file cannot be removed
    pub fn delete_session(&mut self) -> Result<String> {
        let name = self
            .current
            .take()
            .ok_or_else(|| PolychatError::Session("No active session to delete".to_string()))?;

        // An unpersisted (private) session has no file; delete is a no-op then
        self.store.delete(&name)?;
        self.messages = vec![Message::assistant(DELETED_NOTICE)];

        tracing::info!("Deleted session {}", name);
        Ok(name)
    }

    /// Toggle private mode, starting a fresh session either way
    ///
    /// Entering private mode starts an unpersisted session; leaving it
    /// starts a fresh persisted one. Returns the new session name.
    ///
    /// # Errors
    ///
    /// Returns error if the replacement session cannot be created
    pub fn toggle_private_mode(&mut self) -> Result<String> {
        self.private_mode = !self.private_mode;
        tracing::info!(
            "Private mode {}",
            if self.private_mode { "on" } else { "off" }
        );
        self.create_session()
    }

    /// Send a prompt and stream the response
    ///
    /// The prompt is recorded as a user turn, the provider's fragments are
    /// forwarded to `on_fragment` as they arrive, and the accumulated
    /// answer is recorded as an assistant turn. If the stream fails midway,
    /// whatever arrived before the failure is still recorded and persisted
    /// before the error is returned.
    ///
    /// # Arguments
    ///
    /// * `provider` - Backend to stream from
    /// * `prompt` - User prompt text
    /// * `on_fragment` - Called with each answer-text delta for display
    ///
    /// # Errors
    ///
    /// Returns a `Session` error (recording nothing) if no session is
    /// active; otherwise propagates request and stream failures
    pub async fn send_prompt(
        &mut self,
        provider: &dyn Provider,
        prompt: &str,
        mut on_fragment: impl FnMut(&str),
    ) -> Result<String> {
        if self.current.is_none() {
            return Err(PolychatError::Session(
                "No active session. Use /new to start one.".to_string(),
            )
            .into());
        }

        self.messages.push(Message::user(prompt));

        let mut stream = match provider.stream_chat(prompt, &self.messages).await {
            Ok(stream) => stream,
            Err(e) => {
                // The user turn stays recorded even though no answer came
                self.persist()?;
                return Err(e);
            }
        };

        let mut answer = String::new();
        let mut stream_error = None;

        while let Some(item) = stream.next().await {
            match item {
                Ok(StreamFragment::OutputText(delta)) => {
                    on_fragment(&delta);
                    answer.push_str(&delta);
                }
                Ok(StreamFragment::ReasoningSummary(delta)) => {
                    tracing::debug!("Reasoning: {}", delta);
                }
                Err(e) => {
                    stream_error = Some(e);
                    break;
                }
            }
        }

        if !answer.is_empty() {
            self.messages.push(Message::assistant(answer.clone()));
        }
        self.persist()?;

        match stream_error {
            Some(e) => Err(e),
            None => Ok(answer),
        }
    }

    /// Attach an image to the active session
    ///
    /// The bytes must be a decodable image format; rejected attachments
    /// leave the session unchanged.
    ///
    /// # Errors
    ///
    /// Returns a `Session` error if no session is active, or an
    /// `Attachment` error if the bytes are not an image
    pub fn attach_image(&mut self, filename: &str, bytes: Vec<u8>) -> Result<()> {
        if self.current.is_none() {
            return Err(PolychatError::Session(
                "No active session. Use /new to start one.".to_string(),
            )
            .into());
        }

        image::guess_format(&bytes).map_err(|e| {
            PolychatError::Attachment(format!("{} is not a supported image: {}", filename, e))
        })?;

        self.messages
            .push(Message::user_with_image(
                format!("Uploaded image: {}", filename),
                bytes,
            ));
        self.persist()?;
        self.uploader_token += 1;

        tracing::info!("Attached image {}", filename);
        Ok(())
    }

    /// Write the active session through to the store, unless private
    fn persist(&self) -> Result<()> {
        if self.private_mode {
            return Ok(());
        }
        if let Some(name) = &self.current {
            self.store.save(name, &self.messages)?;
        }
        Ok(())
    }

    /// Timestamped session name, de-collided with a numeric suffix
    fn generate_session_name(&self) -> Result<String> {
        let base = chrono::Local::now().format("session_%Y%m%d_%H%M%S").to_string();

        let taken: Vec<String> = if self.private_mode {
            self.current.iter().cloned().collect()
        } else {
            let mut names = self.store.list()?;
            names.extend(self.current.iter().cloned());
            names
        };

        if !taken.contains(&base) {
            return Ok(base);
        }

        let mut counter = 2;
        loop {
            let candidate = format!("{}_{}", base, counter);
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
            counter += 1;
        }
    }
}
