//! # Polychat
//!
//! A multi-provider LLM chat CLI with streaming responses and persistent
//! sessions.
//!
//! ## Features
//!
//! - Interchangeable chat backends: a local Ollama server or the hosted
//!   OpenAI API, behind one [`providers::Provider`] trait
//! - Incremental responses: answers stream fragment by fragment
//! - Session persistence: each conversation is one JSON file, including
//!   image attachments round-tripped through base64
//! - Private mode: chat without writing anything to disk
//!
//! ## Example
//!
//! ```no_run
//! use polychat::controller::ChatController;
//! use polychat::providers::create_provider;
//! use polychat::config::Config;
//! use polychat::storage::SessionStore;
//!
//! # async fn example() -> polychat::error::Result<()> {
//! let config = Config::default();
//! let provider = create_provider(&config.provider)?;
//! let store = SessionStore::new()?;
//!
//! let mut controller = ChatController::new(store, false);
//! controller.create_session()?;
//! let answer = controller
//!     .send_prompt(provider.as_ref(), "Hello!", |delta| print!("{}", delta))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod providers;
pub mod storage;

pub use config::Config;
pub use controller::ChatController;
pub use error::{PolychatError, Result};
