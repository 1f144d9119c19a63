//! Command implementations for the Polychat CLI

pub mod chat;
pub mod models;
pub mod sessions;
