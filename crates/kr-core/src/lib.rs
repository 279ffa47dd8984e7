//! kr-core: Kapso Relay Core Library
//!
//! Configuration loading, the shared error type, and the LLM client
//! used to generate replies.

pub mod config;
pub mod error;
pub mod llm;

pub use config::{Config, KapsoConfig, LlmConfig, LlmProvider, ServerConfig};
pub use error::{Error, Result};
pub use llm::{LlmClient, Message, MessageContent, MessagesRequest, MessagesResponse};
