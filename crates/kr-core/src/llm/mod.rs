//! LLM API client and types
//!
//! Supports both the Claude Messages API and OpenAI-compatible chat APIs.

mod client;
mod types;

pub use client::LlmClient;
pub use types::*;
