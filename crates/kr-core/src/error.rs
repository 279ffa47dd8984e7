//! Error types for kr-core

use thiserror::Error;

/// Main error type for kr-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for kr-core
pub type Result<T> = std::result::Result<T, Error>;
