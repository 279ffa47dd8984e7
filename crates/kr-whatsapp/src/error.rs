//! Error types for kr-whatsapp

use thiserror::Error;

/// kr-whatsapp error type
#[derive(Error, Debug)]
pub enum WhatsAppError {
    #[error("KAPSO_API_KEY environment variable is required")]
    CredentialsNotSet,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Kapso API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Reply generation failed: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for WhatsAppError {
    fn from(err: reqwest::Error) -> Self {
        WhatsAppError::Http(err.to_string())
    }
}

impl From<kr_core::Error> for WhatsAppError {
    fn from(err: kr_core::Error) -> Self {
        match err {
            kr_core::Error::Config(msg) => WhatsAppError::Config(msg),
            other => WhatsAppError::Generation(other.to_string()),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, WhatsAppError>;
