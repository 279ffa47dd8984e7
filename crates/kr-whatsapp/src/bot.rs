//! WhatsApp bot wrapper

use std::sync::Arc;

use kr_core::{Config, LlmClient};
use tracing::info;

use crate::error::{Result, WhatsAppError};
use crate::handler::{HandlerConfig, MessageHandler};
use crate::kapso::KapsoClient;
use crate::webhook::{create_webhook_router, WebhookState};

/// WhatsApp bot wrapper: owns the handler and serves the webhook
pub struct WhatsAppBot {
    handler: Arc<MessageHandler>,
    bind_addr: String,
    webhook_path: String,
}

impl WhatsAppBot {
    /// Create a new WhatsApp bot from an already-built handler
    pub fn new(handler: Arc<MessageHandler>, bind_addr: String, webhook_path: String) -> Self {
        Self {
            handler,
            bind_addr,
            webhook_path,
        }
    }

    /// Build both outbound clients from configuration.
    ///
    /// Fails before anything is bound if either credential is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let kapso_client = KapsoClient::new(&config.kapso)?;
        let llm_client = LlmClient::new(&config.llm)?;

        info!("LLM model: {}", llm_client.model());

        let handler = MessageHandler::new(
            Arc::new(llm_client),
            Arc::new(kapso_client),
            HandlerConfig::default(),
        );

        Ok(Self::new(
            Arc::new(handler),
            config.server.bind_addr(),
            config.server.webhook_path.clone(),
        ))
    }

    /// Path the webhook is served on
    pub fn webhook_path(&self) -> &str {
        &self.webhook_path
    }

    /// Start the bot (webhook server); runs until the server stops
    pub async fn start(self) -> Result<()> {
        let app = create_webhook_router(
            WebhookState {
                handler: self.handler,
            },
            &self.webhook_path,
        );

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|e| WhatsAppError::Config(format!("Failed to bind {}: {}", self.bind_addr, e)))?;

        info!(
            "WhatsApp webhook server listening on {}{}",
            self.bind_addr, self.webhook_path
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| WhatsAppError::Http(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kr_core::{KapsoConfig, LlmConfig};

    fn config_with_keys(kapso_key: &str, llm_key: &str) -> Config {
        Config {
            llm: LlmConfig {
                api_key: llm_key.to_string(),
                ..Default::default()
            },
            kapso: KapsoConfig {
                api_key: kapso_key.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config_missing_kapso_key() {
        let result = WhatsAppBot::from_config(&config_with_keys("", "llm_key"));
        assert!(matches!(result, Err(WhatsAppError::CredentialsNotSet)));
    }

    #[test]
    fn test_from_config_missing_llm_key() {
        let result = WhatsAppBot::from_config(&config_with_keys("kapso_key", ""));
        assert!(matches!(result, Err(WhatsAppError::Config(_))));
    }

    #[test]
    fn test_from_config() {
        let bot = WhatsAppBot::from_config(&config_with_keys("kapso_key", "llm_key")).unwrap();
        assert_eq!(bot.webhook_path(), "/webhooks/kapso");
        assert_eq!(bot.bind_addr, "0.0.0.0:3000");
    }
}
