//! Reply orchestration: filter, generate, send

use std::sync::Arc;

use async_trait::async_trait;
use kr_core::LlmClient;
use tracing::{debug, error, info};

use crate::error::{Result, WhatsAppError};
use crate::kapso::{KapsoClient, SendMessageResponse, SendTextRequest};
use crate::types::{InboundNotification, SkipReason};

/// Instruction sent with every prompt
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant responding via WhatsApp. Keep responses concise and friendly.";

/// Characters of the reply echoed in the completion log line
const LOG_PREVIEW_CHARS: usize = 50;

/// Produces reply text for a user message
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Delivers reply text to a WhatsApp user
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, request: SendTextRequest) -> Result<SendMessageResponse>;
}

#[async_trait]
impl ReplyGenerator for LlmClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        self.generate_text(system, prompt)
            .await
            .map_err(|e| WhatsAppError::Generation(e.to_string()))
    }
}

#[async_trait]
impl MessageSender for KapsoClient {
    async fn send_text(&self, request: SendTextRequest) -> Result<SendMessageResponse> {
        KapsoClient::send_text(self, &request).await
    }
}

/// Configuration for the message handler
#[derive(Clone, Debug)]
pub struct HandlerConfig {
    pub system_prompt: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Step of the orchestration that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generate,
    Send,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Generate => "generate",
            Stage::Send => "send",
        }
    }
}

/// Result of handling one notification
#[derive(Debug)]
pub enum ProcessOutcome {
    /// Filtered out, no outbound calls were made
    Skipped(SkipReason),
    Replied {
        to: String,
        message_id: Option<String>,
    },
    /// A downstream call failed; the error is contained here
    Failed { stage: Stage, error: WhatsAppError },
}

/// Handles Kapso notifications
pub struct MessageHandler {
    generator: Arc<dyn ReplyGenerator>,
    sender: Arc<dyn MessageSender>,
    config: HandlerConfig,
}

impl MessageHandler {
    /// Create a new message handler
    pub fn new(
        generator: Arc<dyn ReplyGenerator>,
        sender: Arc<dyn MessageSender>,
        config: HandlerConfig,
    ) -> Self {
        Self {
            generator,
            sender,
            config,
        }
    }

    /// Filter the notification and, when it qualifies, generate and send a reply.
    ///
    /// Never fails: downstream errors are logged and returned as
    /// [`ProcessOutcome::Failed`].
    pub async fn process_notification(&self, notification: &InboundNotification) -> ProcessOutcome {
        let target = match notification.filter() {
            Ok(target) => target,
            Err(reason) => {
                info!("Skipping - {}", reason);
                return ProcessOutcome::Skipped(reason);
            }
        };

        info!(
            sender = %target.to,
            phone_number_id = %target.phone_number_id,
            "Processing message"
        );
        debug!("User message: {}", target.prompt);

        info!("Generating AI response...");
        let text = match self
            .generator
            .generate(&self.config.system_prompt, &target.prompt)
            .await
        {
            Ok(text) => text,
            Err(e) => return failed(Stage::Generate, e),
        };
        info!("AI response generated ({} chars)", text.chars().count());

        info!("Sending reply via Kapso API...");
        let request = SendTextRequest {
            phone_number_id: target.phone_number_id,
            to: target.to.clone(),
            body: text,
        };
        let preview = preview(&request.body, LOG_PREVIEW_CHARS);

        match self.sender.send_text(request).await {
            Ok(result) => {
                debug!("Send result: {:?}", result);
                info!("Replied to {}: {}...", target.to, preview);
                ProcessOutcome::Replied {
                    to: target.to,
                    message_id: result.message_id().map(str::to_string),
                }
            }
            Err(e) => failed(Stage::Send, e),
        }
    }
}

fn failed(stage: Stage, error: WhatsAppError) -> ProcessOutcome {
    error!(stage = stage.as_str(), "Error processing message: {}", error);
    ProcessOutcome::Failed { stage, error }
}

/// First `max_chars` characters of `text`
fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
