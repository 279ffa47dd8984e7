//! kr-whatsapp: WhatsApp auto-reply via the Kapso gateway
//!
//! Receives Kapso webhook notifications, generates a reply with the LLM
//! client from kr-core, and sends it back through the Kapso WhatsApp API.

pub mod bot;
pub mod error;
pub mod handler;
pub mod kapso;
pub mod types;
pub mod webhook;

pub use bot::WhatsAppBot;
pub use error::{Result, WhatsAppError};
pub use handler::{HandlerConfig, MessageHandler, MessageSender, ProcessOutcome, ReplyGenerator, Stage};
pub use kapso::{KapsoClient, SendMessageResponse, SendTextRequest};
pub use types::{InboundNotification, ReplyTarget, SkipReason};
pub use webhook::{create_webhook_router, WebhookState};
