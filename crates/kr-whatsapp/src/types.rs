//! Kapso webhook payload types
//!
//! Every field is optional on the wire: a well-formed JSON object missing
//! fields is skipped by [`InboundNotification::filter`] instead of being
//! rejected at parse time.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One Kapso webhook delivery
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundNotification {
    #[serde(default)]
    pub message: Option<InboundMessage>,
    #[serde(default)]
    pub conversation: Option<Conversation>,
    /// Channel the reply must be sent through
    #[serde(default)]
    pub phone_number_id: Option<String>,
    /// Carried through, not acted on
    #[serde(default)]
    pub is_new_conversation: Option<bool>,
    /// Carried through, not acted on
    #[serde(default)]
    pub test: Option<bool>,
}

/// WhatsApp message as reported by Kapso
///
/// Fields the handler never reads are kept as raw JSON so that an
/// unexpected type there cannot fail deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(rename = "type", default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub text: Option<TextBody>,
    /// Sender phone number, as formatted by the gateway
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub kapso: Option<KapsoMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: Option<String>,
}

/// Kapso-specific message metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KapsoMetadata {
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub status: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub phone_number: Option<Value>,
    #[serde(default)]
    pub phone_number_id: Option<Value>,
}

/// Why a notification produced no reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Outbound echo or missing direction
    NotInbound,
    /// Media, location, reaction, ...
    NotText,
    MissingText,
    MissingPhoneNumberId,
    /// `from` absent or without any digit
    MissingSender,
    /// JSON object whose fields do not have the expected types
    Unrecognized,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotInbound | SkipReason::NotText => "not an inbound text message",
            SkipReason::MissingText => "missing text body",
            SkipReason::MissingPhoneNumberId => "missing phone_number_id",
            SkipReason::MissingSender => "missing sender",
            SkipReason::Unrecognized => "unrecognized payload shape",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to generate and deliver one reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    /// The user's text, used verbatim as the prompt
    pub prompt: String,
    /// Normalized sender number (digits only)
    pub to: String,
    pub phone_number_id: String,
}

impl InboundNotification {
    /// Decide whether this notification warrants a reply.
    ///
    /// Direction and type are checked before the text body, channel id and sender.
    pub fn filter(&self) -> Result<ReplyTarget, SkipReason> {
        let message = self.message.as_ref().ok_or(SkipReason::NotInbound)?;

        let direction = message.kapso.as_ref().and_then(|k| k.direction);
        if direction != Some(Direction::Inbound) {
            return Err(SkipReason::NotInbound);
        }
        if message.message_type.as_deref() != Some("text") {
            return Err(SkipReason::NotText);
        }

        let prompt = message
            .text
            .as_ref()
            .and_then(|t| t.body.as_deref())
            .filter(|body| !body.is_empty())
            .ok_or(SkipReason::MissingText)?;

        let phone_number_id = self
            .phone_number_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(SkipReason::MissingPhoneNumberId)?;

        let to = message
            .from
            .as_deref()
            .map(normalize_sender)
            .filter(|to| !to.is_empty())
            .ok_or(SkipReason::MissingSender)?;

        Ok(ReplyTarget {
            prompt: prompt.to_string(),
            to,
            phone_number_id: phone_number_id.to_string(),
        })
    }
}

/// Strip everything that is not an ASCII decimal digit
pub fn normalize_sender(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}
