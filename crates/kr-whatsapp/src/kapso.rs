//! Kapso WhatsApp API client
//!
//! Kapso proxies the Meta WhatsApp Cloud API; requests use the Cloud API
//! message shape and authenticate with an `X-API-Key` header.

use kr_core::KapsoConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{Result, WhatsAppError};

/// Kapso API client
#[derive(Debug, Clone)]
pub struct KapsoClient {
    client: Client,
    api_key: String,
    base_url: String,
    graph_version: String,
}

/// Parameters of a send-text call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTextRequest {
    pub phone_number_id: String,
    /// Destination number, digits only
    pub to: String,
    pub body: String,
}

/// Outgoing text message payload
#[derive(Debug, Serialize)]
struct TextMessagePayload<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    text: TextPayload<'a>,
}

#[derive(Debug, Serialize)]
struct TextPayload<'a> {
    body: &'a str,
    preview_url: bool,
}

/// Delivery result returned by the send endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub messaging_product: String,
    #[serde(default)]
    pub contacts: Vec<ContactResult>,
    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResult {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub wa_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: String,
    #[serde(default)]
    pub message_status: Option<String>,
}

impl SendMessageResponse {
    /// Id of the first accepted message, if any
    pub fn message_id(&self) -> Option<&str> {
        self.messages.first().map(|m| m.id.as_str())
    }
}

impl KapsoClient {
    /// Create a new Kapso client; fails when the API key is missing
    pub fn new(config: &KapsoConfig) -> Result<Self> {
        let api_key = config
            .require_api_key()
            .map_err(|_| WhatsAppError::CredentialsNotSet)?
            .to_string();

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            graph_version: config.graph_version.clone(),
        })
    }

    fn messages_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url, self.graph_version, phone_number_id
        )
    }

    /// Send a WhatsApp text message
    pub async fn send_text(&self, request: &SendTextRequest) -> Result<SendMessageResponse> {
        info!(
            "Sending WhatsApp message to {} via {}",
            request.to, request.phone_number_id
        );

        let url = self.messages_url(&request.phone_number_id);

        let payload = TextMessagePayload {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: &request.to,
            message_type: "text",
            text: TextPayload {
                body: &request.body,
                preview_url: false,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Kapso send failed: {} - {}", status, text);
            return Err(WhatsAppError::Api(format!(
                "Failed to send message: {} - {}",
                status, text
            )));
        }

        let result: SendMessageResponse = response
            .json()
            .await
            .map_err(|e| WhatsAppError::Api(format!("Failed to parse send result: {}", e)))?;

        debug!("Send result: {:?}", result);
        Ok(result)
    }
}
