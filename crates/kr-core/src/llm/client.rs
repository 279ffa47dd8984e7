//! LLM API HTTP Client
//!
//! Supports both the Claude Messages API and OpenAI-compatible APIs.

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{Error, Result};

use super::types::*;

/// LLM API client (supports Claude and OpenAI-compatible APIs)
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u64,
    provider: LlmProvider,
}

impl LlmClient {
    /// Create a new LLM client; fails when the API key is missing
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(Error::Http)?;

        let base_url = match &config.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => match config.provider {
                LlmProvider::Claude => "https://api.anthropic.com/v1".to_string(),
                LlmProvider::OpenAi => "https://api.openai.com/v1".to_string(),
            },
        };

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url,
            max_tokens: config.max_tokens,
            provider: config.provider.clone(),
        })
    }

    /// Send a request to the configured provider
    pub async fn messages(&self, request: MessagesRequest) -> Result<MessagesResponse> {
        match self.provider {
            LlmProvider::Claude => self.send_claude_request(request).await,
            LlmProvider::OpenAi => self.send_openai_request(request).await,
        }
    }

    /// Generate a single completion for `prompt` under the `system` instruction.
    ///
    /// An empty completion is reported as an error since it cannot be relayed.
    pub async fn generate_text(&self, system: &str, prompt: &str) -> Result<String> {
        let request = self
            .request_builder()
            .system(system)
            .max_tokens(self.max_tokens)
            .user(prompt)
            .build();

        let text = self.messages(request).await?.text();
        if text.trim().is_empty() {
            return Err(Error::LlmApi("Empty completion".to_string()));
        }

        Ok(text)
    }

    async fn send_claude_request(&self, request: MessagesRequest) -> Result<MessagesResponse> {
        let url = format!("{}/messages", self.base_url);

        debug!("Sending request to Claude API: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Claude API error: {} - {}", status, body);
            return Err(Error::LlmApi(format!("{}: {}", status, body)));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            Error::LlmApi(format!("Failed to parse response: {} - {}", e, body))
        })?;

        info!(
            "Claude API response: stop_reason={:?}, tokens={}",
            parsed.stop_reason,
            parsed.usage.as_ref().map(|u| u.output_tokens).unwrap_or(0)
        );

        Ok(parsed)
    }

    async fn send_openai_request(&self, request: MessagesRequest) -> Result<MessagesResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!("Sending request to OpenAI-compatible API: {}", url);

        let openai_request = ChatCompletionRequest::from_claude_request(&request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&openai_request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("OpenAI API error: {} - {}", status, body);
            return Err(Error::LlmApi(format!("{}: {}", status, body)));
        }

        let openai_response: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            Error::LlmApi(format!("Failed to parse response: {} - {}", e, body))
        })?;

        let parsed = openai_response.to_claude_response();

        info!(
            "OpenAI API response: stop_reason={:?}, tokens={}",
            parsed.stop_reason,
            parsed.usage.as_ref().map(|u| u.output_tokens).unwrap_or(0)
        );

        Ok(parsed)
    }

    /// Create a messages request builder for the configured model
    pub fn request_builder(&self) -> MessagesRequestBuilder {
        MessagesRequestBuilder::new(self.model.clone())
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the provider type
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(provider: LlmProvider, base_url: &str) -> LlmConfig {
        LlmConfig {
            api_key: "test_key".to_string(),
            model: "test-model".to_string(),
            provider,
            base_url: Some(base_url.to_string()),
            max_tokens: 128,
        }
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = LlmClient::new(&LlmConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_default_base_url() {
        let config = LlmConfig {
            api_key: "k".to_string(),
            ..Default::default()
        };
        let client = LlmClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://api.anthropic.com/v1");
        assert_eq!(client.model(), "claude-haiku-4-5");
        assert_eq!(client.provider(), &LlmProvider::Claude);
    }

    #[tokio::test]
    async fn test_generate_text_claude() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "test_key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "max_tokens": 128,
                "system": "be brief",
                "messages": [{"role": "user", "content": [{"type": "text", "text": "hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "model": "test-model",
                "content": [{"type": "text", "text": "Hello!"}],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 4, "output_tokens": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::new(&config(LlmProvider::Claude, &server.uri())).unwrap();
        let text = client.generate_text("be brief", "hello").await.unwrap();
        assert_eq!(text, "Hello!");
    }

    #[tokio::test]
    async fn test_generate_text_openai() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test_key"))
            .and(body_partial_json(json!({
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "model": "test-model",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi there"}, "finish_reason": "stop"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::new(&config(LlmProvider::OpenAi, &server.uri())).unwrap();
        let text = client.generate_text("be brief", "hello").await.unwrap();
        assert_eq!(text, "Hi there");
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = LlmClient::new(&config(LlmProvider::Claude, &server.uri())).unwrap();
        let err = client.generate_text("s", "p").await.unwrap_err();
        match err {
            Error::LlmApi(msg) => assert!(msg.contains("529") && msg.contains("overloaded")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_completion_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [],
                "stop_reason": "end_turn"
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(&config(LlmProvider::Claude, &server.uri())).unwrap();
        let err = client.generate_text("s", "p").await.unwrap_err();
        assert!(matches!(err, Error::LlmApi(_)));
    }

    #[tokio::test]
    async fn test_unparsable_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = LlmClient::new(&config(LlmProvider::Claude, &server.uri())).unwrap();
        let err = client.generate_text("s", "p").await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse response"));
    }
}
