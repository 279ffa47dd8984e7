//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. Environment variables
//! 2. `kapso-relay.toml` in the current directory
//! 3. Default values
//!
//! Inside the TOML file, `${VAR_NAME}` is replaced with the value of the
//! environment variable (or the empty string when it is unset).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Default config file name looked up by [`Config::load`]
pub const CONFIG_FILE_NAME: &str = "kapso-relay.toml";

/// LLM Provider type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Claude API
    #[default]
    Claude,
    /// OpenAI-compatible API
    OpenAi,
}

impl LlmProvider {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "openai" | "openai-compatible" | "gateway" => LlmProvider::OpenAi,
            _ => LlmProvider::Claude,
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Model to use
    pub model: String,

    /// API provider
    pub provider: LlmProvider,

    /// Base URL (optional, for custom endpoints)
    pub base_url: Option<String>,

    /// Upper bound on generated tokens per reply
    pub max_tokens: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            provider: LlmProvider::Claude,
            base_url: None,
            max_tokens: default_max_tokens(),
        }
    }
}

impl LlmConfig {
    /// Return the API key or a configuration error when it is empty
    pub fn require_api_key(&self) -> Result<&str> {
        if self.api_key.is_empty() {
            return Err(Error::Config(
                "LLM_API_KEY environment variable is required".to_string(),
            ));
        }
        Ok(&self.api_key)
    }
}

/// Kapso messaging gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KapsoConfig {
    /// Kapso API key
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Base URL of the Kapso WhatsApp proxy
    pub base_url: String,

    /// Graph API version segment used in send URLs
    pub graph_version: String,
}

impl Default for KapsoConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_kapso_base_url(),
            graph_version: default_graph_version(),
        }
    }
}

impl KapsoConfig {
    /// Return the API key or a configuration error when it is empty
    pub fn require_api_key(&self) -> Result<&str> {
        if self.api_key.is_empty() {
            return Err(Error::Config(
                "KAPSO_API_KEY environment variable is required".to_string(),
            ));
        }
        Ok(&self.api_key)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Route the webhook is mounted on
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_path: default_webhook_path(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_model() -> String {
    "claude-haiku-4-5".to_string()
}

fn default_max_tokens() -> u64 {
    1024
}

fn default_kapso_base_url() -> String {
    "https://api.kapso.ai/meta/whatsapp".to_string()
}

fn default_graph_version() -> String {
    "v24.0".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_webhook_path() -> String {
    "/webhooks/kapso".to_string()
}

/// Main configuration for kapso-relay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub kapso: KapsoConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Expand `${VAR_NAME}` references from the environment.
    ///
    /// Unset variables expand to the empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let mut cfg = Self::from_toml_str(&expanded_content)?;
        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// Load configuration from the default location.
    ///
    /// Uses `./kapso-relay.toml` when it exists, otherwise the environment only.
    pub fn load() -> Result<Self> {
        if Path::new(CONFIG_FILE_NAME).exists() {
            return Self::from_toml_file(CONFIG_FILE_NAME);
        }

        Ok(Self::from_env())
    }

    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg
    }

    /// Parse already-expanded TOML text
    fn from_toml_str(content: &str) -> Result<Self> {
        let toml: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        let llm = toml.llm.unwrap_or_default();
        let llm_config = LlmConfig {
            api_key: llm.api_key.unwrap_or_default(),
            model: llm.model.unwrap_or_else(default_model),
            provider: llm
                .provider
                .as_deref()
                .map(LlmProvider::parse)
                .unwrap_or_default(),
            base_url: llm.base_url.filter(|url| !url.is_empty()),
            max_tokens: llm.max_tokens.unwrap_or_else(default_max_tokens),
        };

        let kapso = toml.kapso.unwrap_or_default();
        let kapso_config = KapsoConfig {
            api_key: kapso.api_key.unwrap_or_default(),
            base_url: kapso.base_url.unwrap_or_else(default_kapso_base_url),
            graph_version: kapso.graph_version.unwrap_or_else(default_graph_version),
        };

        let server = toml.server.unwrap_or_default();
        let server_config = ServerConfig {
            host: server.host.unwrap_or_else(default_host),
            port: server.port.unwrap_or_else(default_port),
            webhook_path: server.webhook_path.unwrap_or_else(default_webhook_path),
        };

        Ok(Config {
            llm: llm_config,
            kapso: kapso_config,
            server: server_config,
        })
    }

    /// Override settings with environment variables
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override settings from a variable lookup; empty values are ignored
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        // LLM
        if let Some(api_key) = get("LLM_API_KEY").or_else(|| get("ANTHROPIC_API_KEY")) {
            self.llm.api_key = api_key;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(provider) = get("LLM_PROVIDER") {
            self.llm.provider = LlmProvider::parse(&provider);
        }
        if let Some(base_url) = get("LLM_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }
        if let Some(max_tokens) = get("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.llm.max_tokens = max_tokens;
        }

        // Kapso
        if let Some(api_key) = get("KAPSO_API_KEY") {
            self.kapso.api_key = api_key;
        }
        if let Some(base_url) = get("KAPSO_BASE_URL") {
            self.kapso.base_url = base_url;
        }
        if let Some(version) = get("KAPSO_GRAPH_VERSION") {
            self.kapso.graph_version = version;
        }

        // Server
        if let Some(host) = get("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(path) = get("WEBHOOK_PATH") {
            self.server.webhook_path = path;
        }
    }
}

// ============================================================================
// TOML file structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    llm: Option<TomlLlmConfig>,
    kapso: Option<TomlKapsoConfig>,
    server: Option<TomlServerConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlLlmConfig {
    /// "claude" or "openai"
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    max_tokens: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlKapsoConfig {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    graph_version: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlServerConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    webhook_path: Option<String>,
}
