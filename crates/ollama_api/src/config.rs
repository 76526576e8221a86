use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::DEFAULT_OLLAMA_BASE_URL;

/// Transport configuration for Ollama generate requests.
#[derive(Debug, Clone)]
pub struct OllamaApiConfig {
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Model used when a payload does not name one.
    pub model: String,
    /// Optional bearer token for servers behind an authenticating proxy.
    pub api_key: Option<String>,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Optional `keep_alive` forwarded to the server.
    pub keep_alive: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Whole-request timeout, covering connect and the full stream.
    pub timeout: Option<Duration>,
}

impl Default for OllamaApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            model: String::new(),
            api_key: None,
            user_agent: None,
            keep_alive: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
        }
    }
}

impl OllamaApiConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}
