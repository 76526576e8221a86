use std::collections::BTreeMap;

use crate::config::OllamaApiConfig;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_USER_AGENT: &str = "User-Agent";

pub const DEFAULT_USER_AGENT: &str = concat!("cintessa/", env!("CARGO_PKG_VERSION"));

/// Build a deterministic header map for generate requests.
///
/// Extra headers from the config are applied last and may override defaults.
pub fn build_headers(config: &OllamaApiConfig) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    headers.insert(HEADER_CONTENT_TYPE.to_owned(), "application/json".to_owned());
    headers.insert(HEADER_ACCEPT.to_owned(), "application/x-ndjson".to_owned());

    let user_agent = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_USER_AGENT);
    headers.insert(HEADER_USER_AGENT.to_owned(), user_agent.to_owned());

    if let Some(api_key) = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        headers.insert(HEADER_AUTHORIZATION.to_owned(), format!("Bearer {api_key}"));
    }

    for (key, value) in &config.extra_headers {
        headers.insert(key.clone(), value.clone());
    }

    headers
}
