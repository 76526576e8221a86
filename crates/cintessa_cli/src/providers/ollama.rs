use std::path::Path;
use std::time::Duration;

use agent_provider_ollama::OllamaProviderConfig;
use serde::Deserialize;
use tracing::debug;

pub const OLLAMA_CONFIG_PATH_ENV_VAR: &str = "CINTESSA_OLLAMA_CONFIG_PATH";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OllamaConfigFile {
    base_url: Option<String>,
    model: Option<String>,
    timeout_sec: Option<u64>,
}

/// Loads the provider config from `path`, or the defaults when no path is set.
pub fn load_ollama_config(path: Option<&str>) -> Result<OllamaProviderConfig, String> {
    let Some(path) = path else {
        return Ok(OllamaProviderConfig::default());
    };

    let raw = std::fs::read_to_string(Path::new(path)).map_err(|error| {
        format!("Failed to read {OLLAMA_CONFIG_PATH_ENV_VAR} file '{path}': {error}")
    })?;
    debug!(path, "loaded ollama config file");
    parse_ollama_config(&raw)
        .map_err(|error| format!("Invalid ollama config in '{path}': {error}"))
}

pub fn parse_ollama_config(raw: &str) -> Result<OllamaProviderConfig, String> {
    let file: OllamaConfigFile = serde_json::from_str(raw).map_err(|error| error.to_string())?;
    let mut config = OllamaProviderConfig::default();

    if let Some(base_url) = file.base_url {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        config = config.with_base_url(trimmed);
    }

    if let Some(model) = file.model {
        let trimmed = model.trim();
        if trimmed.is_empty() {
            return Err("model must not be empty".to_string());
        }
        config.model = trimmed.to_string();
    }

    match file.timeout_sec {
        Some(0) => return Err("timeout_sec must be greater than zero".to_string()),
        Some(seconds) => config = config.with_timeout(Duration::from_secs(seconds)),
        None => {}
    }

    Ok(config)
}
