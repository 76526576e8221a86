use std::sync::Arc;

use agent_provider::TextGenerator;
use agent_provider_mock::{MockGenerator, MOCK_PROVIDER_ID};
use agent_provider_ollama::{OllamaProvider, OLLAMA_PROVIDER_ID};

mod ollama;

pub use ollama::{load_ollama_config, parse_ollama_config, OLLAMA_CONFIG_PATH_ENV_VAR};

pub const DEFAULT_PROVIDER_ID: &str = OLLAMA_PROVIDER_ID;
pub const PROVIDER_ENV_VAR: &str = "CINTESSA_PROVIDER";

pub fn provider_from_env() -> Result<Arc<dyn TextGenerator>, String> {
    let provider_id = std::env::var(PROVIDER_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    provider_for_id(provider_id.as_deref().unwrap_or(DEFAULT_PROVIDER_ID))
}

pub fn provider_for_id(provider_id: &str) -> Result<Arc<dyn TextGenerator>, String> {
    match provider_id {
        OLLAMA_PROVIDER_ID => {
            let config_path = std::env::var(OLLAMA_CONFIG_PATH_ENV_VAR)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
            let config = load_ollama_config(config_path.as_deref())?;
            let provider = OllamaProvider::new(config).map_err(|error| error.to_string())?;
            Ok(Arc::new(provider))
        }
        MOCK_PROVIDER_ID => Ok(Arc::new(MockGenerator::new(Vec::new()))),
        unknown => Err(format!(
            "Unsupported provider '{unknown}'. Available providers: {OLLAMA_PROVIDER_ID}, {MOCK_PROVIDER_ID}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_for_id_supports_mock() {
        let provider = provider_for_id("mock").expect("mock provider should resolve");
        assert_eq!(provider.profile().provider_id, "mock");
    }

    #[test]
    fn provider_for_id_rejects_unknown_provider() {
        let error = match provider_for_id("custom") {
            Ok(_) => panic!("unknown providers should fail"),
            Err(error) => error,
        };

        assert!(error.contains("Unsupported provider 'custom'"));
        assert!(error.contains("ollama, mock"));
    }
}
