//! Ollama-backed implementation of the shared `agent_provider` contract.
//!
//! This adapter turns one blocking `TextGenerator::generate` call into a
//! streamed `ollama_api` request and maps transport failures onto
//! [`GeneratorErrorKind`] so callers never see raw HTTP errors.

use std::sync::Arc;
use std::time::Duration;

use agent_provider::{
    GenerateRequest, GeneratorError, GeneratorErrorKind, ProviderInitError, ProviderProfile,
    TextGenerator,
};
use ollama_api::url::DEFAULT_OLLAMA_BASE_URL;
use ollama_api::{GeneratePayload, OllamaApiClient, OllamaApiConfig, OllamaApiError};
use tracing::{debug, warn};

/// Stable provider identifier used by `cintessa_cli` startup selection.
pub const OLLAMA_PROVIDER_ID: &str = "ollama";

pub const DEFAULT_OLLAMA_MODEL: &str = "qwen2:7b";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime configuration for the Ollama provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaProviderConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OllamaProviderConfig {
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn into_api_config(self) -> OllamaApiConfig {
        OllamaApiConfig::new(self.model)
            .with_base_url(self.base_url)
            .with_timeout(self.timeout)
    }
}

trait GenerateClient: Send + Sync {
    fn generate(&self, payload: &GeneratePayload) -> Result<String, OllamaApiError>;
}

#[derive(Debug)]
struct DefaultGenerateClient {
    client: OllamaApiClient,
}

impl GenerateClient for DefaultGenerateClient {
    fn generate(&self, payload: &GeneratePayload) -> Result<String, OllamaApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                OllamaApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime
            .block_on(self.client.generate(payload))
            .map(|result| result.text)
    }
}

/// `TextGenerator` adapter backed by `ollama_api` transport primitives.
pub struct OllamaProvider {
    model_id: String,
    timeout: Duration,
    client: Arc<dyn GenerateClient>,
}

impl OllamaProvider {
    /// Creates a provider using real Ollama transport.
    pub fn new(config: OllamaProviderConfig) -> Result<Self, ProviderInitError> {
        let model_id = config.model.trim().to_string();
        if model_id.is_empty() {
            return Err(ProviderInitError::new(
                "Failed to initialize ollama provider: model is required",
            ));
        }
        if config.timeout.is_zero() {
            return Err(ProviderInitError::new(
                "Failed to initialize ollama provider: timeout must be greater than zero",
            ));
        }

        let timeout = config.timeout;
        let client = Arc::new(DefaultGenerateClient {
            client: OllamaApiClient::new(config.into_api_config()).map_err(map_init_error)?,
        });

        Ok(Self {
            model_id,
            timeout,
            client,
        })
    }

    #[cfg(test)]
    fn with_client_for_tests(model_id: &str, client: Arc<dyn GenerateClient>) -> Self {
        Self {
            model_id: model_id.to_string(),
            timeout: DEFAULT_TIMEOUT,
            client,
        }
    }
}

impl TextGenerator for OllamaProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: OLLAMA_PROVIDER_ID.to_string(),
            model_id: self.model_id.clone(),
        }
    }

    fn generate(&self, req: GenerateRequest) -> Result<String, GeneratorError> {
        let payload = GeneratePayload::new(self.model_id.clone(), req.prompt, req.system_prompt);
        debug!(model = %self.model_id, "sending generate request");

        self.client.generate(&payload).map_err(|error| {
            let mapped = map_generate_error(&error, self.timeout);
            warn!(kind = mapped.kind().as_str(), %error, "ollama generate failed");
            mapped
        })
    }
}

fn map_generate_error(error: &OllamaApiError, timeout: Duration) -> GeneratorError {
    if error.is_timeout() {
        return GeneratorError::timeout(format!(
            "Ollama did not answer within {}s",
            timeout.as_secs()
        ));
    }

    let kind = match error {
        OllamaApiError::Status(..) | OllamaApiError::RetryExhausted { .. } => {
            GeneratorErrorKind::Status
        }
        OllamaApiError::MalformedChunk(_)
        | OllamaApiError::Serde(_)
        | OllamaApiError::StreamFailed(_)
        | OllamaApiError::IncompleteStream => GeneratorErrorKind::Malformed,
        _ => GeneratorErrorKind::Unavailable,
    };

    GeneratorError::new(
        kind,
        format!(
            "Error connecting to Ollama: {error}. Make sure Ollama is running and the model is installed."
        ),
    )
}

fn map_init_error(error: OllamaApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize ollama provider: {error}"))
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard};

    use super::*;

    fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    struct FakeGenerateClient {
        observed: Mutex<Option<GeneratePayload>>,
        outcome: Mutex<Option<Result<String, OllamaApiError>>>,
    }

    impl FakeGenerateClient {
        fn new(outcome: Result<String, OllamaApiError>) -> Arc<Self> {
            Arc::new(Self {
                observed: Mutex::new(None),
                outcome: Mutex::new(Some(outcome)),
            })
        }

        fn observed(&self) -> Option<GeneratePayload> {
            lock_unpoisoned(&self.observed).clone()
        }
    }

    impl GenerateClient for FakeGenerateClient {
        fn generate(&self, payload: &GeneratePayload) -> Result<String, OllamaApiError> {
            *lock_unpoisoned(&self.observed) = Some(payload.clone());
            lock_unpoisoned(&self.outcome)
                .take()
                .expect("fake outcome should be consumed exactly once")
        }
    }

    #[test]
    fn profile_reports_ollama_provider_id_and_model() {
        let client = FakeGenerateClient::new(Ok(String::new()));
        let provider = OllamaProvider::with_client_for_tests("qwen2:7b", client);

        let profile = provider.profile();
        assert_eq!(profile.provider_id, OLLAMA_PROVIDER_ID);
        assert_eq!(profile.model_id, "qwen2:7b");
    }

    #[test]
    fn generate_forwards_prompt_system_prompt_and_model() {
        let client = FakeGenerateClient::new(Ok("print('hi')".to_string()));
        let provider = OllamaProvider::with_client_for_tests(
            "qwen2:7b",
            Arc::clone(&client) as Arc<dyn GenerateClient>,
        );

        let text = provider
            .generate(GenerateRequest::new("write hello").with_system_prompt("be terse"))
            .expect("fake generate should succeed");

        assert_eq!(text, "print('hi')");
        let payload = client.observed().expect("payload should be observed");
        assert_eq!(payload.model, "qwen2:7b");
        assert_eq!(payload.prompt, "write hello");
        assert_eq!(payload.system.as_deref(), Some("be terse"));
    }

    #[test]
    fn stream_failures_map_to_malformed() {
        let client = FakeGenerateClient::new(Err(OllamaApiError::IncompleteStream));
        let provider = OllamaProvider::with_client_for_tests("m", client);

        let error = provider
            .generate(GenerateRequest::new("x"))
            .expect_err("incomplete stream should fail");
        assert_eq!(error.kind(), GeneratorErrorKind::Malformed);
        assert!(error.message().contains("Error connecting to Ollama"));
    }

    #[test]
    fn retry_exhaustion_maps_to_status() {
        let client = FakeGenerateClient::new(Err(OllamaApiError::RetryExhausted {
            status: None,
            last_error: Some("overloaded".to_string()),
        }));
        let provider = OllamaProvider::with_client_for_tests("m", client);

        let error = provider
            .generate(GenerateRequest::new("x"))
            .expect_err("retry exhaustion should fail");
        assert_eq!(error.kind(), GeneratorErrorKind::Status);
    }

    #[test]
    fn unknown_transport_errors_map_to_unavailable() {
        let client = FakeGenerateClient::new(Err(OllamaApiError::Unknown("boom".to_string())));
        let provider = OllamaProvider::with_client_for_tests("m", client);

        let error = provider
            .generate(GenerateRequest::new("x"))
            .expect_err("unknown error should fail");
        assert_eq!(error.kind(), GeneratorErrorKind::Unavailable);
        assert!(error.message().contains("Make sure Ollama is running"));
    }

    #[test]
    fn blank_model_is_rejected_at_construction() {
        let error = OllamaProvider::new(OllamaProviderConfig::new("   "))
            .err()
            .expect("blank model should fail");
        assert!(error.message().contains("model is required"));
    }

    #[test]
    fn zero_timeout_is_rejected_at_construction() {
        let config = OllamaProviderConfig::default().with_timeout(Duration::ZERO);
        let error = OllamaProvider::new(config)
            .err()
            .expect("zero timeout should fail");
        assert!(error.message().contains("timeout"));
    }

    #[test]
    fn default_config_points_at_local_server() {
        let config = OllamaProviderConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, DEFAULT_OLLAMA_MODEL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }
}
