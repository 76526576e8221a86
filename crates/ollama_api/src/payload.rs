use serde::{Deserialize, Serialize};

/// Request body for `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratePayload {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Default: true. The client always streams.
    #[serde(default = "default_true")]
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

fn default_true() -> bool {
    true
}

impl GeneratePayload {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, system: Option<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system,
            stream: true,
            keep_alive: None,
            options: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.options
            .get_or_insert_with(GenerateOptions::default)
            .temperature = Some(temperature);
        self
    }
}

/// Sampling options forwarded as `options`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i64>,
}
