use serde::{Deserialize, Serialize};

/// One NDJSON line of a streamed generate response.
///
/// Ollama sends many more fields (timings, context); only the ones the client
/// acts on are modelled and the rest are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateChunk {
    pub fn is_terminal(&self) -> bool {
        self.done || self.error.is_some()
    }
}
