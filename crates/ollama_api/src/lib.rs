//! Transport-only client primitives for the Ollama generate endpoint.
//!
//! This crate owns request building, NDJSON stream parsing, error mapping and
//! retry policy for `POST /api/generate`. It contains no prompt construction
//! and no knowledge of how completions are used.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod ndjson;
pub mod payload;
pub mod retry;
pub mod url;

pub use client::{GenerateResult, OllamaApiClient};
pub use config::OllamaApiConfig;
pub use error::OllamaApiError;
pub use events::GenerateChunk;
pub use ndjson::NdjsonStreamParser;
pub use payload::GeneratePayload;
pub use url::normalize_generate_url;
