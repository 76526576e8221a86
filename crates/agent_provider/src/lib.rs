//! Minimal provider-agnostic contract for a single text completion.
//!
//! A generator accepts a prompt plus an optional system prompt and returns the
//! completion text. This crate defines only that contract and its error types.
//! Transport details, retries and payload shapes belong to provider crates.

use std::fmt;

/// Marker that prefixes failure text produced by generators that report
/// errors in-band instead of through [`GeneratorError`].
pub const FAILURE_MARKER: &str = "❌";

/// Error returned while constructing/configuring a provider before any call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    /// Creates a new provider initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Broad classification of a failed generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorErrorKind {
    /// The backend could not be reached (connection refused, DNS, reset).
    Unavailable,
    /// The call exceeded its time budget.
    Timeout,
    /// The backend answered with a non-success status.
    Status,
    /// The backend answered but the response could not be understood.
    Malformed,
}

impl GeneratorErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Timeout => "timeout",
            Self::Status => "status",
            Self::Malformed => "malformed",
        }
    }
}

/// Error returned by [`TextGenerator::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorError {
    kind: GeneratorErrorKind,
    message: String,
}

impl GeneratorError {
    #[must_use]
    pub fn new(kind: GeneratorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(GeneratorErrorKind::Unavailable, message)
    }

    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GeneratorErrorKind::Timeout, message)
    }

    #[must_use]
    pub fn kind(&self) -> GeneratorErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generator {}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for GeneratorError {}

/// Input for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
}

impl GenerateRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Immutable metadata describing a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// Provider interface for producing one text completion.
///
/// Calls block the caller until the completion is available or the provider's
/// own time budget runs out; a timeout must surface as
/// [`GeneratorErrorKind::Timeout`], never as a hang.
pub trait TextGenerator: Send + Sync + 'static {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Produces a completion for `req`.
    fn generate(&self, req: GenerateRequest) -> Result<String, GeneratorError>;
}

/// Normalizes a generator result so in-band failure text counts as an error.
///
/// Some backends report connectivity problems as completion text starting
/// with [`FAILURE_MARKER`]; callers must never treat that as literal content.
pub fn completion_or_failure(
    result: Result<String, GeneratorError>,
) -> Result<String, GeneratorError> {
    match result {
        Ok(text) if text.trim_start().starts_with(FAILURE_MARKER) => {
            Err(GeneratorError::unavailable(text.trim().to_string()))
        }
        other => other,
    }
}
