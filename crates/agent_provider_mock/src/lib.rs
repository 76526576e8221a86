//! Deterministic mock implementation of the shared `agent_provider` contract.
//!
//! This crate contains no transport logic and is intended for offline runs and
//! contract-level testing. Replies are served from a script in order; once the
//! script is exhausted every call receives the fallback reply.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use agent_provider::{GenerateRequest, GeneratorError, ProviderProfile, TextGenerator};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

const DEFAULT_FALLBACK_REPLY: &str = "Mock response. Configure a real provider for live answers.";

/// Deterministic scripted generator used by tests and offline runs.
#[derive(Debug)]
pub struct MockGenerator {
    model_id: String,
    script: Mutex<VecDeque<Result<String, GeneratorError>>>,
    fallback: Result<String, GeneratorError>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockGenerator {
    /// Creates a mock that answers with `replies` in order, then the default fallback.
    #[must_use]
    pub fn new(replies: Vec<String>) -> Self {
        Self::with_script(replies.into_iter().map(Ok).collect())
    }

    /// Creates a mock from an explicit script of successes and failures.
    #[must_use]
    pub fn with_script(script: Vec<Result<String, GeneratorError>>) -> Self {
        Self {
            model_id: "mock".to_string(),
            script: Mutex::new(script.into()),
            fallback: Ok(DEFAULT_FALLBACK_REPLY.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock whose every call fails with `error`.
    #[must_use]
    pub fn failing(error: GeneratorError) -> Self {
        Self::with_script(Vec::new()).with_fallback(Err(error))
    }

    /// Replaces the reply served after the script is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Result<String, GeneratorError>) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        let model_id = model_id.into();
        let trimmed = model_id.trim();
        if !trimmed.is_empty() {
            self.model_id = trimmed.to_string();
        }
        self
    }

    /// Appends one more scripted reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        lock_unpoisoned(&self.script).push_back(Ok(reply.into()));
    }

    /// Returns every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<GenerateRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        lock_unpoisoned(&self.requests).len()
    }

    /// Number of scripted replies not yet consumed.
    #[must_use]
    pub fn remaining_replies(&self) -> usize {
        lock_unpoisoned(&self.script).len()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TextGenerator for MockGenerator {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: self.model_id.clone(),
        }
    }

    fn generate(&self, req: GenerateRequest) -> Result<String, GeneratorError> {
        lock_unpoisoned(&self.requests).push(req);
        lock_unpoisoned(&self.script)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use agent_provider::GeneratorErrorKind;

    use super::*;

    #[test]
    fn profile_exposes_explicit_mock_provider_identity() {
        let profile = MockGenerator::default().profile();

        assert_eq!(profile.provider_id, MOCK_PROVIDER_ID);
        assert_eq!(profile.model_id, "mock");
    }

    #[test]
    fn blank_model_override_keeps_default() {
        let generator = MockGenerator::default().with_model_id("   ");
        assert_eq!(generator.profile().model_id, "mock");

        let generator = MockGenerator::default().with_model_id("mock-alt");
        assert_eq!(generator.profile().model_id, "mock-alt");
    }

    #[test]
    fn script_is_served_in_order_then_fallback() {
        let generator = MockGenerator::new(vec!["one".to_string(), "two".to_string()]);

        assert_eq!(generator.generate(GenerateRequest::new("a")), Ok("one".to_string()));
        assert_eq!(generator.generate(GenerateRequest::new("b")), Ok("two".to_string()));
        assert_eq!(
            generator.generate(GenerateRequest::new("c")),
            Ok(DEFAULT_FALLBACK_REPLY.to_string())
        );
        assert_eq!(generator.remaining_replies(), 0);
    }

    #[test]
    fn requests_are_recorded_with_system_prompt() {
        let generator = MockGenerator::default();
        let _ = generator.generate(GenerateRequest::new("hello").with_system_prompt("sys"));

        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "hello");
        assert_eq!(requests[0].system_prompt.as_deref(), Some("sys"));
    }

    #[test]
    fn failing_mock_always_errors() {
        let generator = MockGenerator::failing(GeneratorError::unavailable("connection refused"));

        for _ in 0..2 {
            let error = generator
                .generate(GenerateRequest::new("x"))
                .expect_err("failing mock must error");
            assert_eq!(error.kind(), GeneratorErrorKind::Unavailable);
        }
        assert_eq!(generator.request_count(), 2);
    }

    #[test]
    fn pushed_replies_extend_the_script() {
        let generator = MockGenerator::default();
        generator.push_reply("late");

        assert_eq!(generator.generate(GenerateRequest::new("x")), Ok("late".to_string()));
    }
}
