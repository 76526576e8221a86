//! Maps free-form utterances onto [`Action`]s.
//!
//! Resolution runs in three stages: deterministic phrase routing, then a
//! generator-backed JSON classification for anything unrouted, then an
//! unconditional override that sends greetings to `ask_question`.
//! Classification never fails; every internal error degrades to
//! `ask_question` carrying the full utterance.

pub mod action;
pub mod fallback;
pub mod routing;

use std::sync::Arc;

use agent_provider::TextGenerator;
use tracing::{debug, warn};

pub use action::Action;

#[derive(Clone)]
pub struct IntentClassifier {
    generator: Arc<dyn TextGenerator>,
}

impl IntentClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn classify(&self, utterance: &str) -> Action {
        let resolved = match routing::route(utterance) {
            Some(action) => action,
            None => match fallback::classify(self.generator.as_ref(), utterance) {
                Ok(action) => {
                    debug!(action = action.name(), "generator classified utterance");
                    action
                }
                Err(error) => {
                    warn!(%error, "intent fallback failed; treating as question");
                    Action::ask(utterance)
                }
            },
        };

        if routing::is_conversational(utterance) {
            debug!(overridden = resolved.name(), "conversational override");
            return Action::ask(utterance);
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use agent_provider_mock::MockGenerator;
    use pretty_assertions::assert_eq;

    use super::*;

    fn classifier(replies: &[&str]) -> (IntentClassifier, Arc<MockGenerator>) {
        let generator = Arc::new(MockGenerator::new(
            replies.iter().map(|reply| reply.to_string()).collect(),
        ));
        (
            IntentClassifier::new(Arc::clone(&generator) as Arc<dyn TextGenerator>),
            generator,
        )
    }

    #[test]
    fn routed_utterances_skip_the_generator() {
        let (classifier, generator) = classifier(&[]);

        assert_eq!(
            classifier.classify("set workspace at ./demo"),
            Action::SetWorkspace {
                path: "./demo".to_string()
            }
        );
        assert_eq!(generator.request_count(), 0);
    }

    #[test]
    fn unrouted_utterances_use_generator_json() {
        let (classifier, generator) = classifier(&[
            r#"{"action": "write_file", "params": {"file_path": "a.txt", "content": "x"}}"#,
        ]);

        assert_eq!(
            classifier.classify("put x into a.txt"),
            Action::WriteFile {
                file_path: "a.txt".to_string(),
                content: "x".to_string(),
            }
        );
        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].system_prompt.as_deref(),
            Some(fallback::PARSER_SYSTEM_PROMPT)
        );
    }

    #[test]
    fn greeting_keeps_the_users_words_over_a_rewritten_question() {
        let (classifier, _) = classifier(&[
            r#"{"action": "ask_question", "params": {"question": "User greets the assistant"}}"#,
        ]);

        assert_eq!(classifier.classify("hi"), Action::ask("hi"));
    }

    #[test]
    fn generator_garbage_degrades_to_question() {
        let (classifier, _) = classifier(&["I think you want to list files"]);

        assert_eq!(
            classifier.classify("what's in here"),
            Action::ask("what's in here")
        );
    }

    #[test]
    fn greeting_overrides_confident_generator_answer() {
        let (classifier, _) =
            classifier(&[r#"{"action": "run_command", "params": {"command": "rm -rf /"}}"#]);

        assert_eq!(classifier.classify("hey there"), Action::ask("hey there"));
    }
}
