use std::path::PathBuf;
use std::sync::Arc;

use agent_provider::{completion_or_failure, GenerateRequest, TextGenerator};
use tracing::{info, warn};

use super::parser::{parse_proposal, SkippedSection};
use super::store::{Proposal, ProposalId, ProposalStore};
use crate::error::AgentError;
use crate::workspace::Workspace;

pub const CODER_SYSTEM_PROMPT: &str = "You are a helpful AI coding assistant. Provide clean, working code with clear explanations. Always specify the filename.";

/// What happens to a proposal after `accept` when some writes failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptRetention {
    /// Accept is one-shot: the proposal is removed whatever the outcome.
    #[default]
    ConsumeAlways,
    /// A proposal with at least one failed write goes back into the store.
    RetainOnFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Written { path: PathBuf },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWriteOutcome {
    pub file_path: String,
    pub outcome: FileOutcome,
}

impl FileWriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self.outcome, FileOutcome::Written { .. })
    }
}

/// Per-file result of accepting one proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptReport {
    pub id: ProposalId,
    pub outcomes: Vec<FileWriteOutcome>,
    pub skipped: Vec<SkippedSection>,
    pub explanation: Option<String>,
    /// True when the proposal was put back into the store for another try.
    pub retained: bool,
}

impl AcceptReport {
    pub fn written_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_written())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.written_count()
    }

    pub fn render(&self) -> String {
        if self.outcomes.is_empty() && self.skipped.is_empty() {
            return format!("No files found in proposal {}. Nothing was written.", self.id);
        }

        let mut lines = vec![format!("Applying proposal {}", self.id), String::new()];
        for outcome in &self.outcomes {
            match &outcome.outcome {
                FileOutcome::Written { .. } => {
                    lines.push(format!("- {}: created successfully", outcome.file_path));
                }
                FileOutcome::Failed { error } => {
                    lines.push(format!("- {}: error: {error}", outcome.file_path));
                }
            }
        }
        for skipped in &self.skipped {
            let path = if skipped.file_path.is_empty() {
                "(unnamed)"
            } else {
                skipped.file_path.as_str()
            };
            lines.push(format!("- {path}: skipped ({})", skipped.reason));
        }

        lines.push(String::new());
        lines.push(format!(
            "{} of {} files written.",
            self.written_count(),
            self.outcomes.len()
        ));
        if self.retained {
            lines.push(format!(
                "Proposal kept; fix the problem and run `accept {}` again.",
                self.id
            ));
        }
        lines.join("\n")
    }
}

/// Creates, applies and discards proposals.
pub struct ProposalManager {
    generator: Arc<dyn TextGenerator>,
    store: Arc<ProposalStore>,
    retention: AcceptRetention,
}

impl ProposalManager {
    pub fn new(generator: Arc<dyn TextGenerator>, store: Arc<ProposalStore>) -> Self {
        Self {
            generator,
            store,
            retention: AcceptRetention::default(),
        }
    }

    pub fn with_retention(mut self, retention: AcceptRetention) -> Self {
        self.retention = retention;
        self
    }

    pub fn retention(&self) -> AcceptRetention {
        self.retention
    }

    pub fn store(&self) -> &Arc<ProposalStore> {
        &self.store
    }

    /// Asks the generator for code and stages the answer. Nothing is written.
    pub fn propose(&self, user_request: &str) -> Result<Proposal, AgentError> {
        let request = GenerateRequest::new(build_propose_prompt(user_request))
            .with_system_prompt(CODER_SYSTEM_PROMPT);
        let content = completion_or_failure(self.generator.generate(request)).map_err(|error| {
            warn!(%error, "code generation failed; no proposal stored");
            AgentError::from(error)
        })?;

        let proposal = self.store.insert(user_request, content)?;
        info!(id = %proposal.id, "proposal created");
        Ok(proposal)
    }

    /// Takes the proposal out of the store and writes every parsed file.
    pub fn accept(&self, id: &str, workspace: &Workspace) -> Result<AcceptReport, AgentError> {
        let proposal = self.store.take(id)?;
        let parsed = parse_proposal(&proposal.raw_content);

        for skipped in &parsed.skipped {
            warn!(id = %proposal.id, path = %skipped.file_path, reason = %skipped.reason, "proposal section skipped");
        }

        let outcomes: Vec<FileWriteOutcome> = parsed
            .files
            .into_iter()
            .map(|unit| {
                let outcome = match workspace.write_file(&unit.file_path, &unit.content) {
                    Ok(path) => FileOutcome::Written { path },
                    Err(error) => FileOutcome::Failed {
                        error: error.to_string(),
                    },
                };
                FileWriteOutcome {
                    file_path: unit.file_path,
                    outcome,
                }
            })
            .collect();

        let any_failed = outcomes.iter().any(|outcome| !outcome.is_written());
        let id = proposal.id.clone();
        let retained = match self.retention {
            AcceptRetention::RetainOnFailure if any_failed => self.store.restore(proposal),
            _ => false,
        };

        let report = AcceptReport {
            id,
            outcomes,
            skipped: parsed.skipped,
            explanation: parsed.explanation,
            retained,
        };
        info!(
            id = %report.id,
            written = report.written_count(),
            failed = report.failed_count(),
            retained,
            "proposal accepted"
        );
        Ok(report)
    }

    /// Discards the proposal without touching any file.
    pub fn reject(&self, id: &str) -> Result<Proposal, AgentError> {
        let proposal = self.store.take(id)?;
        info!(id = %proposal.id, "proposal rejected");
        Ok(proposal)
    }
}

pub fn build_propose_prompt(user_request: &str) -> String {
    format!(
        r#"The user requested: "{user_request}"

Analyze the request and generate appropriate code. Consider:
- Which files need to be created or modified
- Which functions or types are needed
- Idiomatic style for the language involved
- Helpful comments

Provide every file in this format:
FILE: relative/path/to/file
```language
code here
```

After all files, add one line:
EXPLANATION: briefly explain what the code does and why it is needed."#
    )
}

/// Preview shown to the user when a proposal is staged.
pub fn render_proposal(proposal: &Proposal) -> String {
    format!(
        "Code Proposal (ID: `{id}`)\n\nRequest: {request}\n\n---\n\n{content}\n\n---\n\nUse this ID to accept: `accept {id}` or `reject {id}`",
        id = proposal.id,
        request = proposal.user_request,
        content = proposal.raw_content,
    )
}

#[cfg(test)]
mod tests {
    use agent_provider::GeneratorError;
    use agent_provider_mock::MockGenerator;

    use super::*;

    fn manager(generator: MockGenerator) -> ProposalManager {
        ProposalManager::new(Arc::new(generator), Arc::new(ProposalStore::new()))
    }

    #[test]
    fn propose_sends_coder_prompt_and_stores_content() {
        let generator = Arc::new(MockGenerator::new(vec!["FILE: a.py".to_string()]));
        let manager = ProposalManager::new(
            Arc::clone(&generator) as Arc<dyn TextGenerator>,
            Arc::new(ProposalStore::new()),
        );

        let proposal = manager.propose("add a greeter").expect("propose should succeed");

        assert_eq!(proposal.raw_content, "FILE: a.py");
        assert_eq!(proposal.user_request, "add a greeter");
        assert!(manager.store().contains(proposal.id.as_str()));

        let request = &generator.requests()[0];
        assert!(request.prompt.contains("The user requested: \"add a greeter\""));
        assert_eq!(request.system_prompt.as_deref(), Some(CODER_SYSTEM_PROMPT));
    }

    #[test]
    fn generator_failure_stores_nothing() {
        let manager = manager(MockGenerator::failing(GeneratorError::unavailable(
            "connection refused",
        )));

        let error = manager.propose("anything").expect_err("generator is down");
        assert!(matches!(error, AgentError::GeneratorUnavailable { .. }));
        assert!(manager.store().is_empty());
    }

    #[test]
    fn failure_marker_text_is_not_a_proposal() {
        let manager = manager(MockGenerator::new(vec![
            "❌ Error connecting to Ollama: refused".to_string(),
        ]));

        assert!(manager.propose("anything").is_err());
        assert!(manager.store().is_empty());
    }

    #[test]
    fn render_proposal_embeds_id_and_content() {
        let store = ProposalStore::new();
        let proposal = store.insert("req", "BODY").expect("insert");

        let rendered = render_proposal(&proposal);
        assert!(rendered.starts_with(&format!("Code Proposal (ID: `{}`)", proposal.id)));
        assert!(rendered.contains("\n\nBODY\n\n"));
        assert!(rendered.ends_with(&format!(
            "`accept {0}` or `reject {0}`",
            proposal.id
        )));
    }

    #[test]
    fn report_render_lists_each_file() {
        let report = AcceptReport {
            id: ProposalId::new("abcd1234"),
            outcomes: vec![
                FileWriteOutcome {
                    file_path: "a.py".to_string(),
                    outcome: FileOutcome::Written {
                        path: PathBuf::from("/ws/a.py"),
                    },
                },
                FileWriteOutcome {
                    file_path: "b.py".to_string(),
                    outcome: FileOutcome::Failed {
                        error: "denied".to_string(),
                    },
                },
            ],
            skipped: Vec::new(),
            explanation: None,
            retained: false,
        };

        let rendered = report.render();
        assert!(rendered.contains("- a.py: created successfully"));
        assert!(rendered.contains("- b.py: error: denied"));
        assert!(rendered.contains("1 of 2 files written."));
        assert!(!rendered.contains("Proposal kept"));
    }
}
