//! Top-level chat facade: accept/reject commands, classification, dispatch
//! and the interaction log.

use std::sync::Arc;
use std::time::Duration;

use agent_provider::{ProviderProfile, TextGenerator};
use serde_json::{json, Value};
use tracing::info;

use crate::config::EnvConfig;
use crate::dispatch::{render_error, Dispatcher};
use crate::error::AgentError;
use crate::history::{InteractionLog, InteractionRecord};
use crate::intent::{Action, IntentClassifier};
use crate::proposal::{AcceptRetention, Proposal, ProposalManager, ProposalStore};
use crate::workspace::{Workspace, DEFAULT_SHELL_TIMEOUT};

pub const ACCEPT_ACTION: &str = "accept_proposal";
pub const REJECT_ACTION: &str = "reject_proposal";

/// Startup options for an [`Agent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    pub workspace: Option<String>,
    pub retention: AcceptRetention,
    pub shell_timeout: Duration,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            workspace: None,
            retention: AcceptRetention::ConsumeAlways,
            shell_timeout: DEFAULT_SHELL_TIMEOUT,
        }
    }
}

impl From<&EnvConfig> for AgentOptions {
    fn from(config: &EnvConfig) -> Self {
        Self {
            workspace: config.workspace.clone(),
            retention: if config.retain_failed_proposals {
                AcceptRetention::RetainOnFailure
            } else {
                AcceptRetention::ConsumeAlways
            },
            shell_timeout: config.shell_timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ProposalCommand {
    Accept(Option<String>),
    Reject(Option<String>),
}

/// Recognizes `accept <id>` / `reject <id>` (case-insensitive command word).
fn parse_proposal_command(message: &str) -> Option<ProposalCommand> {
    let mut tokens = message.split_whitespace();
    let command = tokens.next()?.to_ascii_lowercase();
    let id = tokens.next().map(str::to_string);

    match command.as_str() {
        "accept" => Some(ProposalCommand::Accept(id)),
        "reject" => Some(ProposalCommand::Reject(id)),
        _ => None,
    }
}

pub struct Agent {
    workspace: Workspace,
    generator: Arc<dyn TextGenerator>,
    classifier: IntentClassifier,
    dispatcher: Dispatcher,
    log: InteractionLog,
}

impl Agent {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::assemble(
            generator,
            Arc::new(ProposalStore::new()),
            Workspace::new(),
            AcceptRetention::default(),
        )
    }

    /// Builds an agent from options, setting the initial workspace if given.
    pub fn with_options(
        generator: Arc<dyn TextGenerator>,
        options: AgentOptions,
    ) -> Result<Self, AgentError> {
        Self::with_store(generator, Arc::new(ProposalStore::new()), options)
    }

    /// Like [`Agent::with_options`] but sharing an existing proposal store.
    pub fn with_store(
        generator: Arc<dyn TextGenerator>,
        store: Arc<ProposalStore>,
        options: AgentOptions,
    ) -> Result<Self, AgentError> {
        let mut workspace = Workspace::new().with_shell_timeout(options.shell_timeout);
        if let Some(path) = options.workspace.as_deref() {
            workspace.set_root(path)?;
        }
        Ok(Self::assemble(generator, store, workspace, options.retention))
    }

    fn assemble(
        generator: Arc<dyn TextGenerator>,
        store: Arc<ProposalStore>,
        workspace: Workspace,
        retention: AcceptRetention,
    ) -> Self {
        let proposals =
            ProposalManager::new(Arc::clone(&generator), store).with_retention(retention);
        Self {
            workspace,
            classifier: IntentClassifier::new(Arc::clone(&generator)),
            dispatcher: Dispatcher::new(Arc::clone(&generator), proposals),
            generator,
            log: InteractionLog::new(),
        }
    }

    /// Handles one chat message and records exactly one interaction.
    pub fn chat(&mut self, message: &str) -> String {
        let (action, params, result) = match parse_proposal_command(message) {
            Some(command) => self.run_proposal_command(command),
            None => {
                let action = self.classifier.classify(message);
                let result = self.dispatcher.dispatch(&mut self.workspace, &action);
                (action.name().to_string(), action.params_json(), result)
            }
        };

        self.log.append(InteractionRecord {
            input: message.to_string(),
            action,
            params,
            result: result.clone(),
        });
        result
    }

    pub fn classify(&self, message: &str) -> Action {
        self.classifier.classify(message)
    }

    fn run_proposal_command(&self, command: ProposalCommand) -> (String, Value, String) {
        let proposals = self.dispatcher.proposals();
        match command {
            ProposalCommand::Accept(None) => (
                ACCEPT_ACTION.to_string(),
                json!({}),
                "Usage: accept <proposal id>".to_string(),
            ),
            ProposalCommand::Reject(None) => (
                REJECT_ACTION.to_string(),
                json!({}),
                "Usage: reject <proposal id>".to_string(),
            ),
            ProposalCommand::Accept(Some(id)) => {
                let result = match proposals.accept(&id, &self.workspace) {
                    Ok(report) => report.render(),
                    Err(error) => render_error(&error),
                };
                (ACCEPT_ACTION.to_string(), json!({ "proposal_id": id }), result)
            }
            ProposalCommand::Reject(Some(id)) => {
                let result = match proposals.reject(&id) {
                    Ok(proposal) => {
                        info!(id = %proposal.id, "proposal discarded by user");
                        format!("Proposal {} rejected and discarded.", proposal.id)
                    }
                    Err(error) => render_error(&error),
                };
                (REJECT_ACTION.to_string(), json!({ "proposal_id": id }), result)
            }
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn profile(&self) -> ProviderProfile {
        self.generator.profile()
    }

    pub fn history(&self) -> Vec<InteractionRecord> {
        self.log.snapshot()
    }

    pub fn pending_proposals(&self) -> Vec<Proposal> {
        self.dispatcher.proposals().store().pending()
    }

    pub fn retention(&self) -> AcceptRetention {
        self.dispatcher.proposals().retention()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_commands_are_case_insensitive() {
        assert_eq!(
            parse_proposal_command("ACCEPT abc123"),
            Some(ProposalCommand::Accept(Some("abc123".to_string())))
        );
        assert_eq!(
            parse_proposal_command("  reject   abc123 now"),
            Some(ProposalCommand::Reject(Some("abc123".to_string())))
        );
        assert_eq!(
            parse_proposal_command("accept"),
            Some(ProposalCommand::Accept(None))
        );
    }

    #[test]
    fn other_messages_are_not_proposal_commands() {
        assert_eq!(parse_proposal_command("acceptance tests please"), None);
        assert_eq!(parse_proposal_command("please accept abc"), None);
        assert_eq!(parse_proposal_command(""), None);
    }

    #[test]
    fn options_follow_env_config() {
        let config = EnvConfig {
            workspace: Some("/tmp/ws".to_string()),
            retain_failed_proposals: true,
            shell_timeout: Duration::from_secs(5),
            log_filter: None,
        };

        let options = AgentOptions::from(&config);
        assert_eq!(options.workspace.as_deref(), Some("/tmp/ws"));
        assert_eq!(options.retention, AcceptRetention::RetainOnFailure);
        assert_eq!(options.shell_timeout, Duration::from_secs(5));
    }
}
