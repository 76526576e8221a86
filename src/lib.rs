//! Conversational front-end for a coding assistant.
//!
//! Free-form messages are classified into a fixed set of workspace, file and
//! code actions. Generated code is staged as a proposal and only written to
//! disk after an explicit `accept <id>`.
//!
//! # Public API Overview
//! - [`Agent::chat`] handles one message end to end and always returns text.
//! - [`IntentClassifier`] maps an utterance onto an [`Action`].
//! - [`Dispatcher`] runs one action against a [`Workspace`].
//! - [`ProposalManager`] and [`ProposalStore`] own the propose/accept/reject
//!   lifecycle.
//! - [`InteractionLog`] keeps the append-only session history.
//!
//! The text generator is injected as an `agent_provider::TextGenerator`.

pub mod agent;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod intent;
pub mod logging;
pub mod proposal;
pub mod workspace;

pub use crate::agent::{Agent, AgentOptions, ACCEPT_ACTION, REJECT_ACTION};
pub use crate::config::EnvConfig;
pub use crate::dispatch::{Dispatcher, HELP_TEXT, PERSONA_SYSTEM_PROMPT};
pub use crate::error::AgentError;
pub use crate::history::{InteractionLog, InteractionRecord};
pub use crate::intent::{Action, IntentClassifier};
pub use crate::proposal::{
    parse_proposal, AcceptReport, AcceptRetention, FileUnit, ParsedProposal, Proposal,
    ProposalId, ProposalManager, ProposalStore,
};
pub use crate::workspace::{ProjectKind, ShellOutput, Workspace};
