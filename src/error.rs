use std::path::PathBuf;

use agent_provider::{GeneratorError, GeneratorErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no workspace set; use 'set workspace <path>' first")]
    WorkspaceNotSet,

    #[error("file '{path}' not found in workspace")]
    FileNotFound { path: String },

    #[error("path escapes workspace root: {path}")]
    PathEscapesWorkspace { path: PathBuf },

    #[error("no pending proposal found with ID: {id}")]
    ProposalNotFound { id: String },

    #[error("could not allocate a unique proposal id after {attempts} attempts")]
    ProposalIdExhausted { attempts: usize },

    #[error("generator {} error: {message}", .kind.as_str())]
    GeneratorUnavailable {
        kind: GeneratorErrorKind,
        message: String,
    },

    #[error("could not parse generator intent: {0}")]
    IntentParseFailure(String),

    #[error("command exited with code {exit_code}")]
    ShellNonZeroExit {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("command timed out after {seconds}s")]
    ShellTimeout { seconds: u64 },

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AgentError {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

impl From<GeneratorError> for AgentError {
    fn from(error: GeneratorError) -> Self {
        Self::GeneratorUnavailable {
            kind: error.kind(),
            message: error.message().to_string(),
        }
    }
}
