use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::AgentError;

/// One resolved user intent with its typed parameters.
///
/// The serialized form is `{"action": "<name>", "params": {...}}`, the same
/// shape the generator fallback is asked to produce. Missing parameters take
/// their defaults instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum Action {
    SetWorkspace {
        #[serde(default = "default_workspace_path")]
        path: String,
    },
    CreateDirectory {
        #[serde(default = "default_directory_path")]
        path: String,
    },
    CreateProject {
        #[serde(default = "default_project_name")]
        project_name: String,
        #[serde(default = "default_project_type")]
        project_type: String,
    },
    ReadFile {
        #[serde(default)]
        file_path: String,
    },
    WriteFile {
        #[serde(default)]
        file_path: String,
        #[serde(default)]
        content: String,
    },
    ListFiles {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    RunCommand {
        #[serde(default)]
        command: String,
    },
    ProposeCode {
        #[serde(default)]
        user_request: String,
    },
    SmokeTest {},
    RunApp {},
    ShowHelp {},
    AskQuestion {
        #[serde(default)]
        question: String,
    },
}

pub(crate) fn default_workspace_path() -> String {
    ".".to_string()
}

pub(crate) fn default_directory_path() -> String {
    "new_folder".to_string()
}

pub(crate) fn default_project_name() -> String {
    "new_project".to_string()
}

pub(crate) fn default_project_type() -> String {
    "basic".to_string()
}

impl Action {
    pub fn ask(question: impl Into<String>) -> Self {
        Self::AskQuestion {
            question: question.into(),
        }
    }

    /// Builds an action from a loose `(name, params)` pair. `params` may be
    /// `null` or omit keys, and `null` values count as missing; unknown names
    /// and mistyped values are rejected.
    pub fn from_parts(name: &str, params: Value) -> Result<Self, AgentError> {
        let params = match params {
            Value::Null => Value::Object(Map::new()),
            Value::Object(mut fields) => {
                fields.retain(|_, value| !value.is_null());
                Value::Object(fields)
            }
            other => other,
        };

        serde_json::from_value(json!({ "action": name.trim(), "params": params }))
            .map_err(|error| AgentError::IntentParseFailure(format!("{name}: {error}")))
    }

    /// The snake_case action name used on the wire and in the interaction log.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetWorkspace { .. } => "set_workspace",
            Self::CreateDirectory { .. } => "create_directory",
            Self::CreateProject { .. } => "create_project",
            Self::ReadFile { .. } => "read_file",
            Self::WriteFile { .. } => "write_file",
            Self::ListFiles { .. } => "list_files",
            Self::RunCommand { .. } => "run_command",
            Self::ProposeCode { .. } => "propose_code",
            Self::SmokeTest {} => "smoke_test",
            Self::RunApp {} => "run_app",
            Self::ShowHelp {} => "show_help",
            Self::AskQuestion { .. } => "ask_question",
        }
    }

    pub fn params_json(&self) -> Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|mut value| value.get_mut("params").map(Value::take))
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Fills free-text parameters the generator left empty with the original
    /// utterance.
    pub(crate) fn fill_from_utterance(mut self, utterance: &str) -> Self {
        match &mut self {
            Self::AskQuestion { question } if question.trim().is_empty() => {
                *question = utterance.to_string();
            }
            Self::ProposeCode { user_request } if user_request.trim().is_empty() => {
                *user_request = utterance.to_string();
            }
            _ => {}
        }
        self
    }
}
