//! Generator-backed classification for utterances no phrase route matched.

use agent_provider::{completion_or_failure, GenerateRequest, TextGenerator};
use serde::Deserialize;
use serde_json::Value;

use super::action::Action;
use crate::error::AgentError;

pub const PARSER_SYSTEM_PROMPT: &str =
    "You are a command parser. Return only valid JSON. Use ask_question for general chat.";

#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    params: Value,
}

pub fn build_prompt(utterance: &str) -> String {
    format!(
        r#"Analyze this user command and return ONLY a JSON response with action and params.

Available actions:
- set_workspace: {{"path": "directory/path"}} - set workspace directory
- create_directory: {{"path": "directory/path"}} - create new directory
- create_project: {{"project_name": "name", "project_type": "basic|python|rust"}} - create new project
- read_file: {{"file_path": "path/to/file"}} - read file (requires workspace)
- write_file: {{"file_path": "path/to/file", "content": "content"}} - write file (requires workspace)
- list_files: {{"path": "optional/subdirectory"}} - list files (requires workspace)
- run_command: {{"command": "shell command"}} - run terminal command
- propose_code: {{"user_request": "user request"}} - propose code changes
- smoke_test: {{}} - run smoke tests
- run_app: {{}} - run application
- show_help: {{}} - show help information
- ask_question: {{"question": "user question"}} - general questions

User command: "{utterance}"

For general conversation or coding questions use ask_question or propose_code.

Respond with JSON only:
{{"action": "action_name", "params": {{...}}}}"#
    )
}

/// Asks the generator to classify `utterance`. Every failure is reported as an
/// error so the caller can degrade to `ask_question`.
pub fn classify(generator: &dyn TextGenerator, utterance: &str) -> Result<Action, AgentError> {
    let request =
        GenerateRequest::new(build_prompt(utterance)).with_system_prompt(PARSER_SYSTEM_PROMPT);
    let response = completion_or_failure(generator.generate(request))?;
    parse_response(&response, utterance)
}

pub fn parse_response(response: &str, utterance: &str) -> Result<Action, AgentError> {
    let object = extract_json_object(response).ok_or_else(|| {
        AgentError::IntentParseFailure("no JSON object in generator response".to_string())
    })?;

    let raw: RawIntent = serde_json::from_str(object)
        .map_err(|error| AgentError::IntentParseFailure(error.to_string()))?;
    let name = raw.action.unwrap_or_else(|| "ask_question".to_string());

    Action::from_parts(&name, raw.params).map(|action| action.fill_from_utterance(utterance))
}

/// Returns the first balanced `{...}` region, honouring JSON string escapes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
