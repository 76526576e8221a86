//! Routes a resolved [`Action`] to exactly one handler and renders the result.
//!
//! Handlers return `Result<String, AgentError>`; [`Dispatcher::dispatch`] turns
//! every error into a failure result string, so nothing escapes to the caller.

use std::path::Path;
use std::sync::Arc;

use agent_provider::{completion_or_failure, GenerateRequest, TextGenerator};
use tracing::debug;

use crate::error::AgentError;
use crate::intent::Action;
use crate::proposal::{render_proposal, ProposalManager};
use crate::workspace::{ProjectKind, ShellOutput, Workspace};

pub const PERSONA_SYSTEM_PROMPT: &str = "You are Cintessa, a friendly and helpful AI coding assistant. Be conversational and helpful. If the user mentions creating files or directories, offer to help with that.";

const LIST_LIMIT: usize = 50;
const SMOKE_PROBE_PREFIX: &str = ".cintessa_smoke_probe_";

pub const HELP_TEXT: &str = "Cintessa Agent - Available Commands

Chat & General:
- Just talk to me (\"hi\", \"how are you\", \"what can you do\")
- \"help\" - show this message

Directory Operations (no workspace needed):
- \"create folder called <name>\" - create a new directory
- \"set workspace <path>\" - choose the directory file operations use
- \"create project called <name> in python\" - scaffold a project

Code Proposals (no workspace needed to propose):
- \"create a function that <does something>\"
- \"write code for <feature>\"
- \"implement <class/function>\"
- \"accept <id>\" / \"reject <id>\" - apply or discard a proposal

File Operations (require a workspace):
- \"list files\" - show files in the workspace
- \"read file <name>\" - show a file

System Commands:
- \"smoke test\" - run a quick self check
- \"run app\" - start the application in the workspace";

pub struct Dispatcher {
    generator: Arc<dyn TextGenerator>,
    proposals: ProposalManager,
}

impl Dispatcher {
    pub fn new(generator: Arc<dyn TextGenerator>, proposals: ProposalManager) -> Self {
        Self {
            generator,
            proposals,
        }
    }

    pub fn proposals(&self) -> &ProposalManager {
        &self.proposals
    }

    /// Runs `action` and always produces a displayable result.
    pub fn dispatch(&self, workspace: &mut Workspace, action: &Action) -> String {
        debug!(action = action.name(), "dispatching");
        match self.handle(workspace, action) {
            Ok(text) => text,
            Err(error) => render_error(&error),
        }
    }

    pub fn handle(&self, workspace: &mut Workspace, action: &Action) -> Result<String, AgentError> {
        match action {
            Action::SetWorkspace { path } => {
                let root = workspace.set_root(path)?;
                Ok(format!("Workspace set to: {}", root.display()))
            }
            Action::CreateDirectory { path } => {
                let created = workspace.create_directory(path)?;
                Ok(format!("Created directory: {}", created.display()))
            }
            Action::CreateProject {
                project_name,
                project_type,
            } => {
                let kind = ProjectKind::from_label(project_type);
                let created = workspace.create_project_scaffold(project_name, kind)?;
                Ok(format!(
                    "Created {} project '{project_name}' at {}",
                    kind.as_str(),
                    created.display()
                ))
            }
            Action::ReadFile { file_path } => {
                let content = workspace.read_file(file_path)?;
                Ok(format!("Content of {file_path}:\n\n```\n{content}\n```"))
            }
            Action::WriteFile { file_path, content } => {
                workspace.write_file(file_path, content)?;
                Ok(format!("Successfully wrote to {file_path}"))
            }
            Action::ListFiles { path } => {
                let files = workspace.list_files(path.as_deref())?;
                Ok(render_file_list(&files))
            }
            Action::RunCommand { command } => {
                let output = workspace.run_shell(command)?;
                Ok(render_shell_output(command, &output))
            }
            Action::ProposeCode { user_request } => {
                let proposal = self.proposals.propose(user_request)?;
                Ok(render_proposal(&proposal))
            }
            Action::SmokeTest {} => Ok(self.smoke_test(workspace)),
            Action::RunApp {} => run_app(workspace),
            Action::ShowHelp {} => Ok(HELP_TEXT.to_string()),
            Action::AskQuestion { question } => {
                let request =
                    GenerateRequest::new(question.as_str()).with_system_prompt(PERSONA_SYSTEM_PROMPT);
                Ok(completion_or_failure(self.generator.generate(request))?)
            }
        }
    }

    fn smoke_test(&self, workspace: &Workspace) -> String {
        let profile = self.generator.profile();
        let mut lines = vec![
            "Quick System Check".to_string(),
            String::new(),
            "- Agent is running".to_string(),
            format!("- Provider: {} ({})", profile.provider_id, profile.model_id),
            format!("- Pending proposals: {}", self.proposals.store().len()),
        ];

        match workspace.root() {
            None => lines.push(
                "- Workspace: not set; set one to include file operation checks".to_string(),
            ),
            Some(root) => {
                lines.push(format!("- Workspace: {}", root.display()));
                match probe_workspace(workspace) {
                    Ok(()) => lines.push("- File write/read/remove: passed".to_string()),
                    Err(error) => lines.push(format!("- File write/read/remove: failed ({error})")),
                }
            }
        }

        lines.join("\n")
    }
}

/// Renders a handler failure. Non-zero shell exits keep their output.
pub fn render_error(error: &AgentError) -> String {
    match error {
        AgentError::ShellNonZeroExit {
            stdout, stderr, ..
        } => {
            let mut text = format!("Error: {error}");
            push_output_sections(&mut text, stdout, stderr);
            text
        }
        other => format!("Error: {other}"),
    }
}

pub fn render_file_list(files: &[String]) -> String {
    if files.is_empty() {
        return "No files found in workspace".to_string();
    }

    let mut text = String::from("Files in workspace:\n");
    for file in files.iter().take(LIST_LIMIT) {
        text.push_str("\n  - ");
        text.push_str(file);
    }
    if files.len() > LIST_LIMIT {
        text.push_str(&format!("\n\n... and {} more files", files.len() - LIST_LIMIT));
    }
    text
}

pub fn render_shell_output(command: &str, output: &ShellOutput) -> String {
    let mut text = format!("Command: `{command}`\nExit code: {}", output.exit_code);
    push_output_sections(&mut text, &output.stdout, &output.stderr);
    text
}

fn push_output_sections(text: &mut String, stdout: &str, stderr: &str) {
    if !stdout.is_empty() {
        text.push_str(&format!("\n\nOutput:\n```\n{}\n```", stdout.trim_end()));
    }
    if !stderr.is_empty() {
        text.push_str(&format!("\n\nErrors:\n```\n{}\n```", stderr.trim_end()));
    }
}

fn probe_workspace(workspace: &Workspace) -> Result<(), AgentError> {
    let root = workspace.root().ok_or(AgentError::WorkspaceNotSet)?;
    let probe = format!("{SMOKE_PROBE_PREFIX}{}", uuid::Uuid::new_v4().simple());
    if root.join(&probe).exists() {
        return Err(AgentError::io(
            "creating smoke probe",
            root.join(&probe),
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "probe file already exists"),
        ));
    }

    let expected = "cintessa smoke probe";
    workspace.write_file(&probe, expected)?;
    let read_back = workspace.read_file(&probe);
    workspace.remove_file(&probe)?;

    if read_back? == expected {
        Ok(())
    } else {
        Err(AgentError::io(
            "verifying smoke probe",
            root.join(&probe),
            std::io::Error::new(std::io::ErrorKind::InvalidData, "content mismatch"),
        ))
    }
}

/// Picks the launch command for the project found at `root`.
pub fn detect_launcher(root: &Path) -> Option<String> {
    if root.join("Cargo.toml").is_file() {
        return Some("cargo run".to_string());
    }
    for entry in ["main.py", "app.py"] {
        if root.join(entry).is_file() {
            return Some(format!("python3 {entry}"));
        }
    }
    if root.join("package.json").is_file() {
        return Some("npm start".to_string());
    }
    None
}

fn run_app(workspace: &Workspace) -> Result<String, AgentError> {
    let root = workspace.root().ok_or(AgentError::WorkspaceNotSet)?;
    let Some(command) = detect_launcher(root) else {
        return Ok(format!(
            "Application Launcher\n\nNo Cargo.toml, main.py, app.py or package.json found in {}.",
            root.display()
        ));
    };

    let output = workspace.run_shell(&command)?;
    if !output.success() {
        return Err(AgentError::ShellNonZeroExit {
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        });
    }
    Ok(render_shell_output(&command, &output))
}
