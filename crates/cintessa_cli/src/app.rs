use cintessa::Agent;
use tracing::debug;

use crate::commands::{parse_slash_command, SlashCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

pub const HELP_TEXT: &str =
    "Commands: /help, /history, /proposals, /workspace, /quit. Anything else is sent to the agent; try \"help\".";

pub const BANNER: &str = "Cintessa Agent ready. Type /help for commands.";

pub struct App {
    agent: Agent,
    pub transcript: Vec<Message>,
    pub should_exit: bool,
}

impl App {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent,
            transcript: Vec::new(),
            should_exit: false,
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Handles one input line and returns the text to show, if any.
    pub fn on_submit(&mut self, input: &str) -> Option<String> {
        let prompt = input.trim();
        if prompt.is_empty() {
            return None;
        }

        if let Some(command) = parse_slash_command(prompt) {
            debug!(?command, "slash command");
            let reply = match command {
                SlashCommand::Help => HELP_TEXT.to_string(),
                SlashCommand::History => self.render_history(),
                SlashCommand::Proposals => self.render_proposals(),
                SlashCommand::Workspace => match self.agent.workspace().root() {
                    Some(root) => format!("Workspace: {}", root.display()),
                    None => "No workspace set".to_string(),
                },
                SlashCommand::Quit => {
                    self.should_exit = true;
                    "Goodbye!".to_string()
                }
                SlashCommand::Unknown(command) => format!("Unknown command: {command}"),
            };
            self.push(Role::System, reply.clone());
            return Some(reply);
        }

        self.push(Role::User, prompt.to_string());
        let reply = self.agent.chat(prompt);
        self.push(Role::Assistant, reply.clone());
        Some(reply)
    }

    fn push(&mut self, role: Role, content: String) {
        self.transcript.push(Message { role, content });
    }

    fn render_history(&self) -> String {
        let history = self.agent.history();
        if history.is_empty() {
            return "No interactions yet".to_string();
        }

        history
            .iter()
            .enumerate()
            .map(|(index, record)| format!("{}. [{}] {}", index + 1, record.action, record.input))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_proposals(&self) -> String {
        let pending = self.agent.pending_proposals();
        if pending.is_empty() {
            return "No pending proposals".to_string();
        }

        let mut text = String::from("Pending proposals:");
        for proposal in pending {
            text.push_str(&format!(
                "\n  - {} ({}): {}",
                proposal.id, proposal.created_at, proposal.user_request
            ));
        }
        text
    }
}
