//! Line-oriented parser for the semi-structured proposal format:
//!
//! ````text
//! FILE: relative/path.py
//! ```python
//! <content>
//! ```
//! EXPLANATION: free text
//! ````
//!
//! Sections without a complete fenced block are skipped and reported, never
//! treated as a failure of the whole proposal.

use std::fmt;

const FILE_MARKER: &str = "FILE:";
const EXPLANATION_MARKER: &str = "EXPLANATION:";
const FENCE: &str = "```";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUnit {
    pub file_path: String,
    pub content: String,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingFence,
    UnterminatedFence,
    MissingPath,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingFence => "no fenced code block",
            Self::UnterminatedFence => "fenced code block never closed",
            Self::MissingPath => "no file path",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSection {
    pub file_path: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedProposal {
    /// File units in document order; duplicates are kept.
    pub files: Vec<FileUnit>,
    pub skipped: Vec<SkippedSection>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    File(&'a str),
    Fence(&'a str),
    Explanation(&'a str),
    Text(&'a str),
}

fn tokenize(line: &str) -> Token<'_> {
    let trimmed = line.trim();
    if let Some(info) = trimmed.strip_prefix(FENCE) {
        return Token::Fence(info.trim());
    }

    let undecorated = trimmed.trim_start_matches(|ch: char| {
        ch.is_whitespace() || matches!(ch, '*' | '#' | '>' | '-')
    });
    if let Some(rest) = undecorated.strip_prefix(FILE_MARKER) {
        return Token::File(rest);
    }
    if let Some(rest) = undecorated.strip_prefix(EXPLANATION_MARKER) {
        return Token::Explanation(rest);
    }

    Token::Text(line)
}

#[derive(Debug)]
enum State {
    /// Before the first `FILE:` or after a section closed.
    Idle,
    /// Saw `FILE:`; waiting for the opening fence.
    Header { path: String },
    /// Inside the fenced block of a section.
    Fenced {
        path: String,
        language: Option<String>,
        lines: Vec<String>,
    },
    Explanation,
}

#[derive(Debug)]
struct Parser {
    state: State,
    out: ParsedProposal,
    explanation: Vec<String>,
}

impl Parser {
    fn new() -> Self {
        Self {
            state: State::Idle,
            out: ParsedProposal::default(),
            explanation: Vec::new(),
        }
    }

    fn feed(&mut self, line: &str) {
        match tokenize(line) {
            Token::File(rest) => {
                self.abandon_section();
                self.state = State::Header {
                    path: clean_path(rest),
                };
            }
            // Inside a fence the marker is ordinary content, e.g. a markdown file.
            Token::Explanation(_) if matches!(self.state, State::Fenced { .. }) => self.on_text(line),
            Token::Explanation(rest) => {
                self.abandon_section();
                self.explanation.push(rest.trim().to_string());
                self.state = State::Explanation;
            }
            Token::Fence(info) => self.on_fence(info),
            Token::Text(text) => self.on_text(text),
        }
    }

    fn on_fence(&mut self, info: &str) {
        match &mut self.state {
            State::Header { path } => {
                let path = std::mem::take(path);
                self.state = State::Fenced {
                    path,
                    language: (!info.is_empty()).then(|| info.to_string()),
                    lines: Vec::new(),
                };
            }
            State::Fenced { .. } => self.close_section(),
            State::Explanation => self.explanation.push(format!("{FENCE}{info}")),
            State::Idle => {}
        }
    }

    fn on_text(&mut self, text: &str) {
        match &mut self.state {
            State::Header { path } if path.is_empty() => *path = clean_path(text),
            State::Fenced { lines, .. } => lines.push(text.to_string()),
            State::Explanation => self.explanation.push(text.to_string()),
            State::Idle | State::Header { .. } => {}
        }
    }

    fn close_section(&mut self) {
        let State::Fenced {
            path,
            language,
            lines,
        } = std::mem::replace(&mut self.state, State::Idle)
        else {
            return;
        };

        if path.is_empty() {
            self.skip(path, SkipReason::MissingPath);
            return;
        }

        self.out.files.push(FileUnit {
            file_path: path,
            content: trim_blank_lines(&lines),
            language,
        });
    }

    fn abandon_section(&mut self) {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Header { path } => self.skip(path, SkipReason::MissingFence),
            State::Fenced { path, .. } => self.skip(path, SkipReason::UnterminatedFence),
            State::Idle | State::Explanation => {}
        }
    }

    fn skip(&mut self, file_path: String, reason: SkipReason) {
        self.out.skipped.push(SkippedSection { file_path, reason });
    }

    fn finish(mut self) -> ParsedProposal {
        self.abandon_section();

        let explanation = trim_blank_lines(&self.explanation);
        let explanation = explanation.trim();
        if !explanation.is_empty() {
            self.out.explanation = Some(explanation.to_string());
        }
        self.out
    }
}

/// Parses raw generator output into file units. Never fails.
pub fn parse_proposal(raw: &str) -> ParsedProposal {
    let mut parser = Parser::new();
    for line in raw.lines() {
        parser.feed(line);
    }
    parser.finish()
}

fn clean_path(raw: &str) -> String {
    raw.trim()
        .trim_matches(|ch: char| ch.is_whitespace() || matches!(ch, '*' | '`' | '"' | '\'' | '#'))
        .to_string()
}

/// Joins `lines`, dropping only leading and trailing blank lines.
fn trim_blank_lines(lines: &[String]) -> String {
    let start = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(start, |index| index + 1);

    lines[start..end].join("\n")
}
