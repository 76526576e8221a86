//! Deterministic phrase routing, the first classification stage.

use tracing::debug;

use super::action::{
    default_directory_path, default_project_name, default_workspace_path, Action,
};

const PATH_KEYWORDS: &[&str] = &["to", "at", "in", "folder", "directory", "called", "named"];
const FILE_KEYWORDS: &[&str] = &["file", "called", "named"];
const PROJECT_KEYWORDS: &[&str] = &["project", "called", "named"];
const LIST_KEYWORDS: &[&str] = &["in", "under"];

/// Phrases this short are matched as whole words, so "ls" does not fire on
/// "tools" and "cat" does not fire on "locate".
const WORD_ONLY_PHRASES: &[&str] = &["ls", "dir", "cat"];

const GREETING_WORDS: &[&str] = &["hi", "hello", "hey", "jimmy"];
const GREETING_PHRASES: &[&str] = &["how are you"];

struct Route {
    phrases: &'static [&'static str],
    build: fn(&str, &str) -> Action,
}

/// Scanned top to bottom; the first row with a matching phrase wins.
const ROUTES: &[Route] = &[
    Route {
        phrases: &["set workspace", "use folder", "open directory", "cd to"],
        build: build_set_workspace,
    },
    Route {
        phrases: &["create dir", "make folder", "mkdir", "new directory", "create folder"],
        build: build_create_directory,
    },
    Route {
        phrases: &["create project", "new project", "scaffold project"],
        build: build_create_project,
    },
    Route {
        phrases: &["list files", "show files", "ls", "dir"],
        build: build_list_files,
    },
    Route {
        phrases: &["read file", "show file", "cat"],
        build: build_read_file,
    },
    Route {
        phrases: &[
            "create function",
            "write code",
            "implement",
            "add feature",
            "propose code",
        ],
        build: build_propose_code,
    },
    Route {
        phrases: &["smoke test", "test app", "run tests"],
        build: |_, _| Action::SmokeTest {},
    },
    Route {
        phrases: &["run app", "start app"],
        build: |_, _| Action::RunApp {},
    },
    Route {
        phrases: &["help", "what can you do"],
        build: |_, _| Action::ShowHelp {},
    },
];

fn build_set_workspace(utterance: &str, remainder: &str) -> Action {
    Action::SetWorkspace {
        path: extract_after_keyword(utterance, PATH_KEYWORDS)
            .or_else(|| last_token(remainder))
            .unwrap_or_else(default_workspace_path),
    }
}

fn build_create_directory(utterance: &str, remainder: &str) -> Action {
    Action::CreateDirectory {
        path: extract_after_keyword(utterance, PATH_KEYWORDS)
            .or_else(|| last_token(remainder))
            .unwrap_or_else(default_directory_path),
    }
}

fn build_create_project(utterance: &str, remainder: &str) -> Action {
    Action::CreateProject {
        project_name: extract_after_keyword(utterance, PROJECT_KEYWORDS)
            .or_else(|| last_token(remainder))
            .unwrap_or_else(default_project_name),
        project_type: detect_project_type(utterance).to_string(),
    }
}

fn build_list_files(utterance: &str, _remainder: &str) -> Action {
    Action::ListFiles {
        path: extract_after_keyword(utterance, LIST_KEYWORDS),
    }
}

fn build_read_file(utterance: &str, remainder: &str) -> Action {
    Action::ReadFile {
        file_path: extract_after_keyword(utterance, FILE_KEYWORDS)
            .or_else(|| last_token(remainder))
            .unwrap_or_else(|| "file.txt".to_string()),
    }
}

fn build_propose_code(utterance: &str, _remainder: &str) -> Action {
    Action::ProposeCode {
        user_request: utterance.trim().to_string(),
    }
}

/// Returns the action of the first matching route, or `None` when the
/// utterance needs the generator fallback.
pub fn route(utterance: &str) -> Option<Action> {
    let lower = utterance.to_ascii_lowercase();
    let words = words(&lower);

    for route in ROUTES {
        for phrase in route.phrases {
            if let Some(end) = phrase_end(&lower, &words, phrase) {
                let remainder = utterance.get(end..).unwrap_or_default();
                let action = (route.build)(utterance, remainder);
                debug!(phrase, action = action.name(), "phrase route matched");
                return Some(action);
            }
        }
    }

    None
}

/// True for greetings and small talk that must always reach the persona.
pub fn is_conversational(utterance: &str) -> bool {
    let lower = utterance.to_ascii_lowercase();
    let words = words(&lower);

    GREETING_WORDS.iter().any(|greeting| words.contains(greeting))
        || GREETING_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

fn words(lower: &str) -> Vec<&str> {
    lower
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Byte offset just past the first occurrence of `phrase`, if it matches.
fn phrase_end(lower: &str, words: &[&str], phrase: &str) -> Option<usize> {
    if WORD_ONLY_PHRASES.contains(&phrase) {
        if !words.contains(&phrase) {
            return None;
        }
        return lower
            .match_indices(phrase)
            .find(|(start, _)| is_word_at(lower, *start, phrase.len()))
            .map(|(start, _)| start + phrase.len());
    }

    lower.find(phrase).map(|start| start + phrase.len())
}

fn is_word_at(text: &str, start: usize, len: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[start + len..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// Token following the first keyword whose successor is not itself a keyword.
fn extract_after_keyword(utterance: &str, keywords: &[&str]) -> Option<String> {
    let tokens: Vec<&str> = utterance.split_whitespace().collect();
    let is_keyword = |token: &str| keywords.contains(&clean_token(token).to_ascii_lowercase().as_str());

    tokens.windows(2).find_map(|pair| {
        if is_keyword(pair[0]) && !is_keyword(pair[1]) {
            non_empty(clean_token(pair[1]))
        } else {
            None
        }
    })
}

fn last_token(text: &str) -> Option<String> {
    text.split_whitespace()
        .next_back()
        .and_then(|token| non_empty(clean_token(token)))
}

fn clean_token(token: &str) -> &str {
    token.trim_matches(|ch: char| matches!(ch, '"' | '\'' | '`' | ',' | ';' | '!' | '?'))
}

fn non_empty(token: &str) -> Option<String> {
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn detect_project_type(utterance: &str) -> &'static str {
    let lower = utterance.to_ascii_lowercase();
    let words = words(&lower);
    if words.contains(&"python") {
        "python"
    } else if words.contains(&"rust") {
        "rust"
    } else {
        "basic"
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn set_workspace_prefers_token_after_preposition() {
        assert_eq!(
            route("set workspace to /tmp/demo"),
            Some(Action::SetWorkspace {
                path: "/tmp/demo".to_string()
            })
        );
        assert_eq!(
            route("Set Workspace ~/code/app"),
            Some(Action::SetWorkspace {
                path: "~/code/app".to_string()
            })
        );
    }

    #[test]
    fn bare_phrase_uses_default_parameter() {
        assert_eq!(
            route("set workspace"),
            Some(Action::SetWorkspace {
                path: ".".to_string()
            })
        );
        assert_eq!(
            route("mkdir"),
            Some(Action::CreateDirectory {
                path: "new_folder".to_string()
            })
        );
    }

    #[test]
    fn keyword_followed_by_keyword_is_skipped() {
        assert_eq!(
            route("make folder called reports"),
            Some(Action::CreateDirectory {
                path: "reports".to_string()
            })
        );
        assert_eq!(
            route("create project named \"webshop\" in python"),
            Some(Action::CreateProject {
                project_name: "webshop".to_string(),
                project_type: "python".to_string(),
            })
        );
    }

    #[test]
    fn short_phrases_need_whole_words() {
        assert_eq!(route("ls"), Some(Action::ListFiles { path: None }));
        assert_eq!(
            route("cat main.py"),
            Some(Action::ReadFile {
                file_path: "main.py".to_string()
            })
        );
        assert_eq!(route("what tools do you use"), None);
        assert_eq!(route("locate the bug"), None);
    }

    #[test]
    fn list_files_accepts_subdirectory() {
        assert_eq!(
            route("list files in src"),
            Some(Action::ListFiles {
                path: Some("src".to_string())
            })
        );
    }

    #[test]
    fn read_file_defaults_when_nothing_follows() {
        assert_eq!(
            route("read file"),
            Some(Action::ReadFile {
                file_path: "file.txt".to_string()
            })
        );
        assert_eq!(
            route("please read file notes.md"),
            Some(Action::ReadFile {
                file_path: "notes.md".to_string()
            })
        );
    }

    #[test]
    fn earlier_rows_win_over_later_rows() {
        assert_eq!(
            route("implement a help command"),
            Some(Action::ProposeCode {
                user_request: "implement a help command".to_string()
            })
        );
        assert_eq!(route("please run tests"), Some(Action::SmokeTest {}));
        assert_eq!(route("start app"), Some(Action::RunApp {}));
        assert_eq!(route("what can you do?"), Some(Action::ShowHelp {}));
    }

    #[test]
    fn greetings_are_whole_word_matches() {
        assert!(is_conversational("hi"));
        assert!(is_conversational("Hello there!"));
        assert!(is_conversational("hey jimmy, how are you"));
        assert!(!is_conversational("this is a thing"));
        assert!(!is_conversational("write a shell script"));
    }
}
