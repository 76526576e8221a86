//! Filesystem and shell collaborator scoped to one workspace root.
//!
//! Every operation that touches files inside the workspace first checks that a
//! root is configured and that the resolved path stays under it. Nothing here
//! panics on OS failures; they come back as [`AgentError`] values.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use wait_timeout::ChildExt;

use crate::error::AgentError;
use crate::proposal::store::lock_unpoisoned;

pub const DEFAULT_SHELL_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SHELL_MAX_OUTPUT_BYTES: usize = 100 * 1024;
const DEFAULT_READ_MAX_BYTES: usize = 200 * 1024;

/// Scaffold flavour for `create_project_scaffold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectKind {
    #[default]
    Basic,
    Python,
    Rust,
}

impl ProjectKind {
    /// Maps a free-form label onto a kind; anything unrecognised is `Basic`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Self::Python,
            "rust" | "rs" => Self::Rust,
            _ => Self::Basic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Python => "python",
            Self::Rust => "rust",
        }
    }
}

/// Captured result of one shell command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    /// Process exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Clone)]
pub struct Workspace {
    root: Option<PathBuf>,
    shell_timeout: Duration,
    shell_max_output_bytes: usize,
    read_max_bytes: usize,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            root: None,
            shell_timeout: DEFAULT_SHELL_TIMEOUT,
            shell_max_output_bytes: DEFAULT_SHELL_MAX_OUTPUT_BYTES,
            read_max_bytes: DEFAULT_READ_MAX_BYTES,
        }
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shell_timeout(mut self, timeout: Duration) -> Self {
        self.shell_timeout = timeout;
        self
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn shell_timeout(&self) -> Duration {
        self.shell_timeout
    }

    /// Creates `path` if needed and makes it the workspace root.
    pub fn set_root(&mut self, path: &str) -> Result<PathBuf, AgentError> {
        let expanded = expand_home(path.trim())?;
        fs::create_dir_all(&expanded)
            .map_err(|error| AgentError::io("creating workspace", &expanded, error))?;
        let canonical = expanded
            .canonicalize()
            .map_err(|error| AgentError::io("resolving workspace", &expanded, error))?;

        if !canonical.is_dir() {
            return Err(AgentError::io(
                "resolving workspace",
                &canonical,
                io::Error::new(io::ErrorKind::InvalidInput, "workspace must be a directory"),
            ));
        }

        info!(root = %canonical.display(), "workspace set");
        self.root = Some(canonical.clone());
        Ok(canonical)
    }

    /// Creates a directory anywhere. Relative paths land under the workspace,
    /// or under the home directory when no workspace is set.
    pub fn create_directory(&self, path: &str) -> Result<PathBuf, AgentError> {
        let expanded = expand_home(path.trim())?;
        let target = if expanded.is_absolute() {
            expanded
        } else {
            match &self.root {
                Some(root) => root.join(expanded),
                None => home_dir()?.join(expanded),
            }
        };

        fs::create_dir_all(&target)
            .map_err(|error| AgentError::io("creating directory", &target, error))?;
        Ok(target)
    }

    /// Reads a UTF-8 file. Falls back to a case-insensitive name search when
    /// the exact path does not exist.
    pub fn read_file(&self, path: &str) -> Result<String, AgentError> {
        let root = self.require_root()?;
        let resolved = self.locate_file(root, path)?;

        let bytes =
            fs::read(&resolved).map_err(|error| AgentError::io("reading file", &resolved, error))?;

        if bytes.len() > self.read_max_bytes {
            return Err(AgentError::io(
                "reading file",
                &resolved,
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "file exceeds max read size ({} bytes > {} bytes)",
                        bytes.len(),
                        self.read_max_bytes
                    ),
                ),
            ));
        }

        String::from_utf8(bytes).map_err(|_| {
            AgentError::io(
                "reading file",
                &resolved,
                io::Error::new(io::ErrorKind::InvalidData, "file is not valid UTF-8 text"),
            )
        })
    }

    /// Writes `content`, creating parent directories as needed.
    pub fn write_file(&self, path: &str, content: &str) -> Result<PathBuf, AgentError> {
        let root = self.require_root()?;
        let resolved = resolve_write_path(root, path)?;

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)
                .map_err(|error| AgentError::io("creating parent directories", parent, error))?;
            let canonical_parent = parent
                .canonicalize()
                .map_err(|error| AgentError::io("resolving write parent", parent, error))?;
            ensure_inside_workspace(root, &canonical_parent)?;
        }

        fs::write(&resolved, content)
            .map_err(|error| AgentError::io("writing file", &resolved, error))?;
        debug!(path = %resolved.display(), bytes = content.len(), "file written");
        Ok(resolved)
    }

    pub fn remove_file(&self, path: &str) -> Result<(), AgentError> {
        let root = self.require_root()?;
        let resolved = resolve_existing_path(root, path)?;
        fs::remove_file(&resolved).map_err(|error| AgentError::io("removing file", &resolved, error))
    }

    /// Lists files under `path` (or the whole workspace), as sorted
    /// workspace-relative paths.
    pub fn list_files(&self, path: Option<&str>) -> Result<Vec<String>, AgentError> {
        let root = self.require_root()?;
        let target = match path.map(str::trim) {
            None | Some("") | Some(".") => root.to_path_buf(),
            Some(path) => resolve_existing_path(root, path)?,
        };

        let mut files = Vec::new();
        collect_files(&target, &mut files)?;

        let mut relative: Vec<String> = files
            .iter()
            .map(|file| workspace_relative_display(root, file))
            .collect();
        relative.sort();
        Ok(relative)
    }

    /// Runs `command` through `sh -c` in the workspace, or the process cwd when
    /// no workspace is set. A non-zero exit is not an error here.
    pub fn run_shell(&self, command: &str) -> Result<ShellOutput, AgentError> {
        let cwd = match &self.root {
            Some(root) => root.clone(),
            None => env::current_dir()
                .map_err(|error| AgentError::io("resolving current directory", ".", error))?,
        };

        let mut command_builder = Command::new("sh");
        command_builder
            .arg("-c")
            .arg(command)
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command_builder.process_group(0);
        }

        let deadline = Instant::now() + self.shell_timeout;
        let mut child = command_builder
            .spawn()
            .map_err(|error| AgentError::io("launching shell command", &cwd, error))?;

        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let status = match child.wait_timeout(self.shell_timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                kill_process_group(&mut child);
                let _ = child.wait();
                return Err(AgentError::ShellTimeout {
                    seconds: self.shell_timeout.as_secs(),
                });
            }
            Err(error) => {
                kill_process_group(&mut child);
                let _ = child.wait();
                return Err(AgentError::io("waiting for shell command", &cwd, error));
            }
        };

        // Background jobs inherit the pipes; they get until the deadline to close them.
        let (stdout, stdout_closed) = stdout_reader.collect(deadline);
        let (stderr, stderr_closed) = stderr_reader.collect(deadline);
        if !(stdout_closed && stderr_closed) {
            debug!(command, "output pipes still open at deadline; killing process group");
            kill_process_group(&mut child);
        }
        let exit_code = status.code().unwrap_or(-1);
        debug!(command, exit_code, "shell command finished");

        Ok(ShellOutput {
            exit_code,
            stdout: truncate_to_byte_limit(
                String::from_utf8_lossy(&stdout).into_owned(),
                self.shell_max_output_bytes,
            ),
            stderr: truncate_to_byte_limit(
                String::from_utf8_lossy(&stderr).into_owned(),
                self.shell_max_output_bytes,
            ),
        })
    }

    pub fn create_project_scaffold(
        &self,
        name: &str,
        kind: ProjectKind,
    ) -> Result<PathBuf, AgentError> {
        let root = self.require_root()?;
        let project = resolve_write_path(root, name)?;

        for dir in [project.join("src"), project.join("tests")] {
            fs::create_dir_all(&dir)
                .map_err(|error| AgentError::io("creating project directory", &dir, error))?;
        }

        let mut files = vec![(
            project.join("README.md"),
            format!("# {name}\n\nProject created by Cintessa Agent\n"),
        )];
        match kind {
            ProjectKind::Basic => {}
            ProjectKind::Python => {
                files.push((project.join("src").join("__init__.py"), String::new()));
                files.push((project.join("requirements.txt"), String::new()));
            }
            ProjectKind::Rust => {
                files.push((
                    project.join("Cargo.toml"),
                    format!(
                        "[package]\nname = \"{}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[dependencies]\n",
                        crate_name(name)
                    ),
                ));
                files.push((
                    project.join("src").join("main.rs"),
                    "fn main() {\n    println!(\"Hello, world!\");\n}\n".to_string(),
                ));
            }
        }

        for (path, content) in files {
            fs::write(&path, content)
                .map_err(|error| AgentError::io("writing scaffold file", &path, error))?;
        }

        info!(project = %project.display(), kind = kind.as_str(), "project scaffolded");
        Ok(project)
    }

    fn require_root(&self) -> Result<&Path, AgentError> {
        self.root.as_deref().ok_or(AgentError::WorkspaceNotSet)
    }

    fn locate_file(&self, root: &Path, path: &str) -> Result<PathBuf, AgentError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(AgentError::FileNotFound {
                path: path.to_string(),
            });
        }

        let candidate = absolute_candidate(root, trimmed);
        if candidate.is_file() {
            let canonical = candidate
                .canonicalize()
                .map_err(|error| AgentError::io("resolving path", &candidate, error))?;
            ensure_inside_workspace(root, &canonical)?;
            return Ok(canonical);
        }

        let wanted_path = trimmed.to_lowercase();
        let wanted_name = Path::new(trimmed)
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let mut files = Vec::new();
        collect_files(root, &mut files)?;
        files.sort();

        files
            .into_iter()
            .find(|file| {
                let relative = workspace_relative_display(root, file).to_lowercase();
                let name = file
                    .file_name()
                    .map(|name| name.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                relative == wanted_path || name == wanted_name
            })
            .ok_or_else(|| AgentError::FileNotFound {
                path: trimmed.to_string(),
            })
    }
}

fn expand_home(raw_path: &str) -> Result<PathBuf, AgentError> {
    if raw_path == "~" {
        return home_dir();
    }
    if let Some(rest) = raw_path.strip_prefix("~/") {
        return Ok(home_dir()?.join(rest));
    }
    Ok(PathBuf::from(raw_path))
}

fn home_dir() -> Result<PathBuf, AgentError> {
    env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
        AgentError::io(
            "resolving home directory",
            "~",
            io::Error::new(io::ErrorKind::NotFound, "HOME is not set"),
        )
    })
}

fn absolute_candidate(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn resolve_existing_path(root: &Path, path: &str) -> Result<PathBuf, AgentError> {
    let candidate = absolute_candidate(root, path.trim());
    if !candidate.exists() {
        return Err(AgentError::FileNotFound {
            path: path.trim().to_string(),
        });
    }

    let canonical = candidate
        .canonicalize()
        .map_err(|error| AgentError::io("resolving path", &candidate, error))?;
    ensure_inside_workspace(root, &canonical)?;
    Ok(canonical)
}

fn resolve_write_path(root: &Path, path: &str) -> Result<PathBuf, AgentError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(AgentError::io(
            "resolving write path",
            root,
            io::Error::new(io::ErrorKind::InvalidInput, "path must not be empty"),
        ));
    }

    let candidate = absolute_candidate(root, trimmed);
    // Missing directories cannot be canonicalized, so `..` is never allowed.
    if candidate
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(AgentError::PathEscapesWorkspace { path: candidate });
    }

    let parent = candidate.parent().unwrap_or(root);
    let anchor = canonicalize_existing_ancestor(parent)?;
    ensure_inside_workspace(root, &anchor)?;

    Ok(candidate)
}

fn ensure_inside_workspace(root: &Path, canonical_path: &Path) -> Result<(), AgentError> {
    if canonical_path.starts_with(root) {
        Ok(())
    } else {
        Err(AgentError::PathEscapesWorkspace {
            path: canonical_path.to_path_buf(),
        })
    }
}

fn canonicalize_existing_ancestor(path: &Path) -> Result<PathBuf, AgentError> {
    for ancestor in path.ancestors() {
        if ancestor.exists() {
            return ancestor
                .canonicalize()
                .map_err(|error| AgentError::io("resolving path", ancestor, error));
        }
    }

    Err(AgentError::io(
        "resolving path",
        path,
        io::Error::new(io::ErrorKind::NotFound, "no existing ancestor"),
    ))
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), AgentError> {
    if dir.is_file() {
        out.push(dir.to_path_buf());
        return Ok(());
    }

    let entries =
        fs::read_dir(dir).map_err(|error| AgentError::io("listing directory", dir, error))?;
    for entry in entries {
        let entry = entry.map_err(|error| AgentError::io("listing directory", dir, error))?;
        let file_type = entry
            .file_type()
            .map_err(|error| AgentError::io("inspecting entry", entry.path(), error))?;

        if file_type.is_dir() {
            collect_files(&entry.path(), out)?;
        } else if file_type.is_file() {
            out.push(entry.path());
        }
    }
    Ok(())
}

fn workspace_relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(|relative| relative.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}

struct PipeReader {
    buffer: Arc<Mutex<Vec<u8>>>,
    closed: mpsc::Receiver<()>,
}

impl PipeReader {
    /// Waits for EOF until `deadline`, then returns what was read so far and
    /// whether the pipe actually closed.
    fn collect(self, deadline: Instant) -> (Vec<u8>, bool) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let closed = self.closed.recv_timeout(remaining).is_ok();
        let bytes = std::mem::take(&mut *lock_unpoisoned(&self.buffer));
        (bytes, closed)
    }
}

fn spawn_pipe_reader(pipe: Option<impl Read + Send + 'static>) -> PipeReader {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let (closed_tx, closed) = mpsc::channel();
    let sink = Arc::clone(&buffer);

    thread::spawn(move || {
        if let Some(mut pipe) = pipe {
            let mut chunk = [0_u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => lock_unpoisoned(&sink).extend_from_slice(&chunk[..n]),
                }
            }
        }
        let _ = closed_tx.send(());
    });

    PipeReader { buffer, closed }
}

/// Kills the shell and everything it started; the child leads its own group.
fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: plain signal delivery to the group created at spawn.
            unsafe {
                libc::kill(-pid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
}

fn truncate_to_byte_limit(content: String, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content;
    }

    let mut cutoff = max_bytes.min(content.len());
    while cutoff > 0 && !content.is_char_boundary(cutoff) {
        cutoff -= 1;
    }

    let mut truncated = content[..cutoff].to_string();
    truncated.push_str("\n[truncated]");
    truncated
}

fn crate_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "new_project".to_string()
    } else {
        sanitized
    }
}
