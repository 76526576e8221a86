//! Line-oriented REPL host for the `cintessa` agent.
//!
//! ## Provider bootstrap
//!
//! `cintessa_cli` selects its text generator from the environment:
//!
//! - `CINTESSA_PROVIDER=ollama` (default) for a local Ollama server
//! - `CINTESSA_PROVIDER=mock` for deterministic offline runs
//!
//! When the provider is `ollama`, `CINTESSA_OLLAMA_CONFIG_PATH` may point at a
//! readable UTF-8 JSON file with this shape:
//!
//! ```json
//! {
//!   "base_url": "http://localhost:11434",
//!   "model": "qwen2:7b",
//!   "timeout_sec": 30
//! }
//! ```
//!
//! Contract notes:
//! - Every field is optional; omitted fields keep the defaults shown above.
//! - `model` must be non-empty when provided.
//! - `timeout_sec` must be > 0 when provided.
//! - Unknown JSON fields are rejected.
//!
//! ## Agent options
//!
//! `CINTESSA_WORKSPACE`, `CINTESSA_RETAIN_FAILED_PROPOSALS`,
//! `CINTESSA_SHELL_TIMEOUT_SEC` and `CINTESSA_LOG` are read by
//! [`cintessa::EnvConfig::from_env`].

pub mod app;
pub mod commands;
pub mod providers;
