//! Environment configuration.

use std::env;
use std::time::Duration;

use crate::workspace::DEFAULT_SHELL_TIMEOUT;

pub const WORKSPACE_ENV: &str = "CINTESSA_WORKSPACE";
pub const RETAIN_FAILED_PROPOSALS_ENV: &str = "CINTESSA_RETAIN_FAILED_PROPOSALS";
pub const SHELL_TIMEOUT_ENV: &str = "CINTESSA_SHELL_TIMEOUT_SEC";
pub const LOG_ENV: &str = "CINTESSA_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub workspace: Option<String>,
    pub retain_failed_proposals: bool,
    pub shell_timeout: Duration,
    pub log_filter: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            workspace: env_string_opt(WORKSPACE_ENV),
            retain_failed_proposals: env_flag(RETAIN_FAILED_PROPOSALS_ENV),
            shell_timeout: env_secs(SHELL_TIMEOUT_ENV).unwrap_or(DEFAULT_SHELL_TIMEOUT),
            log_filter: env_string_opt(LOG_ENV),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

/// Positive whole seconds; zero or unparsable values are ignored.
fn env_secs(key: &str) -> Option<Duration> {
    env_string_opt(key)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults() {
        let _lock = env_lock();
        let _g1 = set_env_guard(WORKSPACE_ENV, None);
        let _g2 = set_env_guard(RETAIN_FAILED_PROPOSALS_ENV, None);
        let _g3 = set_env_guard(SHELL_TIMEOUT_ENV, None);
        let _g4 = set_env_guard(LOG_ENV, None);

        let config = EnvConfig::from_env();
        assert!(config.workspace.is_none());
        assert!(!config.retain_failed_proposals);
        assert_eq!(config.shell_timeout, DEFAULT_SHELL_TIMEOUT);
        assert!(config.log_filter.is_none());
    }

    #[test]
    fn env_values_are_applied() {
        let _lock = env_lock();
        let _g1 = set_env_guard(WORKSPACE_ENV, Some("/tmp/cintessa-ws"));
        let _g2 = set_env_guard(RETAIN_FAILED_PROPOSALS_ENV, Some("1"));
        let _g3 = set_env_guard(SHELL_TIMEOUT_ENV, Some("7"));
        let _g4 = set_env_guard(LOG_ENV, Some("cintessa=debug"));

        let config = EnvConfig::from_env();
        assert_eq!(config.workspace.as_deref(), Some("/tmp/cintessa-ws"));
        assert!(config.retain_failed_proposals);
        assert_eq!(config.shell_timeout, Duration::from_secs(7));
        assert_eq!(config.log_filter.as_deref(), Some("cintessa=debug"));
    }

    #[test]
    fn invalid_timeout_and_blank_values_are_ignored() {
        let _lock = env_lock();
        let _g1 = set_env_guard(WORKSPACE_ENV, Some("   "));
        let _g2 = set_env_guard(RETAIN_FAILED_PROPOSALS_ENV, Some("yes"));
        let _g3 = set_env_guard(SHELL_TIMEOUT_ENV, Some("0"));

        let config = EnvConfig::from_env();
        assert!(config.workspace.is_none());
        assert!(!config.retain_failed_proposals);
        assert_eq!(config.shell_timeout, DEFAULT_SHELL_TIMEOUT);
    }
}
