use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// Maximum retry attempts after an initial request attempt.
pub const MAX_RETRIES: u32 = 2;
/// Base delay before the first retry.
pub const BASE_DELAY_MS: u64 = 500;
/// Upper bound for any single backoff sleep.
pub const MAX_DELAY_MS: u64 = 4_000;

fn retryable_message_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"(?i)overloaded|service.?unavailable|server.?busy|model.?is.?loading|try.?again")
            .expect("retry regex must compile")
    })
}

/// Status/body retry policy.
///
/// Transport failures (refused connections, timeouts) are not retried: the
/// caller's time budget already covers them and a local server that is down
/// will not come back within a backoff window.
pub fn is_retryable_http_error(status: u16, body: &str) -> bool {
    matches!(status, 429 | 502 | 503 | 504)
        || (status >= 500 && retryable_message_regex().is_match(body))
}

/// Compute capped exponential backoff delay for a retry attempt.
pub fn retry_delay_ms(attempt: u32) -> Duration {
    let exponent = attempt.min(16);
    let delay = BASE_DELAY_MS.saturating_mul(2u64.saturating_pow(exponent));
    Duration::from_millis(delay.min(MAX_DELAY_MS))
}
