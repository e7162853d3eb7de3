//! Failure classification and bounded retry policy for completion calls.
//!
//! Rate-limit failures are retried after a long wait, timeouts after a
//! short one. Anything else is fatal: no retry, and the caller resets the
//! session.

use std::time::Duration;

use crate::AiError;

/// Shown when the local pre-check rejects a request.
pub const TOO_FAST_REPLY: &str = "Requests are coming in too fast, please try again later.";
/// Shown when the remote call keeps hitting a rate limit.
pub const RATE_LIMITED_REPLY: &str = "Questions are coming in too fast, please rest a moment.";
/// Shown when the remote call keeps timing out.
pub const TIMEOUT_REPLY: &str = "I did not receive your message.";
/// Shown on any unclassified failure.
pub const FATAL_REPLY: &str = "I'm feeling a bit tired, please come back later.";
/// Shown when the call succeeded but produced nothing.
pub const NO_ANSWER_REPLY: &str = "Sorry, I cannot answer right now.";

/// How a failed completion attempt is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimit,
    Timeout,
    Fatal,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::Fatal)
    }

    /// User-facing reply when this failure ends the turn.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::RateLimit => RATE_LIMITED_REPLY,
            ErrorKind::Timeout => TIMEOUT_REPLY,
            ErrorKind::Fatal => FATAL_REPLY,
        }
    }
}

/// Classify a failed attempt.
///
/// Typed variants decide first; otherwise the error text is matched
/// case-insensitively for "rate limit", then "timeout".
pub fn classify(error: &AiError) -> ErrorKind {
    match error {
        AiError::RateLimited => ErrorKind::RateLimit,
        AiError::Timeout => ErrorKind::Timeout,
        other => classify_text(&other.to_string()),
    }
}

/// Classify by error text alone.
pub fn classify_text(error: &str) -> ErrorKind {
    let lower = error.to_lowercase();
    if lower.contains("rate limit") {
        ErrorKind::RateLimit
    } else if lower.contains("timeout") {
        ErrorKind::Timeout
    } else {
        ErrorKind::Fatal
    }
}

/// Retry budget and per-kind backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub rate_limit_backoff: Duration,
    pub timeout_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            rate_limit_backoff: Duration::from_secs(20),
            timeout_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Policy with no waits between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            rate_limit_backoff: Duration::ZERO,
            timeout_backoff: Duration::ZERO,
        }
    }

    /// Wait before the next attempt, or `None` when the failure ends the
    /// turn. `retry_count` is the number of retries already made.
    pub fn backoff(&self, kind: ErrorKind, retry_count: u32) -> Option<Duration> {
        if retry_count >= self.max_retries {
            return None;
        }
        match kind {
            ErrorKind::RateLimit => Some(self.rate_limit_backoff),
            ErrorKind::Timeout => Some(self.timeout_backoff),
            ErrorKind::Fatal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_classify_by_variant() {
        assert_eq!(classify(&AiError::RateLimited), ErrorKind::RateLimit);
        assert_eq!(classify(&AiError::Timeout), ErrorKind::Timeout);
    }

    #[test]
    fn untyped_errors_classify_by_text() {
        assert_eq!(
            classify(&AiError::ApiError("HTTP 503: Rate Limit reached".into())),
            ErrorKind::RateLimit
        );
        assert_eq!(
            classify(&AiError::NetworkError("upstream TIMEOUT".into())),
            ErrorKind::Timeout
        );
        assert_eq!(
            classify(&AiError::ApiError("HTTP 401: unauthorized".into())),
            ErrorKind::Fatal
        );
    }

    #[test]
    fn rate_limit_wins_over_timeout() {
        assert_eq!(
            classify_text("rate limit hit after timeout"),
            ErrorKind::RateLimit
        );
    }

    #[test]
    fn session_loss_is_fatal() {
        assert_eq!(
            classify(&AiError::SessionNotFound("s1".into())),
            ErrorKind::Fatal
        );
    }

    #[test]
    fn default_policy_allows_two_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff(ErrorKind::RateLimit, 0),
            Some(Duration::from_secs(20))
        );
        assert_eq!(
            policy.backoff(ErrorKind::Timeout, 1),
            Some(Duration::from_secs(5))
        );
        assert_eq!(policy.backoff(ErrorKind::Timeout, 2), None);
    }

    #[test]
    fn fatal_is_never_retried() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(ErrorKind::Fatal, 0), None);
        assert!(!ErrorKind::Fatal.is_retryable());
    }

    #[test]
    fn user_messages_match_kind() {
        assert_eq!(ErrorKind::RateLimit.user_message(), RATE_LIMITED_REPLY);
        assert_eq!(ErrorKind::Timeout.user_message(), TIMEOUT_REPLY);
        assert_eq!(ErrorKind::Fatal.user_message(), FATAL_REPLY);
    }
}
