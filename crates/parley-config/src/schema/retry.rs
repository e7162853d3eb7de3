//! Retry backoff configuration.

use serde::{Deserialize, Serialize};

/// Bounded retry settings for the completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (valid range: 0-5).
    pub max_retries: u32,
    /// Wait before retrying a rate-limited call.
    pub rate_limit_backoff_secs: u32,
    /// Wait before retrying a timed-out call.
    pub timeout_backoff_secs: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            rate_limit_backoff_secs: 20,
            timeout_backoff_secs: 5,
        }
    }
}
