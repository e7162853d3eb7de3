//! Request rate limiting configuration.

use serde::{Deserialize, Serialize};

/// Token-bucket settings guarding the remote call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Bucket capacity; the bucket refills at this many tokens per minute.
    pub requests_per_minute: u32,
    /// How long a blocking acquire may wait. Absent waits indefinitely,
    /// `0` never blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquire_timeout_secs: Option<u64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 20,
            acquire_timeout_secs: None,
        }
    }
}

impl RateLimitConfig {
    pub fn refill_per_second(&self) -> f64 {
        f64::from(self.requests_per_minute) / 60.0
    }
}
