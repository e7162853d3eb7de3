//! Configuration schema types for Parley.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod api;
mod logging;
mod rate_limit;
mod retry;
mod session;

pub use api::*;
pub use logging::*;
pub use rate_limit::*;
pub use retry::*;
pub use session::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Parley.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_correct_api() {
        let config = ParleyConfig::default();
        assert_eq!(config.api.base_url, "https://api.deepseek.com/v1");
        assert_eq!(config.api.model, "deepseek-reasoner");
        assert!(config.api.api_key.is_empty());
        assert_eq!(config.api.connect_timeout_secs, 10);
        assert_eq!(config.api.request_timeout_secs, 120);
    }

    #[test]
    fn default_config_has_correct_session() {
        let config = ParleyConfig::default();
        assert_eq!(config.session.system_prompt, "You are a helpful assistant.");
        assert_eq!(config.session.max_history_tokens, 1000);
    }

    #[test]
    fn default_config_has_correct_rate_limit() {
        let config = ParleyConfig::default();
        assert_eq!(config.rate_limit.requests_per_minute, 20);
        assert_eq!(config.rate_limit.acquire_timeout_secs, None);
        assert!((config.rate_limit.refill_per_second() - 20.0 / 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_config_has_correct_retry() {
        let config = ParleyConfig::default();
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.rate_limit_backoff_secs, 20);
        assert_eq!(config.retry.timeout_backoff_secs, 5);
    }

    #[test]
    fn default_config_has_info_logging() {
        let config = ParleyConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.level.as_directive(), "info");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ParleyConfig = toml::from_str(
            r#"
[session]
max_history_tokens = 4000
"#,
        )
        .unwrap();
        assert_eq!(config.session.max_history_tokens, 4000);
        assert_eq!(config.session.system_prompt, "You are a helpful assistant.");
        assert_eq!(config.rate_limit.requests_per_minute, 20);
    }

    #[test]
    fn acquire_timeout_parses_when_present() {
        let config: ParleyConfig = toml::from_str(
            r#"
[rate_limit]
requests_per_minute = 60
acquire_timeout_secs = 0
"#,
        )
        .unwrap();
        assert_eq!(config.rate_limit.acquire_timeout_secs, Some(0));
        assert!((config.rate_limit.refill_per_second() - 1.0).abs() < f64::EPSILON);
    }
}
