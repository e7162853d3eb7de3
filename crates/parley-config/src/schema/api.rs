//! Completion API endpoint configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment variable consulted when `api.api_key` is empty.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Remote completion API settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub connect_timeout_secs: u32,
    pub request_timeout_secs: u32,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com/v1".into(),
            api_key: String::new(),
            model: "deepseek-reasoner".into(),
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
        }
    }
}

impl ApiConfig {
    /// The configured key, or `DEEPSEEK_API_KEY` when the file leaves it empty.
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let config = ApiConfig {
            api_key: "sk-secret".into(),
            ..ApiConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn explicit_key_wins_over_environment() {
        let config = ApiConfig {
            api_key: "sk-from-file".into(),
            ..ApiConfig::default()
        };
        assert_eq!(config.resolved_api_key().as_deref(), Some("sk-from-file"));
    }
}
