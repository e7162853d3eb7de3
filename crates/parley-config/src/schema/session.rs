//! Conversation session configuration.

use serde::{Deserialize, Serialize};

/// Per-session history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Prompt placed as the first message of every new session.
    pub system_prompt: String,
    /// Token budget the history is truncated to before each call.
    pub max_history_tokens: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".into(),
            max_history_tokens: 1000,
        }
    }
}
