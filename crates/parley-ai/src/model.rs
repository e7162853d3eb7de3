//! Model identifiers and their token accounting profile.

use std::fmt;

/// Model a session is billed against.
///
/// DeepSeek models have no public tokenizer, so their history is sized by
/// character count. Anything else is sized with the installed tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ChatModel {
    DeepSeekChat,
    #[default]
    DeepSeekReasoner,
    Other(String),
}

impl ChatModel {
    pub fn as_str(&self) -> &str {
        match self {
            ChatModel::DeepSeekChat => "deepseek-chat",
            ChatModel::DeepSeekReasoner => "deepseek-reasoner",
            ChatModel::Other(name) => name,
        }
    }

    /// Whether token cost is approximated by character count.
    pub fn is_character_estimated(&self) -> bool {
        matches!(self, ChatModel::DeepSeekChat | ChatModel::DeepSeekReasoner)
    }
}

impl From<&str> for ChatModel {
    fn from(name: &str) -> Self {
        match name.trim() {
            "deepseek-chat" => ChatModel::DeepSeekChat,
            "deepseek-reasoner" => ChatModel::DeepSeekReasoner,
            other => ChatModel::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
