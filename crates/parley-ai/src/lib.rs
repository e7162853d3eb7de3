//! Session-bounded chat engine for Parley.
//!
//! Provides:
//! - Per-conversation history truncated to a token budget
//! - A token-bucket rate limiter with fast-reject and blocking modes
//! - A streaming DeepSeek (OpenAI-compatible) transport
//! - A completion client with classified, bounded retries
//! - Token usage tracking

pub mod completion;
pub mod deepseek;
pub mod model;
pub mod rate_limit;
pub mod retry;
pub mod session;
pub mod streaming;
pub mod token_tracker;
pub mod tokens;
pub mod transport;

pub use completion::{CompletionClient, CompletionResult};
pub use deepseek::{DeepSeekClient, DeepSeekConfig};
pub use model::ChatModel;
pub use rate_limit::{RateLimitExceeded, RateLimiter};
pub use retry::{classify, ErrorKind, RetryPolicy};
pub use session::{ConversationSession, SessionStore, SessionTurn};
pub use token_tracker::TokenTracker;
pub use tokens::{TokenEstimator, Tokenizer, TokenizerError};
pub use transport::{Chunk, ChunkStream, ChunkUsage, CompletionTransport};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited: rate limit reached")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Request timeout")]
    Timeout,
    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

impl From<RateLimitExceeded> for AiError {
    fn from(_: RateLimitExceeded) -> Self {
        AiError::RateLimited
    }
}
