//! Contract for the remote completion call.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::{AiError, ChatModel, Message};

/// Usage figures carried by some chunks of a streamed response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkUsage {
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// One incremental unit of a streamed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    pub content: Option<String>,
    pub usage: Option<ChunkUsage>,
}

impl Chunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            usage: None,
        }
    }

    pub fn usage(completion_tokens: u64, total_tokens: u64) -> Self {
        Self {
            content: None,
            usage: Some(ChunkUsage {
                completion_tokens,
                total_tokens,
            }),
        }
    }
}

/// Chunks of one response. An `Err` item ends the response.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Chunk, AiError>> + Send>>;

/// A streaming chat-completion backend.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn stream_complete(
        &self,
        model: &ChatModel,
        messages: &[Message],
    ) -> Result<ChunkStream, AiError>;
}
