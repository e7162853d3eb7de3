//! Result of one completion call and stream accumulation.

use futures_util::StreamExt;

use crate::transport::{ChunkStream, ChunkUsage};
use crate::AiError;

/// Outcome of one turn's remote call.
///
/// The token figures are those reported by the stream. Zero completion
/// tokens means either an unaccounted reply (content is the reply) or a
/// failed turn (content is the user-facing error).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionResult {
    pub content: String,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl CompletionResult {
    /// A terminal failure carrying a user-facing message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            completion_tokens: 0,
            total_tokens: 0,
        }
    }

    /// Usage to bill for a successful call.
    ///
    /// A non-empty reply whose stream reported no usage is billed at its
    /// character length.
    pub fn effective_usage(&self) -> ChunkUsage {
        if self.completion_tokens == 0 && !self.content.is_empty() {
            let len = self.content.chars().count() as u64;
            return ChunkUsage {
                completion_tokens: len,
                total_tokens: len,
            };
        }
        ChunkUsage {
            completion_tokens: self.completion_tokens,
            total_tokens: self.total_tokens.max(self.completion_tokens),
        }
    }
}

/// Drain a response stream, concatenating content and keeping the latest
/// usage. `on_chunk` sees every non-empty fragment as it arrives.
pub(crate) async fn accumulate(
    mut stream: ChunkStream,
    on_chunk: &(dyn Fn(&str) + Send + Sync),
) -> Result<CompletionResult, AiError> {
    let mut result = CompletionResult::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if let Some(text) = chunk.content.as_deref().filter(|t| !t.is_empty()) {
            on_chunk(text);
            result.content.push_str(text);
        }
        if let Some(usage) = chunk.usage {
            result.completion_tokens = usage.completion_tokens;
            result.total_tokens = usage.total_tokens;
        }
    }

    Ok(result)
}
