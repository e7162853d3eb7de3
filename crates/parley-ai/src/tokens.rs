//! Token cost estimation for message histories.
//!
//! Character-estimated models are sized by the summed character length of
//! message contents. Other models go through an injected [`Tokenizer`]
//! using the chat-format overhead convention: a fixed cost per message, the
//! encoded length of every field, and a fixed priming cost for the reply.

use std::sync::Arc;

use tracing::debug;

use crate::{ChatModel, Message};

/// Model whose encoding is used as the reference for non-DeepSeek models.
pub const REFERENCE_MODEL: &str = "gpt-3.5-turbo";

/// Tokens charged for every message's framing.
const TOKENS_PER_MESSAGE: usize = 4;

/// Tokens charged for priming the assistant's reply.
const REPLY_PRIMING_TOKENS: usize = 3;

#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenizerError {
    #[error("no tokenizer available")]
    Unavailable,
    #[error("tokenizer failed: {0}")]
    Encode(String),
}

/// A precise tokenizer supplied by the embedding application.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str, reference_model: &str) -> Result<Vec<u32>, TokenizerError>;
}

/// Sizes message lists against a model's accounting profile.
#[derive(Clone, Default)]
pub struct TokenEstimator {
    tokenizer: Option<Arc<dyn Tokenizer>>,
}

impl TokenEstimator {
    /// Estimator with character-count accounting only.
    pub fn new() -> Self {
        Self { tokenizer: None }
    }

    pub fn with_tokenizer(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            tokenizer: Some(tokenizer),
        }
    }

    /// Count tokens as precisely as the model allows.
    ///
    /// Fails only when the model needs a tokenizer and none is installed.
    /// Encoding failures fall back to the character count.
    pub fn count(&self, messages: &[Message], model: &ChatModel) -> Result<usize, TokenizerError> {
        if model.is_character_estimated() {
            return Ok(count_by_characters(messages));
        }

        let tokenizer = self.tokenizer.as_ref().ok_or(TokenizerError::Unavailable)?;
        match count_with_tokenizer(tokenizer.as_ref(), messages) {
            Ok(tokens) => Ok(tokens),
            Err(e) => {
                debug!(model = %model, error = %e, "token counting failed, using character count");
                Ok(count_by_characters(messages))
            }
        }
    }

    /// Estimate tokens, never failing.
    pub fn estimate(&self, messages: &[Message], model: &ChatModel) -> usize {
        self.count(messages, model)
            .unwrap_or_else(|_| count_by_characters(messages))
    }
}

/// Summed character length of every message's content. Roles are free.
pub fn count_by_characters(messages: &[Message]) -> usize {
    messages.iter().map(|m| m.content.chars().count()).sum()
}

fn count_with_tokenizer(
    tokenizer: &dyn Tokenizer,
    messages: &[Message],
) -> Result<usize, TokenizerError> {
    let mut tokens = 0;
    for message in messages {
        tokens += TOKENS_PER_MESSAGE;
        tokens += tokenizer.encode(message.role.as_str(), REFERENCE_MODEL)?.len();
        tokens += tokenizer.encode(&message.content, REFERENCE_MODEL)?.len();
    }
    Ok(tokens + REPLY_PRIMING_TOKENS)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One token per whitespace-separated word.
    struct WordTokenizer;

    impl Tokenizer for WordTokenizer {
        fn encode(&self, text: &str, _reference_model: &str) -> Result<Vec<u32>, TokenizerError> {
            Ok(text.split_whitespace().map(|_| 0).collect())
        }
    }

    struct BrokenTokenizer;

    impl Tokenizer for BrokenTokenizer {
        fn encode(&self, _text: &str, _reference_model: &str) -> Result<Vec<u32>, TokenizerError> {
            Err(TokenizerError::Encode("vocabulary missing".into()))
        }
    }

    fn history() -> Vec<Message> {
        vec![
            Message::system("be brief"),
            Message::user("hello there friend"),
        ]
    }

    #[test]
    fn deepseek_counts_characters_of_content_only() {
        let estimator = TokenEstimator::new();
        let tokens = estimator.count(&history(), &ChatModel::DeepSeekChat).unwrap();
        assert_eq!(tokens, "be brief".len() + "hello there friend".len());
    }

    #[test]
    fn characters_are_unicode_scalars() {
        let messages = vec![Message::user("你好")];
        assert_eq!(count_by_characters(&messages), 2);
    }

    #[test]
    fn tokenizer_applies_message_overhead() {
        let estimator = TokenEstimator::with_tokenizer(Arc::new(WordTokenizer));
        let tokens = estimator.count(&history(), &ChatModel::from("gpt-4o")).unwrap();
        // 2 messages * 4 + roles (1 + 1) + contents (2 + 3) + 3 priming
        assert_eq!(tokens, 8 + 2 + 5 + 3);
    }

    #[test]
    fn missing_tokenizer_is_an_error_for_count() {
        let estimator = TokenEstimator::new();
        let err = estimator
            .count(&history(), &ChatModel::from("gpt-4o"))
            .unwrap_err();
        assert!(matches!(err, TokenizerError::Unavailable));
    }

    #[test]
    fn missing_tokenizer_falls_back_for_estimate() {
        let estimator = TokenEstimator::new();
        let tokens = estimator.estimate(&history(), &ChatModel::from("gpt-4o"));
        assert_eq!(tokens, count_by_characters(&history()));
    }

    #[test]
    fn failing_tokenizer_falls_back_to_characters() {
        let estimator = TokenEstimator::with_tokenizer(Arc::new(BrokenTokenizer));
        let tokens = estimator.count(&history(), &ChatModel::from("gpt-4o")).unwrap();
        assert_eq!(tokens, count_by_characters(&history()));
    }
}
