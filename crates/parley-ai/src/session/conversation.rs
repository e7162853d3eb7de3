//! Single conversation history and budget truncation.

use std::time::Instant;

use tracing::{debug, warn};

use crate::tokens::{TokenEstimator, TokenizerError};
use crate::{ChatModel, Message, Role};

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// One conversation's ordered turns. `messages[0]` is always the system turn.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    session_id: String,
    model: ChatModel,
    system_prompt: String,
    messages: Vec<Message>,
    updated_at: Instant,
}

impl ConversationSession {
    pub fn new(session_id: impl Into<String>, system_prompt: Option<&str>, model: ChatModel) -> Self {
        let mut session = Self {
            session_id: session_id.into(),
            model,
            system_prompt: resolve_prompt(system_prompt),
            messages: Vec::new(),
            updated_at: Instant::now(),
        };
        session.reset();
        session
    }

    /// Drop every turn except a fresh system message.
    pub fn reset(&mut self) -> &mut Self {
        self.messages = vec![Message::system(self.system_prompt.clone())];
        self.updated_at = Instant::now();
        self
    }

    /// Replace the system prompt and reset the history.
    pub fn set_system_prompt(&mut self, prompt: &str) -> &mut Self {
        self.system_prompt = resolve_prompt(Some(prompt));
        self.reset()
    }

    pub fn add_query(&mut self, query: impl Into<String>) {
        self.messages.push(Message::user(query));
        self.updated_at = Instant::now();
    }

    pub fn add_reply(&mut self, reply: impl Into<String>) {
        self.messages.push(Message::assistant(reply));
        self.updated_at = Instant::now();
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn model(&self) -> &ChatModel {
        &self.model
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn updated_at(&self) -> Instant {
        self.updated_at
    }

    /// Precise token count of the current history.
    pub fn count_tokens(&self, estimator: &TokenEstimator) -> Result<usize, TokenizerError> {
        estimator.count(&self.messages, &self.model)
    }

    /// Drop the oldest turns until the history fits `max_tokens`.
    ///
    /// When no precise count is possible, `current_tokens` is used as a
    /// running estimate that is reduced by `max_tokens` per removal. Without
    /// a hint the counting failure is returned. The system message is never
    /// removed, and neither is a sole user turn; a lone trailing assistant
    /// turn is. Returns the final estimate.
    pub fn discard_exceeding(
        &mut self,
        estimator: &TokenEstimator,
        max_tokens: usize,
        current_tokens: Option<usize>,
    ) -> Result<usize, TokenizerError> {
        let (mut tokens, precise) = match self.count_tokens(estimator) {
            Ok(tokens) => (tokens, true),
            Err(e) => {
                let Some(hint) = current_tokens else {
                    return Err(e);
                };
                debug!(session_id = %self.session_id, error = %e, "counting tokens imprecisely");
                (hint, false)
            }
        };

        while tokens > max_tokens {
            let len = self.messages.len();
            if len > 2 {
                self.messages.remove(1);
            } else if len == 2 && self.messages[1].role == Role::Assistant {
                self.messages.remove(1);
                tokens = self.recount(estimator, precise, tokens, max_tokens);
                break;
            } else if len == 2 && self.messages[1].role == Role::User {
                warn!(
                    session_id = %self.session_id,
                    total_tokens = tokens,
                    max_tokens,
                    "user message exceeds max_tokens"
                );
                break;
            } else {
                debug!(
                    session_id = %self.session_id,
                    total_tokens = tokens,
                    max_tokens,
                    messages = len,
                    "only the system message remains"
                );
                break;
            }
            tokens = self.recount(estimator, precise, tokens, max_tokens);
        }

        Ok(tokens)
    }

    fn recount(
        &self,
        estimator: &TokenEstimator,
        precise: bool,
        tokens: usize,
        max_tokens: usize,
    ) -> usize {
        if precise {
            estimator.estimate(&self.messages, &self.model)
        } else {
            tokens.saturating_sub(max_tokens)
        }
    }
}

fn resolve_prompt(prompt: Option<&str>) -> String {
    match prompt {
        Some(p) if !p.trim().is_empty() => p.to_string(),
        _ => DEFAULT_SYSTEM_PROMPT.to_string(),
    }
}
