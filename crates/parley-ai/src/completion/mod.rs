//! Completion client: drives one user turn end to end.
//!
//! A turn runs: local rate pre-check, user-turn append and truncation,
//! blocking rate acquire, streamed remote call, accumulation, and finally
//! either an assistant-turn commit or a classified failure. Rate-limit and
//! timeout failures are retried with their own backoff; anything else
//! clears the session and ends the turn.

mod result;


use std::sync::{Arc, Mutex};

use tracing::{debug, error, info_span, warn, Instrument};

use parley_common::new_correlation_id;

use crate::rate_limit::RateLimiter;
use crate::retry::{classify, ErrorKind, RetryPolicy, NO_ANSWER_REPLY, TOO_FAST_REPLY};
use crate::session::{SessionStore, SessionTurn};
use crate::token_tracker::{TokenTracker, UsageTotals};
use crate::transport::CompletionTransport;
use crate::{AiError, ChatModel, Message};

pub use result::CompletionResult;
use result::accumulate;

/// Orchestrates user turns against a completion transport.
pub struct CompletionClient {
    transport: Arc<dyn CompletionTransport>,
    sessions: Arc<SessionStore>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    tracker: Mutex<TokenTracker>,
}

impl CompletionClient {
    pub fn new(
        transport: Arc<dyn CompletionTransport>,
        sessions: Arc<SessionStore>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            transport,
            sessions,
            limiter,
            retry: RetryPolicy::default(),
            tracker: Mutex::new(TokenTracker::new()),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Usage across all sessions.
    pub fn usage(&self) -> UsageTotals {
        self.tracker().total()
    }

    pub fn session_usage(&self, session_id: &str) -> Option<UsageTotals> {
        self.tracker().for_session(session_id)
    }

    /// Explicitly discard a session's history.
    pub async fn reset_session(&self, session_id: &str) -> bool {
        self.sessions.clear_session(session_id).await
    }

    /// Answer `query` within `session_id`. Never fails: every failure is
    /// turned into a user-facing reply.
    pub async fn reply(&self, query: &str, session_id: &str) -> String {
        self.reply_streaming(query, session_id, &|_| {}).await
    }

    /// Like [`reply`](Self::reply), passing every content fragment to
    /// `on_chunk` as it streams in. Fragments of a failed attempt may be
    /// followed by those of its retry.
    pub async fn reply_streaming(
        &self,
        query: &str,
        session_id: &str,
        on_chunk: &(dyn Fn(&str) + Send + Sync),
    ) -> String {
        if !self.limiter.try_consume(1) {
            warn!(session_id, "request rejected by rate limiter");
            return TOO_FAST_REPLY.to_string();
        }

        let span = info_span!("turn", session_id, turn = %new_correlation_id());
        match self.run_turn(query, session_id, on_chunk).instrument(span).await {
            Ok(content) => content,
            Err(e) => {
                error!(session_id, error = %e, "completion turn failed");
                format!("Completion API error: {e}")
            }
        }
    }

    async fn run_turn(
        &self,
        query: &str,
        session_id: &str,
        on_chunk: &(dyn Fn(&str) + Send + Sync),
    ) -> Result<String, AiError> {
        let turn = self.sessions.session_query(query, session_id).await;
        let result = self.reply_text(&turn, on_chunk).await;

        if result.completion_tokens > 0 {
            self.sessions
                .session_reply(&turn, &result.content, result.total_tokens as usize)
                .await?;
            Ok(result.content)
        } else if !result.content.is_empty() {
            debug!(session_id, "reply carried no usage, not committed to history");
            Ok(result.content)
        } else {
            Ok(NO_ANSWER_REPLY.to_string())
        }
    }

    /// Run the remote call for an open turn with bounded, classified retries.
    ///
    /// A fatal failure clears the session. Never fails: exhausted or fatal
    /// turns yield a zero-usage result holding the user-facing message.
    pub async fn reply_text(
        &self,
        turn: &SessionTurn,
        on_chunk: &(dyn Fn(&str) + Send + Sync),
    ) -> CompletionResult {
        let session_id = turn.session_id();
        let messages = turn.messages().await;
        let model = turn.model().await;
        let mut retry_count = 0;

        loop {
            let error = match self.attempt(&model, &messages, on_chunk).await {
                Ok(result) => {
                    self.tracker().record(session_id, &result.effective_usage());
                    return result;
                }
                Err(e) => e,
            };

            let kind = classify(&error);
            if let Some(wait) = self.retry.backoff(kind, retry_count) {
                retry_count += 1;
                warn!(
                    session_id,
                    attempt = retry_count,
                    kind = ?kind,
                    error = %error,
                    wait_secs = wait.as_secs_f64(),
                    "retrying completion"
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            if kind == ErrorKind::Fatal {
                error!(session_id, attempt = retry_count + 1, error = %error, "completion failed, clearing session");
                self.sessions.clear_session(session_id).await;
            } else {
                error!(
                    session_id,
                    attempts = retry_count + 1,
                    kind = ?kind,
                    error = %error,
                    "completion retries exhausted"
                );
            }
            return CompletionResult::failed(kind.user_message());
        }
    }

    async fn attempt(
        &self,
        model: &ChatModel,
        messages: &[Message],
        on_chunk: &(dyn Fn(&str) + Send + Sync),
    ) -> Result<CompletionResult, AiError> {
        self.limiter.acquire().await?;
        let stream = self.transport.stream_complete(model, messages).await?;
        accumulate(stream, on_chunk).await
    }

    fn tracker(&self) -> std::sync::MutexGuard<'_, TokenTracker> {
        self.tracker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
