//! Session store: maps session ids to conversation histories.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::tokens::TokenEstimator;
use crate::{AiError, ChatModel, Message};

use super::conversation::ConversationSession;

/// History budget used when none is configured.
pub const DEFAULT_MAX_HISTORY_TOKENS: usize = 1000;

/// A stored session. `turn` serializes whole turns; `session` guards the
/// history itself and is only held for short, await-free mutations.
struct SessionSlot {
    turn: Arc<Mutex<()>>,
    session: Mutex<ConversationSession>,
}

impl SessionSlot {
    fn new(session: ConversationSession) -> Arc<Self> {
        Arc::new(Self {
            turn: Arc::new(Mutex::new(())),
            session: Mutex::new(session),
        })
    }
}

/// Exclusive access to one session for the length of a turn.
///
/// Other turns on the same session wait until this is dropped.
pub struct SessionTurn {
    session_id: String,
    slot: Arc<SessionSlot>,
    _gate: OwnedMutexGuard<()>,
}

impl SessionTurn {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Snapshot of the history to send with the request.
    pub async fn messages(&self) -> Vec<Message> {
        self.slot.session.lock().await.messages().to_vec()
    }

    pub async fn model(&self) -> ChatModel {
        self.slot.session.lock().await.model().clone()
    }
}

/// Process-wide session registry and sole owner of session lifecycle.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<SessionSlot>>>,
    estimator: TokenEstimator,
    model: ChatModel,
    system_prompt: Option<String>,
    max_history_tokens: usize,
}

impl SessionStore {
    pub fn new(model: ChatModel) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            estimator: TokenEstimator::new(),
            model,
            system_prompt: None,
            max_history_tokens: DEFAULT_MAX_HISTORY_TOKENS,
        }
    }

    pub fn with_estimator(mut self, estimator: TokenEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_history_tokens(mut self, max: usize) -> Self {
        self.max_history_tokens = max;
        self
    }

    /// Fetch or create a session. A supplied `system_prompt` replaces the
    /// session's prompt and resets its history.
    pub async fn build_session(&self, session_id: &str, system_prompt: Option<&str>) {
        let slot = self.slot(session_id).await;
        if let Some(prompt) = system_prompt {
            let _gate = slot.turn.lock().await;
            slot.session.lock().await.set_system_prompt(prompt);
            debug!(session_id, "session system prompt replaced");
        }
    }

    /// Start a turn: append the user query and truncate to the history budget.
    ///
    /// The returned handle keeps other turns on this session waiting until
    /// the caller drops it, so the query and its reply land together.
    pub async fn session_query(&self, query: &str, session_id: &str) -> SessionTurn {
        let turn = self.begin_turn(session_id).await;
        {
            let mut session = turn.slot.session.lock().await;
            session.add_query(query);
            match session.discard_exceeding(&self.estimator, self.max_history_tokens, None) {
                Ok(tokens) => {
                    debug!(session_id, tokens, messages = session.message_count(), "query added")
                }
                Err(e) => {
                    warn!(session_id, error = %e, "exception when counting tokens precisely for query")
                }
            }
        }
        turn
    }

    /// Commit the assistant reply of `turn`.
    ///
    /// Fails when the session was cleared or replaced since the turn began.
    pub async fn session_reply(
        &self,
        turn: &SessionTurn,
        content: &str,
        total_tokens: usize,
    ) -> Result<(), AiError> {
        if !self.is_current(&turn.session_id, &turn.slot).await {
            warn!(session_id = %turn.session_id, "session vanished before reply commit");
            return Err(AiError::SessionNotFound(turn.session_id.clone()));
        }

        let mut session = turn.slot.session.lock().await;
        session.add_reply(content);
        let tokens = session
            .discard_exceeding(&self.estimator, self.max_history_tokens, Some(total_tokens))
            .unwrap_or(total_tokens);
        debug!(
            session_id = %turn.session_id,
            tokens,
            messages = session.message_count(),
            "reply committed"
        );
        Ok(())
    }

    /// Remove a session. Returns true if it existed.
    pub async fn clear_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            info!(session_id, "session cleared");
        }
        removed
    }

    pub async fn clear_all_sessions(&self) {
        let mut map = self.sessions.write().await;
        let count = map.len();
        map.clear();
        info!(sessions = count, "all sessions cleared");
    }

    /// Remove sessions untouched for longer than `max_age`.
    ///
    /// Sessions with a turn in flight are kept. Returns the number removed.
    pub async fn evict_idle(&self, max_age: Duration) -> usize {
        let mut map = self.sessions.write().await;
        let before = map.len();
        map.retain(|id, slot| {
            let Ok(_gate) = slot.turn.try_lock() else {
                return true;
            };
            let Ok(session) = slot.session.try_lock() else {
                return true;
            };
            let idle = session.updated_at().elapsed() > max_age;
            if idle {
                info!(session_id = %id, "evicting idle session");
            }
            !idle
        });
        before - map.len()
    }

    /// Snapshot of a session's messages, if it exists.
    pub async fn history(&self, session_id: &str) -> Option<Vec<Message>> {
        let slot = self.sessions.read().await.get(session_id).cloned()?;
        let messages = slot.session.lock().await.messages().to_vec();
        Some(messages)
    }

    pub async fn exists(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn begin_turn(&self, session_id: &str) -> SessionTurn {
        loop {
            let slot = self.slot(session_id).await;
            let gate = slot.turn.clone().lock_owned().await;
            if self.is_current(session_id, &slot).await {
                return SessionTurn {
                    session_id: session_id.to_string(),
                    slot,
                    _gate: gate,
                };
            }
            debug!(session_id, "session cleared while waiting for turn, retrying");
        }
    }

    async fn is_current(&self, session_id: &str, slot: &Arc<SessionSlot>) -> bool {
        matches!(
            self.sessions.read().await.get(session_id),
            Some(current) if Arc::ptr_eq(current, slot)
        )
    }

    async fn slot(&self, session_id: &str) -> Arc<SessionSlot> {
        if let Some(slot) = self.sessions.read().await.get(session_id) {
            return slot.clone();
        }

        let mut map = self.sessions.write().await;
        map.entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(session_id, "creating session");
                SessionSlot::new(ConversationSession::new(
                    session_id,
                    self.system_prompt.as_deref(),
                    self.model.clone(),
                ))
            })
            .clone()
    }
}
