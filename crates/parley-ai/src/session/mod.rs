//! Conversation session management.
//!
//! A `ConversationSession` holds one conversation's turn history and
//! truncates it to a token budget. The `SessionStore` owns every session's
//! lifecycle and serializes turns on the same session.

mod conversation;
mod store;


pub use conversation::{ConversationSession, DEFAULT_SYSTEM_PROMPT};
pub use store::{SessionStore, SessionTurn, DEFAULT_MAX_HISTORY_TOKENS};
