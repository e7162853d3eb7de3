//! Token usage tracking across sessions.

use std::collections::HashMap;

use crate::transport::ChunkUsage;

/// Cumulative usage for one session or for the whole client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageTotals {
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub calls: u64,
}

impl UsageTotals {
    fn add(&mut self, usage: &ChunkUsage) {
        self.completion_tokens = self.completion_tokens.saturating_add(usage.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(usage.total_tokens);
        self.calls += 1;
    }
}

/// Tracks cumulative token usage per session.
#[derive(Debug, Default)]
pub struct TokenTracker {
    total: UsageTotals,
    by_session: HashMap<String, UsageTotals>,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record token usage from a completed call.
    pub fn record(&mut self, session_id: &str, usage: &ChunkUsage) {
        self.total.add(usage);
        self.by_session
            .entry(session_id.to_string())
            .or_default()
            .add(usage);
    }

    /// Usage across every session.
    pub fn total(&self) -> UsageTotals {
        self.total
    }

    /// Usage for one session.
    pub fn for_session(&self, session_id: &str) -> Option<UsageTotals> {
        self.by_session.get(session_id).copied()
    }

    /// Reset all counters.
    pub fn reset(&mut self) {
        self.total = UsageTotals::default();
        self.by_session.clear();
    }
}
