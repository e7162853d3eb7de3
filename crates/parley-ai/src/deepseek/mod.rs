//! DeepSeek chat-completions client.
//!
//! Implements `CompletionTransport` over the OpenAI-compatible
//! `/chat/completions` endpoint with SSE streaming.

mod api;
mod client;
mod config;

pub use client::DeepSeekClient;
pub use config::DeepSeekConfig;
