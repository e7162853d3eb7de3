//! DeepSeek client struct, request building, and chunk parsing.

use crate::transport::{Chunk, ChunkUsage};
use crate::{AiError, ChatModel, Message};

use super::config::DeepSeekConfig;

/// DeepSeek API client.
pub struct DeepSeekClient {
    pub(crate) config: DeepSeekConfig,
    pub(crate) http: reqwest::Client,
}

impl DeepSeekClient {
    pub fn new(config: DeepSeekConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// Build the JSON request body for a streamed completion.
    pub(crate) fn build_request_body(
        &self,
        model: &ChatModel,
        messages: &[Message],
    ) -> serde_json::Value {
        serde_json::json!({
            "model": model.as_str(),
            "messages": messages,
            "stream": true,
            "stream_options": { "include_usage": true },
        })
    }
}

/// Parse one SSE `data:` payload into a chunk.
///
/// Returns `Ok(None)` for the `[DONE]` sentinel.
pub(crate) fn parse_chunk(data: &str) -> Result<Option<Chunk>, AiError> {
    if data.trim() == "[DONE]" {
        return Ok(None);
    }

    let json: serde_json::Value =
        serde_json::from_str(data).map_err(|e| AiError::ParseError(e.to_string()))?;

    if let Some(message) = json["error"]["message"].as_str() {
        return Err(AiError::ApiError(message.to_string()));
    }

    let content = json["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .and_then(|choice| choice["delta"]["content"].as_str())
        .filter(|text| !text.is_empty())
        .map(String::from);

    let usage = json.get("usage").filter(|u| !u.is_null()).map(|u| ChunkUsage {
        completion_tokens: u["completion_tokens"].as_u64().unwrap_or(0),
        total_tokens: u["total_tokens"].as_u64().unwrap_or(0),
    });

    Ok(Some(Chunk { content, usage }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DeepSeekClient {
        DeepSeekClient::new(DeepSeekConfig::new("sk-test")).unwrap()
    }

    #[test]
    fn request_body_streams_with_usage() {
        let body = client().build_request_body(
            &ChatModel::DeepSeekChat,
            &[Message::system("S"), Message::user("hi")],
        );
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["stream"], true);
        assert_eq!(body["stream_options"]["include_usage"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn completions_url_joins_base() {
        let config = DeepSeekConfig::new("k").with_base_url("http://localhost:8080/v1/");
        assert_eq!(
            config.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", DeepSeekConfig::new("sk-secret"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn parses_content_delta() {
        let chunk = parse_chunk(r#"{"choices":[{"delta":{"content":"Hel"}}],"usage":null}"#)
            .unwrap()
            .unwrap();
        assert_eq!(chunk, Chunk::text("Hel"));
    }

    #[test]
    fn parses_usage_only_chunk() {
        let chunk = parse_chunk(
            r#"{"choices":[],"usage":{"prompt_tokens":5,"completion_tokens":7,"total_tokens":12}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(chunk, Chunk::usage(7, 12));
    }

    #[test]
    fn empty_delta_has_no_content() {
        let chunk = parse_chunk(r#"{"choices":[{"delta":{"role":"assistant","content":""}}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(chunk, Chunk::default());
    }

    #[test]
    fn done_sentinel_ends_stream() {
        assert!(parse_chunk("[DONE]").unwrap().is_none());
    }

    #[test]
    fn error_payload_is_an_api_error() {
        let err = parse_chunk(r#"{"error":{"message":"Authentication Fails"}}"#).unwrap_err();
        assert!(matches!(err, AiError::ApiError(msg) if msg == "Authentication Fails"));
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        assert!(matches!(
            parse_chunk("{not json").unwrap_err(),
            AiError::ParseError(_)
        ));
    }
}
