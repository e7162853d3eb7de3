//! CompletionTransport implementation for DeepSeekClient.

use async_trait::async_trait;
use futures_util::{future, StreamExt};
use tracing::debug;

use crate::streaming::sse_events;
use crate::transport::{ChunkStream, CompletionTransport};
use crate::{AiError, ChatModel, Message};

use super::client::{parse_chunk, DeepSeekClient};

#[async_trait]
impl CompletionTransport for DeepSeekClient {
    async fn stream_complete(
        &self,
        model: &ChatModel,
        messages: &[Message],
    ) -> Result<ChunkStream, AiError> {
        let body = self.build_request_body(model, messages);

        debug!(model = %model, messages = messages.len(), "DeepSeek API streaming request");

        let response = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if status == reqwest::StatusCode::REQUEST_TIMEOUT
            || status == reqwest::StatusCode::GATEWAY_TIMEOUT
        {
            return Err(AiError::Timeout);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(AiError::ApiError(format!("HTTP {status}: {text}")));
        }

        let chunks = sse_events(response)
            .map(|event| event.and_then(|event| parse_chunk(&event.data)))
            // `Ok(None)` is the [DONE] sentinel.
            .take_while(|item| future::ready(!matches!(item, Ok(None))))
            .filter_map(|item| {
                future::ready(match item {
                    Ok(chunk) => chunk.map(Ok),
                    Err(AiError::ParseError(e)) => {
                        debug!(error = %e, "skipping malformed stream event");
                        None
                    }
                    Err(e) => Some(Err(e)),
                })
            });

        Ok(Box::pin(chunks))
    }
}

fn request_error(e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Timeout
    } else {
        AiError::NetworkError(e.to_string())
    }
}
