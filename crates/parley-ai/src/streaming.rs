//! Server-Sent Events (SSE) streaming parser.
//!
//! OpenAI-compatible chat APIs stream `data:` lines separated by blank
//! lines. [`SseDecoder`] assembles lines into events; [`sse_events`] drives
//! it over a reqwest response body.

use futures_util::{stream, Stream, StreamExt};
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::AiError;

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event type, when the server names one.
    pub event: Option<String>,
    /// The event data (JSON string, or `[DONE]`).
    pub data: String,
}

/// Incremental line-to-event assembler.
#[derive(Debug, Default)]
pub struct SseDecoder {
    event: Option<String>,
    data: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its newline). Returns an event when the line
    /// completes one.
    pub fn push_line(&mut self, line: &str) -> Option<SseEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            // Empty line = end of event
            return self.take_event();
        }

        if let Some(event_type) = field(line, "event") {
            self.event = Some(event_type.to_string());
        } else if let Some(data) = field(line, "data") {
            if !self.data.is_empty() {
                self.data.push('\n');
            }
            self.data.push_str(data);
        }
        // Ignore other fields (id:, retry:, comments)
        None
    }

    /// Flush any event left unterminated at end of stream.
    pub fn finish(&mut self) -> Option<SseEvent> {
        self.take_event()
    }

    fn take_event(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event,
            data: std::mem::take(&mut self.data),
        })
    }
}

fn field<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let value = line.strip_prefix(name)?.strip_prefix(':')?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

/// Stream the SSE events of a reqwest response body.
pub fn sse_events(response: reqwest::Response) -> impl Stream<Item = Result<SseEvent, AiError>> + Send {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(body_error));
    let lines = tokio::io::BufReader::new(StreamReader::new(byte_stream)).lines();

    stream::unfold(Some((lines, SseDecoder::new())), |state| async move {
        let (mut lines, mut decoder) = state?;
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(event) = decoder.push_line(&line) {
                        return Some((Ok(event), Some((lines, decoder))));
                    }
                }
                Ok(None) => return decoder.finish().map(|event| (Ok(event), None)),
                Err(e) => return Some((Err(read_error(e)), None)),
            }
        }
    })
}

fn body_error(e: reqwest::Error) -> std::io::Error {
    if e.is_timeout() {
        std::io::Error::new(std::io::ErrorKind::TimedOut, e)
    } else {
        std::io::Error::other(e)
    }
}

fn read_error(e: std::io::Error) -> AiError {
    if e.kind() == std::io::ErrorKind::TimedOut {
        AiError::Timeout
    } else {
        AiError::NetworkError(e.to_string())
    }
}
