//! The network side of a chat turn: a completion source turns a message
//! history into a lazy, cancellable sequence of response text fragments.

use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::transcript::Message;

/// Incremental response text, in arrival order. Finite unless cancelled.
pub type FragmentStream = BoxStream<'static, Result<String, CompletionError>>;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("authorization failure: {0}")]
    Authorization(String),
    #[error("stream cancelled")]
    Cancelled,
    #[error("malformed completion chunk: {0}")]
    Protocol(String),
}

#[async_trait]
pub trait CompletionSource: Send + Sync {
    /// Request the next assistant turn for `history`. The returned stream
    /// yields response fragments as they arrive and honors `cancel` by
    /// aborting the underlying transfer.
    async fn stream(
        &self,
        history: &[Message],
        model: &str,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, CompletionError>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Delta {
    Content { content: String },

    Stop {},
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    choices: Vec<ChunkChoice>,
}

/// Streams completions from an OpenAI compatible `/v1/chat/completions`
/// endpoint with `stream: true`, decoding SSE events into content
/// fragments.
pub struct OpenAiSource {
    api_hostname: String,
    api_key: String,
}

impl OpenAiSource {
    pub fn new(api_hostname: &str, api_key: &str) -> Self {
        OpenAiSource {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl CompletionSource for OpenAiSource {
    async fn stream(
        &self,
        history: &[Message],
        model: &str,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, CompletionError> {
        let payload = json!({
            "model": model,
            "messages": history,
            "stream": true,
        });
        let url = format!(
            "{}/v1/chat/completions",
            self.api_hostname.trim_end_matches('/')
        );

        let request = reqwest::Client::new()
            .post(url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(60 * 5))
            .json(&payload)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CompletionError::Cancelled),
            response = request => {
                response.map_err(|e| CompletionError::Transport(e.to_string()))?
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CompletionError::Authorization(format!(
                "completion endpoint returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(CompletionError::Transport(format!(
                "completion endpoint returned {}",
                status
            )));
        }

        let mut bytes = response.bytes_stream();

        let stream = try_stream! {
            let mut buffer = String::new();

            'outer: loop {
                // Checking cancellation before every network read means a
                // fired token also aborts the in-flight transfer: ending the
                // generator drops the response stream.
                let chunk = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(CompletionError::Cancelled),
                    chunk = bytes.next() => match chunk {
                        Some(chunk) => chunk.map_err(|e| CompletionError::Transport(e.to_string())),
                        None => break,
                    },
                }?;

                let chunk_str = std::str::from_utf8(&chunk)
                    .map_err(|e| CompletionError::Protocol(e.to_string()))?;

                // Append new data to the buffer. This is necessary to handle
                // SSE fragmentation over HTTP/2 frames.
                buffer.push_str(chunk_str);

                // Process all complete SSE events from the buffer
                while let Some(event_end) = buffer.find("\n\n") {
                    let event = buffer[..event_end].trim().to_string();
                    buffer.drain(..event_end + 2);

                    if event.is_empty() || !event.starts_with("data: ") {
                        continue;
                    }

                    // Extract the JSON payload (after "data: ")
                    let data = event[6..].trim();
                    if data.is_empty() {
                        continue;
                    }
                    if data == "[DONE]" {
                        break 'outer;
                    }

                    let chunk = serde_json::from_str::<CompletionChunk>(data)
                        .map_err(|e| {
                            tracing::error!("Parsing completion chunk failed for {}\nError: {}", data, e);
                            CompletionError::Protocol(e.to_string())
                        })?;
                    let Some(choice) = chunk.choices.first() else {
                        continue;
                    };

                    match &choice.delta {
                        Delta::Content { content } => {
                            if choice.finish_reason.is_some() {
                                break 'outer;
                            }
                            if !content.is_empty() {
                                yield content.clone();
                            }
                        }
                        Delta::Stop {} => {
                            break 'outer;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
