//! OpenAI-compatible chat completions generator.
//!
//! Posts to `{base_url}/v1/chat/completions`. Streaming responses are
//! `data: {...}` SSE events carrying `choices[].delta.content`, ending with
//! `data: [DONE]`.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use super::events::GenerationEvent;
use super::sse::SseLineParser;
use super::{GenerationRequest, GenerationStream, TextGenerator};
use crate::config::GenerationConfig;
use crate::error::{KenningError, Result};

/// Text generator for any OpenAI-compatible endpoint.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    request_timeout: Duration,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl OpenAiGenerator {
    /// Build a generator from the `[generation]` config table.
    ///
    /// A missing API key is not an error here; requests fail instead, which
    /// the callers degrade.
    ///
    /// # Errors
    ///
    /// Returns [`KenningError::Config`] if the HTTP client cannot be built.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| KenningError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    async fn send(&self, request: &GenerationRequest, stream: bool) -> Result<reqwest::Response> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(KenningError::Generation("no API key configured".into()));
        };
        let body = build_chat_request(&self.model, request, stream);

        let mut builder = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body);
        if !stream {
            builder = builder.timeout(self.request_timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                KenningError::Timeout(format!("generation request timed out: {e}"))
            } else {
                KenningError::Request(format!("generation request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body_text));
        }
        Ok(response)
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String> {
        let response = self.send(request, false).await?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| KenningError::Generation(format!("invalid completion body: {e}")))?;
        body.pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| KenningError::Generation("completion had no message content".into()))
    }

    async fn stream(&self, request: &GenerationRequest) -> Result<GenerationStream> {
        let response = self.send(request, true).await?;
        tracing::debug!(model = %self.model, "generation stream opened");
        Ok(Box::pin(create_event_stream(response.bytes_stream())))
    }
}

/// Build the JSON body for a chat completions call.
pub fn build_chat_request(
    model: &str,
    request: &GenerationRequest,
    stream: bool,
) -> serde_json::Value {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system {
        messages.push(serde_json::json!({"role": "system", "content": system}));
    }
    messages.push(serde_json::json!({"role": "user", "content": request.prompt}));

    serde_json::json!({
        "model": model,
        "messages": messages,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
        "stream": stream,
    })
}

/// Map a non-2xx status to an error, preferring the provider's own message.
fn map_http_error(status: reqwest::StatusCode, body: &str) -> KenningError {
    let message = extract_error_message(body);
    match status.as_u16() {
        401 | 403 => KenningError::Generation(format!("authentication failed: {message}")),
        429 => KenningError::Request(format!("rate limited: {message}")),
        code => KenningError::Generation(format!("HTTP {code}: {message}")),
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Translate one SSE `data:` payload into events.
///
/// Unparseable payloads are skipped; an inline `error` object becomes a
/// [`GenerationEvent::StreamError`].
pub fn parse_chunk(data: &str) -> Vec<GenerationEvent> {
    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(data) else {
        return Vec::new();
    };

    if let Some(error) = parsed.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("provider reported an error");
        return vec![GenerationEvent::StreamError {
            error: message.to_string(),
        }];
    }

    let mut events = Vec::new();
    let choices = parsed.get("choices").and_then(|c| c.as_array());
    for choice in choices.into_iter().flatten() {
        if let Some(text) = choice.pointer("/delta/content").and_then(|c| c.as_str())
            && !text.is_empty()
        {
            events.push(GenerationEvent::TextDelta {
                text: text.to_string(),
            });
        }
        if let Some(reason) = choice.get("finish_reason").and_then(|f| f.as_str()) {
            events.push(GenerationEvent::StreamEnd {
                finish_reason: Some(reason.to_string()),
            });
        }
    }
    events
}

struct StreamState {
    byte_stream: Pin<Box<dyn Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send>>,
    parser: SseLineParser,
    buffered: std::collections::VecDeque<GenerationEvent>,
    finished: bool,
}

impl StreamState {
    fn absorb(&mut self, data: &str) {
        self.buffered.extend(parse_chunk(data));
    }
}

/// Turn a response byte stream into generation events.
///
/// The stream stops after the first terminal event.
fn create_event_stream(
    byte_stream: impl Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static,
) -> impl Stream<Item = GenerationEvent> + Send {
    futures_util::stream::unfold(
        StreamState {
            byte_stream: Box::pin(byte_stream),
            parser: SseLineParser::new(),
            buffered: std::collections::VecDeque::new(),
            finished: false,
        },
        |mut state| async move {
            loop {
                if state.finished {
                    return None;
                }
                if let Some(event) = state.buffered.pop_front() {
                    state.finished = event.is_terminal();
                    return Some((event, state));
                }

                match state.byte_stream.next().await {
                    Some(Ok(chunk)) => {
                        for sse in state.parser.push(&chunk) {
                            if sse.is_done() {
                                state.buffered.push_back(GenerationEvent::StreamEnd {
                                    finish_reason: None,
                                });
                            } else {
                                state.absorb(&sse.data);
                            }
                        }
                    }
                    Some(Err(e)) => {
                        state.finished = true;
                        let error = GenerationEvent::StreamError {
                            error: format!("stream read error: {e}"),
                        };
                        return Some((error, state));
                    }
                    None => {
                        if let Some(sse) = state.parser.flush()
                            && !sse.is_done()
                        {
                            state.absorb(&sse.data);
                            if !state.buffered.is_empty() {
                                continue;
                            }
                        }
                        state.finished = true;
                        return Some((GenerationEvent::StreamEnd { finish_reason: None }, state));
                    }
                }
            }
        },
    )
}
