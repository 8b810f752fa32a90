//! Streaming answer delivery.
//!
//! One spawned task drives the generator stream and forwards text through
//! a bounded channel. The consumer sees zero or more non-final chunks and
//! then exactly one final chunk, unless it hangs up or cancels first.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use kenning_search::SearchResult;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::context::{ANSWER_SYSTEM_PROMPT, build_context};
use crate::config::GenerationConfig;
use crate::error::{KenningError, Result};
use crate::generation::{GenerationEvent, GenerationRequest, TextGenerator};

/// Answer channel capacity.
pub const ANSWER_CHANNEL_CAPACITY: usize = 64;

/// Prefix of the text carried by a failed answer's final chunk.
pub const ANSWER_ERROR_PREFIX: &str =
    "Sorry, I encountered an error while generating the response: ";

/// One piece of a streamed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerChunk {
    /// New text since the previous chunk. Empty on a successful final chunk.
    pub text: String,
    /// Whether this is the last chunk.
    pub is_final: bool,
    /// All text so far, including `text`.
    pub cumulative_text: String,
    /// Set on a final chunk that reports a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnswerChunk {
    fn delta(text: String, cumulative_text: String) -> Self {
        Self {
            text,
            is_final: false,
            cumulative_text,
            error: None,
        }
    }

    fn finished(cumulative_text: String) -> Self {
        Self {
            text: String::new(),
            is_final: true,
            cumulative_text,
            error: None,
        }
    }

    fn failed(mut cumulative_text: String, error: &KenningError) -> Self {
        let text = format!("{ANSWER_ERROR_PREFIX}{}", error.message());
        cumulative_text.push_str(&text);
        Self {
            text,
            is_final: true,
            cumulative_text,
            error: Some(error.to_string()),
        }
    }

    /// Whether this chunk reports a failure.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Turns search results into a streamed, cited answer.
pub struct AnswerAssembler {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
    max_tokens: u32,
    idle_timeout: Duration,
}

impl std::fmt::Debug for AnswerAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerAssembler")
            .field("generator", &self.generator.name())
            .field("max_tokens", &self.max_tokens)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

enum Outcome {
    Completed,
    ConsumerGone,
}

impl AnswerAssembler {
    /// Create an assembler with sampling settings from `config`.
    pub fn new(generator: Arc<dyn TextGenerator>, config: &GenerationConfig) -> Self {
        Self {
            generator,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        }
    }

    /// Override the longest allowed gap between generator events.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Stream an answer to `query` grounded in `results`.
    ///
    /// Must be called inside a tokio runtime. The returned stream yields
    /// non-final chunks carrying each text delta, then one final chunk:
    /// empty on success, or carrying a readable error. Dropping the stream
    /// or cancelling `cancel` stops generation and nothing further is sent.
    pub fn stream_answer(
        &self,
        query: &str,
        results: &[SearchResult],
        cancel: CancellationToken,
    ) -> ReceiverStream<AnswerChunk> {
        let context = build_context(query, results);
        let request = GenerationRequest::new(context.prompt)
            .with_system(ANSWER_SYSTEM_PROMPT)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let (tx, rx) = mpsc::channel(ANSWER_CHANNEL_CAPACITY);
        tokio::spawn(drive(
            Arc::clone(&self.generator),
            request,
            tx,
            cancel,
            self.idle_timeout,
        ));
        ReceiverStream::new(rx)
    }
}

async fn drive(
    generator: Arc<dyn TextGenerator>,
    request: GenerationRequest,
    tx: mpsc::Sender<AnswerChunk>,
    cancel: CancellationToken,
    idle_timeout: Duration,
) {
    let mut text = String::new();
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!("answer cancelled");
            return;
        }
        _ = tx.closed() => {
            tracing::debug!("answer consumer hung up");
            return;
        }
        outcome = pump(generator.as_ref(), &request, &tx, &mut text, idle_timeout) => outcome,
    };

    let last = match outcome {
        Ok(Outcome::ConsumerGone) => return,
        Ok(Outcome::Completed) => {
            tracing::debug!(chars = text.len(), "answer complete");
            AnswerChunk::finished(text)
        }
        Err(e) => {
            tracing::warn!(error = %e, "answer generation failed");
            AnswerChunk::failed(text, &e)
        }
    };
    if cancel.is_cancelled() {
        return;
    }
    let _ = tx.send(last).await;
}

async fn pump(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
    tx: &mpsc::Sender<AnswerChunk>,
    text: &mut String,
    idle_timeout: Duration,
) -> Result<Outcome> {
    let idle = || {
        KenningError::Timeout(format!(
            "no output from {} for {}s",
            generator.name(),
            idle_timeout.as_secs()
        ))
    };

    let mut stream = tokio::time::timeout(idle_timeout, generator.stream(request))
        .await
        .map_err(|_| idle())??;

    loop {
        let event = tokio::time::timeout(idle_timeout, stream.next())
            .await
            .map_err(|_| idle())?;
        match event {
            Some(GenerationEvent::TextDelta { text: delta }) => {
                text.push_str(&delta);
                if tx.send(AnswerChunk::delta(delta, text.clone())).await.is_err() {
                    return Ok(Outcome::ConsumerGone);
                }
            }
            Some(GenerationEvent::StreamEnd { .. }) | None => return Ok(Outcome::Completed),
            Some(GenerationEvent::StreamError { error }) => return Err(KenningError::Stream(error)),
        }
    }
}
