//! Text generation boundary.
//!
//! The rest of the crate only sees [`TextGenerator`]: a one-shot
//! [`complete`](TextGenerator::complete) for structured JSON answers
//! (profile analysis, query expansion) and a [`stream`](TextGenerator::stream)
//! of [`GenerationEvent`]s for the cited answer. [`openai::OpenAiGenerator`]
//! is the shipped implementation.

pub mod events;
pub mod openai;
pub mod sse;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

pub use events::GenerationEvent;
pub use openai::OpenAiGenerator;

use crate::error::Result;

/// A boxed, sendable stream of generation events.
pub type GenerationStream = Pin<Box<dyn Stream<Item = GenerationEvent> + Send>>;

/// A single generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// System instructions, sent before the prompt.
    pub system: Option<String>,
    /// The user prompt.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// A request with temperature 0.1 and a 1000-token limit.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: 0.1,
            max_tokens: 1000,
        }
    }

    /// Set the system instructions.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// An opaque text-completion service.
///
/// Implementations must be `Send + Sync` so one instance can be shared
/// across requests behind an `Arc`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Generate a full response in one call.
    ///
    /// # Errors
    ///
    /// Returns a [`KenningError`](crate::error::KenningError) for transport,
    /// status or decoding failures.
    async fn complete(&self, request: &GenerationRequest) -> Result<String>;

    /// Start a streamed response.
    ///
    /// Errors before the first byte are returned here; errors after that
    /// arrive as [`GenerationEvent::StreamError`]. Dropping the stream
    /// cancels the underlying request.
    ///
    /// # Errors
    ///
    /// Returns a [`KenningError`](crate::error::KenningError) if the request
    /// cannot be started or the provider rejects it.
    async fn stream(&self, request: &GenerationRequest) -> Result<GenerationStream>;
}
