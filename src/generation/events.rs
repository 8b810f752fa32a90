//! Normalised streaming events from a text generator.
//!
//! A stream flows `TextDelta* → StreamEnd`, or stops early with a single
//! `StreamError`.

/// One event from a streaming generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    /// A fragment of generated text.
    TextDelta {
        /// The fragment.
        text: String,
    },
    /// The provider finished the response.
    StreamEnd {
        /// Provider finish reason (`stop`, `length`, ...), when reported.
        finish_reason: Option<String>,
    },
    /// The stream failed; no further events follow.
    StreamError {
        /// Human-readable reason.
        error: String,
    },
}

impl GenerationEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::StreamEnd { .. } | Self::StreamError { .. })
    }
}
