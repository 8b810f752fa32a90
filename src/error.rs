//! Error types for the kenning crate.
//!
//! Each variant carries a stable error code (SCREAMING_SNAKE_CASE) that is
//! included in the Display output and accessible via [`KenningError::code()`].
//!
//! Most of these never reach a caller of the pipeline: aggregation steps
//! degrade to empty results and the answer stream reports failures as a
//! final chunk. They exist so each fallible step can use `?` and so the
//! degrade path logs a meaningful reason.

use kenning_search::SearchError;

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// Invalid or missing configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// The personal knowledge source has no credential or refused access.
    pub const PERSONAL_SOURCE_UNAVAILABLE: &str = "PERSONAL_SOURCE_UNAVAILABLE";

    /// The text generator rejected the request or returned unusable output.
    pub const GENERATION_FAILED: &str = "GENERATION_FAILED";

    /// An outbound HTTP request failed.
    pub const REQUEST_FAILED: &str = "REQUEST_FAILED";

    /// A streaming response broke off or reported an error.
    pub const STREAM_FAILED: &str = "STREAM_FAILED";

    /// Request or operation timed out.
    pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";

    /// The web search layer reported an error.
    pub const SEARCH_FAILED: &str = "SEARCH_FAILED";
}

/// Errors produced by the kenning crate.
///
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, thiserror::Error)]
pub enum KenningError {
    /// Invalid or missing configuration.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    Config(String),

    /// The personal knowledge source cannot be used.
    #[error("[{}] {}", error_codes::PERSONAL_SOURCE_UNAVAILABLE, .0)]
    PersonalSourceUnavailable(String),

    /// The text generator failed.
    #[error("[{}] {}", error_codes::GENERATION_FAILED, .0)]
    Generation(String),

    /// An outbound HTTP request failed.
    #[error("[{}] {}", error_codes::REQUEST_FAILED, .0)]
    Request(String),

    /// A streaming response failed mid-flight.
    #[error("[{}] {}", error_codes::STREAM_FAILED, .0)]
    Stream(String),

    /// Request or operation timed out.
    #[error("[{}] {}", error_codes::TIMEOUT_ERROR, .0)]
    Timeout(String),

    /// Web search layer error.
    #[error("[{}] {}", error_codes::SEARCH_FAILED, .0)]
    Search(#[from] SearchError),
}

impl KenningError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => error_codes::CONFIG_INVALID,
            Self::PersonalSourceUnavailable(_) => error_codes::PERSONAL_SOURCE_UNAVAILABLE,
            Self::Generation(_) => error_codes::GENERATION_FAILED,
            Self::Request(_) => error_codes::REQUEST_FAILED,
            Self::Stream(_) => error_codes::STREAM_FAILED,
            Self::Timeout(_) => error_codes::TIMEOUT_ERROR,
            Self::Search(_) => error_codes::SEARCH_FAILED,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Config(m)
            | Self::PersonalSourceUnavailable(m)
            | Self::Generation(m)
            | Self::Request(m)
            | Self::Stream(m)
            | Self::Timeout(m) => m.clone(),
            Self::Search(e) => e.to_string(),
        }
    }
}

/// Convenience alias for kenning results.
pub type Result<T> = std::result::Result<T, KenningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_prefix() {
        let err = KenningError::Config("scan_limit must be greater than 0".into());
        assert_eq!(
            err.to_string(),
            "[CONFIG_INVALID] scan_limit must be greater than 0"
        );
    }

    #[test]
    fn codes_are_stable() {
        let cases = [
            (KenningError::Config(String::new()), "CONFIG_INVALID"),
            (
                KenningError::PersonalSourceUnavailable(String::new()),
                "PERSONAL_SOURCE_UNAVAILABLE",
            ),
            (KenningError::Generation(String::new()), "GENERATION_FAILED"),
            (KenningError::Request(String::new()), "REQUEST_FAILED"),
            (KenningError::Stream(String::new()), "STREAM_FAILED"),
            (KenningError::Timeout(String::new()), "TIMEOUT_ERROR"),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn search_error_converts() {
        let err: KenningError = SearchError::Config("max_results must be greater than 0".into()).into();
        assert_eq!(err.code(), "SEARCH_FAILED");
        assert!(err.message().contains("max_results"));
        assert!(err.to_string().starts_with("[SEARCH_FAILED]"));
    }

    #[test]
    fn message_strips_code() {
        let err = KenningError::Timeout("no delta for 30s".into());
        assert_eq!(err.message(), "no delta for 30s");
    }
}
