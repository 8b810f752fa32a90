//! Error types for the kenning-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. No API keys or sensitive data appear in
//! error messages.

/// Errors that can occur inside a single search provider call.
///
/// None of these escape the soft [`crate::SearchProvider::search`] entry
/// point; they exist so the fallible half of each provider can use `?`
/// and so the degrade path can log a meaningful reason.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The provider has no credential configured, or refused the request.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider answered 200 but the body did not match its documented shape.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// An HTTP request to a provider failed or returned a non-200 status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A provider call exceeded its timeout.
    #[error("search timed out: {0}")]
    Timeout(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for kenning-search results.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_provider_unavailable() {
        let err = SearchError::ProviderUnavailable("Brave API key not configured".into());
        assert_eq!(
            err.to_string(),
            "provider unavailable: Brave API key not configured"
        );
    }

    #[test]
    fn display_malformed_response() {
        let err = SearchError::MalformedResponse("missing field `results`".into());
        assert_eq!(
            err.to_string(),
            "malformed provider response: missing field `results`"
        );
    }

    #[test]
    fn display_timeout() {
        let err = SearchError::Timeout("exceeded 10s limit".into());
        assert_eq!(err.to_string(), "search timed out: exceeded 10s limit");
    }

    #[test]
    fn display_http() {
        let err = SearchError::Http("Exa returned HTTP 500".into());
        assert_eq!(err.to_string(), "HTTP error: Exa returned HTTP 500");
    }

    #[test]
    fn display_config() {
        let err = SearchError::Config("max_results must be > 0".into());
        assert_eq!(err.to_string(), "config error: max_results must be > 0");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
