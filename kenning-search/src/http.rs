//! Shared HTTP client construction for search provider requests.
//!
//! Provides a configured [`reqwest::Client`] with the per-call timeout,
//! compression and an identifying User-Agent.

use std::time::Duration;

use crate::config::SearchConfig;
use crate::error::SearchError;

/// User-Agent sent when the config does not override it.
pub const DEFAULT_USER_AGENT: &str = concat!("kenning/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] configured for provider API calls.
///
/// The client has:
/// - Timeout of `config.per_call_timeout_secs`
/// - The configured User-Agent, or [`DEFAULT_USER_AGENT`]
/// - Brotli and gzip decompression
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.per_call_timeout_secs))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Classify a failed send or body read from `provider`.
///
/// Hitting the client's per-call timeout is [`SearchError::Timeout`];
/// anything else is [`SearchError::Http`].
pub fn request_error(provider: &str, stage: &str, err: &reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Timeout(format!("{provider} {stage} timed out: {err}"))
    } else {
        SearchError::Http(format!("{provider} {stage} failed: {err}"))
    }
}

/// Turn a non-200 response into a [`SearchError`], reading the body for context.
///
/// 401/403 map to [`SearchError::ProviderUnavailable`] since they mean the
/// credential was rejected; everything else that is not exactly 200 is
/// [`SearchError::Http`].
pub async fn ensure_ok(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, SearchError> {
    let status = response.status();
    if status == reqwest::StatusCode::OK {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = crate::types::truncate_with_ellipsis(body.trim(), 200);
    match status.as_u16() {
        401 | 403 => Err(SearchError::ProviderUnavailable(format!(
            "{provider} rejected credential (HTTP {}): {body}",
            status.as_u16()
        ))),
        code => Err(SearchError::Http(format!(
            "{provider} returned HTTP {code}: {body}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_user_agent_names_crate() {
        assert!(DEFAULT_USER_AGENT.starts_with("kenning/"));
    }

    #[test]
    fn build_client_with_default_config() {
        let client = build_client(&SearchConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn build_client_with_custom_ua() {
        let config = SearchConfig {
            user_agent: Some("CustomBot/1.0".into()),
            ..Default::default()
        };
        assert!(build_client(&config).is_ok());
    }
}
