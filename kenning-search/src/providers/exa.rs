//! Exa: neural search with page text included in the response.
//!
//! `POST {base}/search` authenticated with the `x-api-key` header.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::config::{ProviderSettings, SearchConfig};
use crate::error::SearchError;
use crate::http;
use crate::provider::SearchProvider;
use crate::types::{truncate_with_ellipsis, ProviderKind, SearchResult, SourceKind};

/// Largest `numResults` requested from Exa per call.
const EXA_MAX_RESULTS: usize = 10;

/// Exa neural search API client.
///
/// Supplemental provider by default: slower than keyword search, but
/// returns page text and a relevance score for each hit.
pub struct ExaProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
    timeout: Duration,
    text_limit: usize,
    snippet_limit: usize,
}

impl ExaProvider {
    /// Create an Exa client from the shared search configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http::build_client(config)?,
            settings: config.exa.clone(),
            timeout: Duration::from_secs(config.per_call_timeout_secs),
            text_limit: config.text_content_limit,
            snippet_limit: config.snippet_limit,
        })
    }
}

impl std::fmt::Debug for ExaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExaProvider")
            .field("base_url", &self.settings.base_url)
            .field("has_key", &self.settings.key().is_some())
            .finish()
    }
}

#[async_trait]
impl SearchProvider for ExaProvider {
    async fn try_search(
        &self,
        query: &str,
        count: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let key = self.settings.key().ok_or_else(|| {
            SearchError::ProviderUnavailable("Exa API key not configured".into())
        })?;

        tracing::trace!(query, count, "Exa search");

        let url = format!("{}/search", self.settings.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "query": query,
            "numResults": count.clamp(1, EXA_MAX_RESULTS),
            "type": "auto",
            "contents": { "text": true },
        });

        let response = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .header("x-api-key", key)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::request_error("Exa", "request", &e))?;

        let text = http::ensure_ok("Exa", response)
            .await?
            .text()
            .await
            .map_err(|e| http::request_error("Exa", "response read", &e))?;

        tracing::trace!(bytes = text.len(), "Exa response received");

        parse_exa_response(&text, count, self.text_limit, self.snippet_limit)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Exa
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Debug, Deserialize)]
struct ExaResponse {
    results: Vec<ExaItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExaItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    favicon: Option<String>,
}

/// Parse an Exa search JSON body into search results.
///
/// Unlike Brave, a body without a `results` array is malformed.
pub(crate) fn parse_exa_response(
    body: &str,
    max_results: usize,
    text_limit: usize,
    snippet_limit: usize,
) -> Result<Vec<SearchResult>, SearchError> {
    let parsed: ExaResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::MalformedResponse(format!("Exa: {e}")))?;

    let results: Vec<SearchResult> = parsed
        .results
        .into_iter()
        .filter(|item| !item.url.trim().is_empty())
        .take(max_results)
        .map(|item| {
            let text = item.text.unwrap_or_default();
            let domain = Url::parse(&item.url)
                .ok()
                .and_then(|u| u.host_str().map(String::from));
            SearchResult {
                title: item.title.unwrap_or_default().trim().to_string(),
                text_content: truncate_with_ellipsis(&text, text_limit),
                snippet: truncate_with_ellipsis(&text, snippet_limit),
                url: item.url,
                source_kind: SourceKind::Web,
                score: item.score,
                image_url: item.image,
                favicon_url: item.favicon,
                domain,
                published_date: item.published_date,
            }
        })
        .collect();

    tracing::debug!(count = results.len(), "Exa results parsed");
    Ok(results)
}
