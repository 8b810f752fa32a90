//! Brave Search: keyword web search over the public JSON API.
//!
//! `GET {base}/res/v1/web/search` authenticated with the
//! `X-Subscription-Token` header.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{ProviderSettings, SearchConfig};
use crate::error::SearchError;
use crate::http;
use crate::provider::SearchProvider;
use crate::types::{truncate_with_ellipsis, ProviderKind, SearchResult, SourceKind};

/// Largest `count` the Brave API accepts per request.
const BRAVE_MAX_COUNT: usize = 20;

/// Brave Search API client.
///
/// Primary provider by default: fast keyword results with site labels,
/// thumbnails and favicons, but no relevance score.
pub struct BraveProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
    timeout: Duration,
    text_limit: usize,
    snippet_limit: usize,
}

impl BraveProvider {
    /// Create a Brave client from the shared search configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http::build_client(config)?,
            settings: config.brave.clone(),
            timeout: Duration::from_secs(config.per_call_timeout_secs),
            text_limit: config.text_content_limit,
            snippet_limit: config.snippet_limit,
        })
    }
}

impl std::fmt::Debug for BraveProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraveProvider")
            .field("base_url", &self.settings.base_url)
            .field("has_key", &self.settings.key().is_some())
            .finish()
    }
}

#[async_trait]
impl SearchProvider for BraveProvider {
    async fn try_search(
        &self,
        query: &str,
        count: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let key = self.settings.key().ok_or_else(|| {
            SearchError::ProviderUnavailable("Brave API key not configured".into())
        })?;

        tracing::trace!(query, count, "Brave search");

        let url = format!(
            "{}/res/v1/web/search",
            self.settings.base_url.trim_end_matches('/')
        );
        let count_param = count.clamp(1, BRAVE_MAX_COUNT).to_string();
        let params = [
            ("q", query),
            ("count", count_param.as_str()),
            ("search_lang", "en"),
            ("country", "US"),
            ("safesearch", "moderate"),
            ("text_decorations", "false"),
            ("spellcheck", "true"),
        ];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", key)
            .send()
            .await
            .map_err(|e| http::request_error("Brave", "request", &e))?;

        let body = http::ensure_ok("Brave", response)
            .await?
            .text()
            .await
            .map_err(|e| http::request_error("Brave", "response read", &e))?;

        tracing::trace!(bytes = body.len(), "Brave response received");

        parse_brave_response(&body, count, self.text_limit, self.snippet_limit)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Brave
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveItem>,
}

#[derive(Debug, Deserialize)]
struct BraveItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    age: Option<String>,
    #[serde(default)]
    profile: Option<BraveProfile>,
    #[serde(default)]
    thumbnail: Option<BraveThumbnail>,
    #[serde(default)]
    meta_url: Option<BraveMetaUrl>,
}

#[derive(Debug, Deserialize)]
struct BraveProfile {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BraveThumbnail {
    #[serde(default)]
    src: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BraveMetaUrl {
    #[serde(default)]
    favicon: Option<String>,
}

/// Parse a Brave web-search JSON body into search results.
///
/// Extracted as a separate function for testability with canned JSON.
pub(crate) fn parse_brave_response(
    body: &str,
    max_results: usize,
    text_limit: usize,
    snippet_limit: usize,
) -> Result<Vec<SearchResult>, SearchError> {
    let parsed: BraveResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::MalformedResponse(format!("Brave: {e}")))?;

    let items = parsed.web.map(|w| w.results).unwrap_or_default();

    let results: Vec<SearchResult> = items
        .into_iter()
        .filter(|item| !item.url.trim().is_empty())
        .take(max_results)
        .map(|item| SearchResult {
            title: item.title.trim().to_string(),
            text_content: truncate_with_ellipsis(&item.description, text_limit),
            snippet: truncate_with_ellipsis(&item.description, snippet_limit),
            url: item.url,
            source_kind: SourceKind::Web,
            score: None,
            image_url: item.thumbnail.and_then(|t| t.src),
            favicon_url: item.meta_url.and_then(|m| m.favicon),
            domain: item.profile.and_then(|p| p.name),
            published_date: item.age,
        })
        .collect();

    tracing::debug!(count = results.len(), "Brave results parsed");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MOCK_BRAVE_JSON: &str = r#"{
        "type": "search",
        "web": {
            "results": [
                {
                    "title": "Rust Programming Language",
                    "url": "https://www.rust-lang.org/",
                    "description": "A language empowering everyone to build reliable and efficient software.",
                    "age": "2 days ago",
                    "profile": {"name": "Rust"},
                    "thumbnail": {"src": "https://imgs.search.brave.com/rust.png"},
                    "meta_url": {"favicon": "https://imgs.search.brave.com/favicon.ico"}
                },
                {
                    "title": "The Rust Book",
                    "url": "https://doc.rust-lang.org/book/",
                    "description": "An introductory book about Rust."
                },
                {
                    "title": "No URL entry",
                    "url": "",
                    "description": "should be skipped"
                }
            ]
        }
    }"#;

    fn test_config(server: &MockServer, key: Option<&str>) -> SearchConfig {
        let mut config = SearchConfig {
            per_call_timeout_secs: 2,
            ..Default::default()
        };
        config.brave.base_url = server.uri();
        config.brave.api_key = key.map(String::from);
        config
    }

    #[test]
    fn parse_maps_documented_fields() {
        let results = parse_brave_response(MOCK_BRAVE_JSON, 10, 500, 200).expect("should parse");
        assert_eq!(results.len(), 2);

        let first = &results[0];
        assert_eq!(first.title, "Rust Programming Language");
        assert_eq!(first.url, "https://www.rust-lang.org/");
        assert!(first.snippet.contains("reliable and efficient"));
        assert_eq!(first.domain.as_deref(), Some("Rust"));
        assert_eq!(first.published_date.as_deref(), Some("2 days ago"));
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://imgs.search.brave.com/rust.png")
        );
        assert!(first.favicon_url.is_some());
        assert!(first.score.is_none());
        assert_eq!(first.source_kind, SourceKind::Web);

        assert!(results[1].image_url.is_none());
    }

    #[test]
    fn parse_respects_max_results() {
        let results = parse_brave_response(MOCK_BRAVE_JSON, 1, 500, 200).expect("should parse");
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn parse_truncates_long_descriptions() {
        let long = "x".repeat(600);
        let body = format!(
            r#"{{"web":{{"results":[{{"title":"T","url":"https://t.com","description":"{long}"}}]}}}}"#
        );
        let results = parse_brave_response(&body, 10, 500, 200).expect("should parse");
        assert_eq!(results[0].text_content.chars().count(), 503);
        assert_eq!(results[0].snippet.chars().count(), 203);
        assert!(results[0].snippet.ends_with("..."));
    }

    #[test]
    fn parse_missing_web_section_is_empty() {
        let results = parse_brave_response(r#"{"type":"search"}"#, 10, 500, 200)
            .expect("should parse");
        assert!(results.is_empty());
    }

    #[test]
    fn parse_invalid_json_is_malformed() {
        let err = parse_brave_response("<html>", 10, 500, 200).unwrap_err();
        assert!(matches!(err, SearchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn missing_key_is_unavailable_without_network() {
        let server = MockServer::start().await;
        let provider = BraveProvider::new(&test_config(&server, None)).expect("client");
        let err = provider.try_search("rust", 5).await.unwrap_err();
        assert!(matches!(err, SearchError::ProviderUnavailable(_)));
        assert!(provider.search("rust", 5).await.is_empty());
        let received = server.received_requests().await.unwrap_or_default();
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn sends_token_and_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/res/v1/web/search"))
            .and(header("X-Subscription-Token", "brave-key"))
            .and(query_param("q", "rust async"))
            .and(query_param("count", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOCK_BRAVE_JSON))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            BraveProvider::new(&test_config(&server, Some("brave-key"))).expect("client");
        let results = provider.search("rust async", 5).await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn server_error_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/res/v1/web/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let provider =
            BraveProvider::new(&test_config(&server, Some("brave-key"))).expect("client");
        let err = provider.try_search("rust", 5).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
        assert!(provider.search("rust", 5).await.is_empty());
    }

    #[tokio::test]
    async fn rejected_key_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let provider =
            BraveProvider::new(&test_config(&server, Some("wrong"))).expect("client");
        let err = provider.try_search("rust", 5).await.unwrap_err();
        assert!(matches!(err, SearchError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn slow_response_is_cut_off() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(MOCK_BRAVE_JSON)
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let mut config = test_config(&server, Some("brave-key"));
        config.per_call_timeout_secs = 1;
        let provider = BraveProvider::new(&config).expect("client");
        let started = tokio::time::Instant::now();
        assert!(provider.search("rust", 5).await.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn slow_response_is_a_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(MOCK_BRAVE_JSON)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = test_config(&server, Some("brave-key"));
        config.per_call_timeout_secs = 1;
        let provider = BraveProvider::new(&config).expect("client");
        let err = provider.try_search("rust", 5).await.unwrap_err();
        assert!(matches!(err, SearchError::Timeout(_)), "got {err:?}");
    }

    #[test]
    fn is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BraveProvider>();
    }
}
