//! Hybrid search: primary provider, conditional supplement, dedup, fallback.
//!
//! A single search asks the primary provider first and only calls the
//! supplemental provider when the primary came back thin. Multi-query
//! searches (personalised expansion) fan out concurrently under a
//! request-wide budget.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::provider::SearchProvider;
use crate::providers::build_provider;
use crate::types::SearchResult;

use super::dedup::dedup_first_seen;
use super::expert::ExpertMode;
use super::fallback::fallback_results;
use super::scoring::rank_for_expert_mode;

/// Fans queries out to a primary and an optional supplemental provider.
///
/// Holds no per-request state; share one instance behind an `Arc`.
pub struct HybridSearch {
    primary: Arc<dyn SearchProvider>,
    supplemental: Option<Arc<dyn SearchProvider>>,
    request_budget: Duration,
}

impl std::fmt::Debug for HybridSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridSearch")
            .field("primary", &self.primary.kind())
            .field("supplemental", &self.supplemental.as_ref().map(|s| s.kind()))
            .field("request_budget", &self.request_budget)
            .finish()
    }
}

impl HybridSearch {
    /// Create an orchestrator over explicit provider instances.
    pub fn new(
        primary: Arc<dyn SearchProvider>,
        supplemental: Option<Arc<dyn SearchProvider>>,
    ) -> Self {
        Self {
            primary,
            supplemental,
            request_budget: Duration::from_secs(30),
        }
    }

    /// The soft ceiling for a multi-query fan-out.
    pub fn request_budget(&self) -> Duration {
        self.request_budget
    }

    /// Override the soft ceiling for a multi-query fan-out.
    pub fn with_request_budget(mut self, budget: Duration) -> Self {
        self.request_budget = budget;
        self
    }

    /// Validate `config` and build the configured providers.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid config, or
    /// [`SearchError::Http`] if a provider's HTTP client cannot be built.
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let primary = build_provider(config.primary, config)?;
        let supplemental = config
            .supplemental
            .map(|kind| build_provider(kind, config))
            .transpose()?;
        Ok(Self::new(primary, supplemental)
            .with_request_budget(Duration::from_secs(config.request_budget_secs)))
    }

    /// Search with primary-then-supplement fallback.
    ///
    /// # Pipeline
    ///
    /// 1. Ask the primary provider for `count` results
    /// 2. If it returned none, or fewer than `count / 2`, ask the
    ///    supplemental provider for the remainder
    /// 3. Deduplicate by normalised URL, first seen wins
    /// 4. Truncate to `count`
    /// 5. If nothing survived, return the deterministic fallback set
    ///
    /// Never fails. Returns an empty vector only when `count == 0`.
    pub async fn search(&self, query: &str, count: usize) -> Vec<SearchResult> {
        if count == 0 {
            return Vec::new();
        }
        let results = self.search_live(query, count).await;
        if results.is_empty() {
            tracing::warn!("all providers failed, serving fallback results");
            return fallback_results(query, count);
        }
        results
    }

    /// Steps 1 to 4 of [`search`](Self::search): provider results only.
    ///
    /// Empty when every provider failed. Never returns the fallback set.
    pub async fn search_live(&self, query: &str, count: usize) -> Vec<SearchResult> {
        if count == 0 {
            return Vec::new();
        }

        let mut results = self.primary.search(query, count).await;
        tracing::debug!(
            provider = %self.primary.kind(),
            count = results.len(),
            "primary provider returned results"
        );

        if results.is_empty() || results.len() < count / 2 {
            if let Some(supplemental) = &self.supplemental {
                let remainder = count.saturating_sub(results.len());
                tracing::debug!(
                    provider = %supplemental.kind(),
                    remainder,
                    "primary result set thin, supplementing"
                );
                results.extend(supplemental.search(query, remainder).await);
            }
        }

        let mut results = dedup_first_seen(results);
        results.truncate(count);
        results
    }

    /// Search biased towards a named domain.
    ///
    /// Appends the mode's keywords, over-fetches `2 × count` for filtering
    /// headroom, re-scores each result as `0.7 × score + 0.3 × domain_match`,
    /// stable-sorts descending and truncates to `count`.
    pub async fn search_with_expert_mode(
        &self,
        query: &str,
        mode: ExpertMode,
        count: usize,
    ) -> Vec<SearchResult> {
        let enhanced = mode.enhance_query(query);
        tracing::trace!(query = %enhanced, %mode, "expert-mode search");
        let results = self.search(&enhanced, count.saturating_mul(2)).await;
        let mut ranked = rank_for_expert_mode(results, mode);
        ranked.truncate(count);
        ranked
    }

    /// Run several queries concurrently and merge their results.
    ///
    /// Live results come from [`search_many_live`](Self::search_many_live)
    /// under the request budget. The fallback set, templated on the first
    /// query and sized for `count`, is returned only when no query produced
    /// a live result.
    pub async fn search_many(&self, queries: &[String], count: usize) -> Vec<SearchResult> {
        if queries.is_empty() || count == 0 {
            return Vec::new();
        }
        let merged = self
            .search_many_live(queries, count, self.request_budget)
            .await;
        if merged.is_empty() {
            tracing::warn!(
                queries = queries.len(),
                "no live results for any query, serving fallback results"
            );
            return fallback_results(&queries[0], count);
        }
        merged
    }

    /// Concurrent fan-out over `queries` with no fallback.
    ///
    /// Each query gets a fair share `ceil(count / queries.len())` and runs
    /// through [`search_live`](Self::search_live). Queries still running
    /// when `budget` expires contribute nothing. Output is ordered by query
    /// position, then by each query's own order, deduplicated and
    /// truncated to `count`. Empty when every provider call failed.
    pub async fn search_many_live(
        &self,
        queries: &[String],
        count: usize,
        budget: Duration,
    ) -> Vec<SearchResult> {
        if queries.is_empty() || count == 0 {
            return Vec::new();
        }
        let share = count.div_ceil(queries.len()).max(1);

        let mut pending: FuturesUnordered<_> = queries
            .iter()
            .enumerate()
            .map(|(idx, q)| async move { (idx, self.search_live(q, share).await) })
            .collect();

        let mut per_query: Vec<Vec<SearchResult>> = vec![Vec::new(); queries.len()];
        let deadline = tokio::time::Instant::now() + budget;

        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((idx, results))) => per_query[idx] = results,
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        unfinished = pending.len(),
                        budget_ms = budget.as_millis() as u64,
                        "request budget exhausted, dropping unfinished queries"
                    );
                    break;
                }
            }
        }

        let mut merged = dedup_first_seen(per_query.into_iter().flatten().collect());
        merged.truncate(count);
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedProvider {
        kind: ProviderKind,
        results: Vec<SearchResult>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl FixedProvider {
        fn new(kind: ProviderKind, urls: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                kind,
                results: urls
                    .iter()
                    .map(|u| SearchResult::web(format!("{kind} {u}"), *u, "content"))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, usize)> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl SearchProvider for FixedProvider {
        async fn try_search(
            &self,
            query: &str,
            count: usize,
        ) -> Result<Vec<SearchResult>, SearchError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((query.to_string(), count));
            }
            if self.results.is_empty() {
                return Err(SearchError::ProviderUnavailable("no key".into()));
            }
            Ok(self.results.iter().take(count).cloned().collect())
        }

        fn kind(&self) -> ProviderKind {
            self.kind
        }
    }

    #[tokio::test]
    async fn full_primary_skips_supplement() {
        let primary = FixedProvider::new(ProviderKind::Brave, &["https://a.com", "https://b.com"]);
        let supplemental = FixedProvider::new(ProviderKind::Exa, &["https://c.com"]);
        let search = HybridSearch::new(primary.clone(), Some(supplemental.clone()));

        let results = search.search("q", 4).await;
        assert_eq!(results.len(), 2);
        assert!(supplemental.calls().is_empty());
    }

    #[tokio::test]
    async fn zero_count_returns_empty_without_calls() {
        let primary = FixedProvider::new(ProviderKind::Brave, &["https://a.com"]);
        let search = HybridSearch::new(primary.clone(), None);
        assert!(search.search("q", 0).await.is_empty());
        assert!(primary.calls().is_empty());
    }

    #[tokio::test]
    async fn no_supplemental_and_failing_primary_uses_fallback() {
        let primary = FixedProvider::new(ProviderKind::Brave, &[]);
        let search = HybridSearch::new(primary, None);
        let results = search.search("q", 3).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(super::super::fallback::is_fallback));
    }

    #[tokio::test]
    async fn expert_mode_over_fetches_and_truncates() {
        let primary = FixedProvider::new(
            ProviderKind::Brave,
            &["https://example.com/1", "https://arxiv.org/2", "https://example.com/3"],
        );
        let search = HybridSearch::new(primary.clone(), None);

        let results = search
            .search_with_expert_mode("llm", ExpertMode::Technology, 2)
            .await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://arxiv.org/2");
        let calls = primary.calls();
        assert_eq!(calls[0].0, "llm tech innovation research development");
        assert_eq!(calls[0].1, 4);
    }

    #[tokio::test]
    async fn search_many_splits_count_fairly() {
        let primary = FixedProvider::new(
            ProviderKind::Brave,
            &["https://a.com", "https://b.com", "https://c.com", "https://d.com"],
        );
        let search = HybridSearch::new(primary.clone(), None);
        let queries = vec!["one".to_string(), "two".to_string(), "three".to_string()];

        let results = search.search_many(&queries, 10).await;
        // Every query sees the same provider results, so dedup leaves the 4 distinct URLs.
        assert_eq!(results.len(), 4);
        let calls = primary.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(_, n)| *n == 4));
    }

    #[tokio::test]
    async fn search_many_with_no_queries_is_empty() {
        let primary = FixedProvider::new(ProviderKind::Brave, &["https://a.com"]);
        let search = HybridSearch::new(primary, None);
        assert!(search.search_many(&[], 5).await.is_empty());
    }

    /// Fails for `failing_query` and returns live results for any other query.
    struct FlakyProvider {
        failing_query: &'static str,
    }

    #[async_trait]
    impl SearchProvider for FlakyProvider {
        async fn try_search(
            &self,
            query: &str,
            count: usize,
        ) -> Result<Vec<SearchResult>, SearchError> {
            if query == self.failing_query {
                return Err(SearchError::Http("Brave returned HTTP 429: slow down".into()));
            }
            Ok((0..count)
                .map(|i| {
                    SearchResult::web(
                        format!("{query} {i}"),
                        format!("https://live.com/{query}/{i}"),
                        "content",
                    )
                })
                .collect())
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Brave
        }
    }

    #[tokio::test]
    async fn search_many_keeps_fallback_out_of_partial_failures() {
        let primary = Arc::new(FlakyProvider { failing_query: "flaky" });
        let supplemental = FixedProvider::new(ProviderKind::Exa, &[]);
        let search = HybridSearch::new(primary, Some(supplemental));
        let queries = vec!["original".to_string(), "flaky".to_string()];

        let results = search.search_many(&queries, 10).await;
        assert_eq!(results.len(), 5);
        assert!(!results.iter().any(super::super::fallback::is_fallback));
        assert!(results.iter().all(|r| r.url.starts_with("https://live.com/original/")));
    }

    #[tokio::test]
    async fn search_many_falls_back_once_sized_for_whole_request() {
        let primary = FixedProvider::new(ProviderKind::Brave, &[]);
        let supplemental = FixedProvider::new(ProviderKind::Exa, &[]);
        let search = HybridSearch::new(primary, Some(supplemental));
        let queries: Vec<String> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|q| q.to_string())
            .collect();

        let results = search.search_many(&queries, 10).await;
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(super::super::fallback::is_fallback));
        assert_eq!(results, fallback_results("a", 10));
    }

    #[tokio::test]
    async fn search_live_never_serves_fallback() {
        let primary = FixedProvider::new(ProviderKind::Brave, &[]);
        let search = HybridSearch::new(primary, None);
        assert!(search.search_live("q", 3).await.is_empty());
    }

    #[test]
    fn from_config_rejects_invalid_config() {
        let config = SearchConfig {
            max_results: 0,
            ..Default::default()
        };
        assert!(HybridSearch::from_config(&config).is_err());
    }

    #[test]
    fn from_config_builds_both_providers() {
        let search = HybridSearch::from_config(&SearchConfig::default()).expect("valid");
        let debug = format!("{search:?}");
        assert!(debug.contains("Brave"));
        assert!(debug.contains("Exa"));
    }
}
