//! Personalised search: the request-level service.
//!
//! [`PersonalizedSearch`] owns one instance of each collaborator and runs
//! the full aggregation for a query. Every sub-step degrades on failure,
//! so a search always produces a (possibly fallback) result set.

use std::sync::Arc;
use std::time::Duration;

use kenning_search::orchestrator::dedup::merge_unique;
use kenning_search::orchestrator::fallback::fallback_results;
use kenning_search::{ExpertMode, HybridSearch, OrDegrade, SearchResult, within};
use serde::Serialize;
use tokio::time::Instant;
use tracing::Instrument;

use crate::answer::CitationMap;
use crate::config::KenningConfig;
use crate::credentials::TokenStore;
use crate::error::Result;
use crate::generation::TextGenerator;
use crate::personal::{NotionClient, PersonalCorpusScanner};
use crate::personalization::PersonalizationEngine;

/// The outcome of one search request.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// Merged results, personal first, unique by normalised URL.
    pub results: Vec<SearchResult>,
    /// Citation numbers over `results`.
    pub citations: CitationMap,
    /// Queries sent to the web providers. The original query is first.
    pub expanded_queries: Vec<String>,
    /// Identifier attached to this request's log span.
    pub request_id: String,
}

impl SearchResponse {
    fn new(results: Vec<SearchResult>, expanded_queries: Vec<String>, request_id: String) -> Self {
        Self {
            citations: CitationMap::from_results(&results),
            results,
            expanded_queries,
            request_id,
        }
    }
}

/// Web search combined with a user's personal corpus.
///
/// A personalised request is charged against one deadline, the search
/// crate's request budget. Credential lookup, scanning, analysis and
/// expansion each get what remains of it, and the web fan-out gets the rest.
pub struct PersonalizedSearch {
    search: Arc<HybridSearch>,
    scanner: Option<Arc<PersonalCorpusScanner>>,
    personalization: Arc<PersonalizationEngine>,
    tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for PersonalizedSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalizedSearch")
            .field("search", &self.search)
            .field("scanner", &self.scanner)
            .field("request_budget", &self.request_budget())
            .finish_non_exhaustive()
    }
}

impl PersonalizedSearch {
    /// Assemble the service from already-built parts.
    ///
    /// Without a `scanner` every request is web-only.
    pub fn new(
        search: Arc<HybridSearch>,
        scanner: Option<Arc<PersonalCorpusScanner>>,
        personalization: Arc<PersonalizationEngine>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            search,
            scanner,
            personalization,
            tokens,
        }
    }

    /// Build the providers and the Notion scanner described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the search section is invalid or an HTTP client
    /// cannot be built.
    pub fn from_config(
        config: &KenningConfig,
        generator: Arc<dyn TextGenerator>,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let search = Arc::new(HybridSearch::from_config(&config.search)?);
        let notion = Arc::new(NotionClient::from_config(&config.personal)?);
        let scanner = Arc::new(PersonalCorpusScanner::new(notion, &config.personal));
        let personalization = Arc::new(PersonalizationEngine::new(generator, &config.generation));
        Ok(Self::new(search, Some(scanner), personalization, tokens))
    }

    fn request_budget(&self) -> Duration {
        self.search.request_budget()
    }

    /// Search for `query`, personalised when `user_id` is given.
    ///
    /// Never fails. With no user, or no personal source, this is a plain
    /// hybrid web search.
    pub async fn search(&self, query: &str, count: usize, user_id: Option<&str>) -> SearchResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("search", request_id = %request_id, count);
        async {
            tracing::trace!(query, "search request");
            let (results, expanded) = match (user_id, self.scanner.as_deref()) {
                (Some(user_id), Some(scanner)) => {
                    self.search_with_personal_content(query, count, scanner, user_id)
                        .await
                }
                _ => (self.search.search(query, count).await, vec![query.to_string()]),
            };
            tracing::debug!(
                results = results.len(),
                personal = results.iter().filter(|r| r.is_personal()).count(),
                "search complete"
            );
            SearchResponse::new(results, expanded, request_id.clone())
        }
        .instrument(span)
        .await
    }

    /// Search biased towards an expert domain.
    ///
    /// An unrecognised `mode` falls back to a plain web search.
    pub async fn search_expert(&self, query: &str, mode: &str, count: usize) -> SearchResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("expert_search", request_id = %request_id, mode, count);
        async {
            tracing::trace!(query, "expert search request");
            let results = match mode.parse::<ExpertMode>() {
                Ok(mode) => self.search.search_with_expert_mode(query, mode, count).await,
                Err(e) => {
                    tracing::warn!(error = %e, "unknown expert mode, using plain search");
                    self.search.search(query, count).await
                }
            };
            SearchResponse::new(results, vec![query.to_string()], request_id.clone())
        }
        .instrument(span)
        .await
    }

    async fn search_with_personal_content(
        &self,
        query: &str,
        count: usize,
        scanner: &PersonalCorpusScanner,
        user_id: &str,
    ) -> (Vec<SearchResult>, Vec<String>) {
        if count == 0 {
            return (Vec::new(), vec![query.to_string()]);
        }

        let deadline = Instant::now() + self.request_budget();
        let remaining = || deadline.saturating_duration_since(Instant::now());

        let credential = within(
            scanner.call_timeout().min(remaining()),
            "credential lookup",
            async { self.tokens.get_token(user_id).await.or_degrade("credential lookup") },
        )
        .await;
        let documents = within(remaining(), "personal scan", async {
            scanner
                .scan(credential.as_ref(), scanner.scan_limit())
                .await
                .or_degrade("personal scan")
        })
        .await;

        let profile = within(
            remaining(),
            "profile analysis",
            self.personalization.analyze(&documents),
        )
        .await;
        let mut expanded = within(
            remaining(),
            "query expansion",
            self.personalization.expand_query(query, &profile),
        )
        .await;
        if expanded.is_empty() {
            expanded.push(query.to_string());
        }
        tracing::debug!(
            documents = documents.len(),
            expanded = expanded.len(),
            remaining_ms = remaining().as_millis() as u64,
            "personal context ready"
        );

        let web = self
            .search
            .search_many_live(&expanded, count, remaining())
            .await;
        let personal = scanner.relevant_results(&documents, query);
        let merged = merge_unique(personal, web, count);
        if merged.is_empty() {
            tracing::warn!("no personal or live web results, serving fallback results");
            return (fallback_results(query, count), expanded);
        }
        (merged, expanded)
    }
}
