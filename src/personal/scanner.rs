//! Personal corpus scanning and relevance filtering.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use kenning_search::SearchResult;

use super::{PersonalDocument, PersonalSource};
use crate::config::PersonalConfig;
use crate::credentials::Credential;
use crate::error::{KenningError, Result};

/// Query tokens shorter than this are ignored by the token match.
const MIN_TOKEN_CHARS: usize = 2;

/// Reads a user's documents from a [`PersonalSource`] and filters them.
pub struct PersonalCorpusScanner {
    source: Arc<dyn PersonalSource>,
    scan_limit: usize,
    long_query_threshold: Option<usize>,
    call_timeout: Duration,
}

impl std::fmt::Debug for PersonalCorpusScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalCorpusScanner")
            .field("source", &self.source.name())
            .field("scan_limit", &self.scan_limit)
            .field("long_query_threshold", &self.long_query_threshold)
            .finish()
    }
}

impl PersonalCorpusScanner {
    /// Create a scanner over `source` with limits from `config`.
    pub fn new(source: Arc<dyn PersonalSource>, config: &PersonalConfig) -> Self {
        Self {
            source,
            scan_limit: config.scan_limit,
            long_query_threshold: config.long_query_threshold,
            call_timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Default number of documents read per request.
    pub fn scan_limit(&self) -> usize {
        self.scan_limit
    }

    /// Limit on each call to the personal source.
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// List up to `limit` documents and fetch their content.
    ///
    /// Documents whose blocks cannot be fetched are skipped. Output order
    /// follows the source's listing order.
    ///
    /// # Errors
    ///
    /// Returns [`KenningError::PersonalSourceUnavailable`] without a
    /// credential, or the listing error if the document list itself fails.
    pub async fn scan(
        &self,
        credential: Option<&Credential>,
        limit: usize,
    ) -> Result<Vec<PersonalDocument>> {
        let credential = credential.ok_or_else(|| {
            KenningError::PersonalSourceUnavailable(format!(
                "no {} credential for this user",
                self.source.name()
            ))
        })?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let refs = tokio::time::timeout(
            self.call_timeout,
            self.source.list_documents(credential, limit),
        )
        .await
        .map_err(|_| KenningError::Timeout("listing personal documents timed out".into()))??;

        let fetches = refs.into_iter().map(|doc| async move {
            let fetched =
                tokio::time::timeout(self.call_timeout, self.source.fetch_blocks(credential, &doc.id))
                    .await;
            match fetched {
                Ok(Ok(blocks)) => Some(PersonalDocument::from_blocks(doc, blocks)),
                Ok(Err(e)) => {
                    tracing::warn!(doc_id = %doc.id, error = %e, "skipping personal document");
                    None
                }
                Err(_) => {
                    tracing::warn!(doc_id = %doc.id, "personal document fetch timed out, skipping");
                    None
                }
            }
        });
        let documents: Vec<PersonalDocument> = join_all(fetches).await.into_iter().flatten().collect();

        tracing::debug!(
            source = self.source.name(),
            count = documents.len(),
            "scanned personal documents"
        );
        Ok(documents)
    }

    /// Scan up to `limit` documents and keep those containing `query`.
    ///
    /// Matching is a lowercase substring test of the whole query against
    /// `title + " " + content`.
    ///
    /// # Errors
    ///
    /// Same as [`scan`](Self::scan).
    pub async fn search_content(
        &self,
        credential: Option<&Credential>,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let needle = query.trim().to_lowercase();
        let documents = self.scan(credential, limit).await?;
        Ok(documents
            .iter()
            .filter(|d| !needle.is_empty() && d.searchable_text().contains(&needle))
            .map(PersonalDocument::to_search_result)
            .collect())
    }

    /// The subset of `documents` relevant to `query`, as personal results.
    pub fn relevant_results(&self, documents: &[PersonalDocument], query: &str) -> Vec<SearchResult> {
        documents
            .iter()
            .filter(|d| is_relevant(d, query, self.long_query_threshold))
            .map(PersonalDocument::to_search_result)
            .collect()
    }
}

/// Whether `doc` should be surfaced for `query`.
///
/// A query longer than `long_query_threshold` characters matches every
/// document. Otherwise the document matches when its lowercased title and
/// text contain the whole query or any query token of two or more characters.
pub fn is_relevant(doc: &PersonalDocument, query: &str, long_query_threshold: Option<usize>) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return false;
    }
    if long_query_threshold.is_some_and(|limit| query.chars().count() > limit) {
        return true;
    }
    let haystack = doc.searchable_text();
    haystack.contains(&query)
        || query
            .split_whitespace()
            .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
            .any(|t| haystack.contains(t))
}
