//! Trait definition for pluggable search providers.
//!
//! Each provider (Brave, Exa) implements [`SearchProvider`] to give the
//! orchestrator a uniform, fail-soft interface over one external API.

use std::time::Duration;

use async_trait::async_trait;

use crate::degrade::{within, OrDegrade};
use crate::error::SearchError;
use crate::types::{ProviderKind, SearchResult};

/// A pluggable search backend.
///
/// Implementors handle their own:
///
/// - request construction and credential headers
/// - HTTP status handling
/// - mapping of the provider's native JSON into [`SearchResult`]
/// - truncation of oversized text fields
///
/// The orchestrator only ever calls [`SearchProvider::search`], which never
/// fails and never blocks longer than [`SearchProvider::timeout`].
///
/// All implementations must be `Send + Sync` so they can be shared behind
/// an `Arc` across concurrent fan-out tasks.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Perform one search call and map the response.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] for a missing credential, HTTP failure,
    /// non-200 status or malformed body.
    async fn try_search(&self, query: &str, count: usize)
        -> Result<Vec<SearchResult>, SearchError>;

    /// Which [`ProviderKind`] this implementation represents.
    fn kind(&self) -> ProviderKind;

    /// Upper bound on a single call, including body download.
    fn timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    /// Fail-soft search: any error or timeout yields an empty vector.
    async fn search(&self, query: &str, count: usize) -> Vec<SearchResult> {
        if count == 0 {
            return Vec::new();
        }
        let step = self.kind().name();
        within(self.timeout(), step, async {
            self.try_search(query, count).await.or_degrade(step)
        })
        .await
    }
}
