//! # kenning-search
//!
//! Hybrid web search for Kenning.
//!
//! This crate wraps two keyed web-search APIs behind one fail-soft
//! interface. A primary provider is always queried; a supplemental
//! provider tops up thin result sets. Results are deduplicated by
//! normalised URL and, when every provider fails, replaced by a
//! deterministic fallback set so callers always have something to cite.
//!
//! ## Design
//!
//! - Brave (keyword) and Exa (neural) providers behind [`SearchProvider`]
//! - Provider failures and timeouts degrade to empty results, never errors
//! - Expert modes bias query wording and re-rank by preferred domains
//! - Concurrent multi-query fan-out under a request-wide time budget
//! - No cross-request state: no cache, no circuit breaker
//!
//! ## Security
//!
//! - API keys are never logged and are hidden from `Debug` output
//! - Search queries are logged only at trace level

pub mod config;
pub mod degrade;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod types;

pub use config::{ProviderSettings, SearchConfig};
pub use degrade::{within, OrDegrade};
pub use error::{Result, SearchError};
pub use orchestrator::expert::ExpertMode;
pub use orchestrator::hybrid::HybridSearch;
pub use provider::SearchProvider;
pub use types::{truncate_with_ellipsis, ProviderKind, SearchResult, SourceKind};

/// Search the web with providers built from `config`.
///
/// Convenience wrapper that builds a [`HybridSearch`] for one call. Long-lived
/// callers should build the orchestrator once and reuse it.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` is invalid. Provider failures
/// never surface here; they degrade to the fallback set.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> kenning_search::Result<()> {
/// let config = kenning_search::SearchConfig::default();
/// let results = kenning_search::search("rust programming", 10, &config).await?;
/// for result in &results {
///     println!("{}: {}", result.title, result.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(query: &str, count: usize, config: &SearchConfig) -> Result<Vec<SearchResult>> {
    let orchestrator = HybridSearch::from_config(config)?;
    Ok(orchestrator.search(query, count).await)
}
