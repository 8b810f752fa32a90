//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls which providers are queried and in which role,
//! timeouts, text bounds and provider credentials. It deserialises from the
//! `[search]` table of the application's TOML config.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::ProviderKind;

/// Default Brave Search API origin.
pub const BRAVE_DEFAULT_BASE_URL: &str = "https://api.search.brave.com";

/// Default Exa API origin.
pub const EXA_DEFAULT_BASE_URL: &str = "https://api.exa.ai";

/// Endpoint and credential for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API key. `None` makes the provider unavailable (it returns no results).
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL of the provider API, overridable for tests and proxies.
    pub base_url: String,
}

impl ProviderSettings {
    fn with_base_url(base_url: &str) -> Self {
        Self {
            api_key: None,
            base_url: base_url.to_string(),
        }
    }

    /// The configured key, treating an empty string as absent.
    pub fn key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

/// Configuration for hybrid web search.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Provider queried first for every search.
    pub primary: ProviderKind,
    /// Provider used to top up a thin primary result set. `None` disables supplementing.
    pub supplemental: Option<ProviderKind>,
    /// Default number of results when a caller does not specify one.
    pub max_results: usize,
    /// Per-provider-call timeout in seconds.
    pub per_call_timeout_secs: u64,
    /// Soft ceiling in seconds for a whole fan-out of concurrent searches.
    pub request_budget_secs: u64,
    /// Maximum characters kept in [`crate::SearchResult::text_content`].
    pub text_content_limit: usize,
    /// Maximum characters kept in [`crate::SearchResult::snippet`].
    pub snippet_limit: usize,
    /// Custom User-Agent string. If `None`, a `kenning/<version>` agent is sent.
    pub user_agent: Option<String>,
    /// Brave Search settings.
    pub brave: ProviderSettings,
    /// Exa settings.
    pub exa: ProviderSettings,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            primary: ProviderKind::Brave,
            supplemental: Some(ProviderKind::Exa),
            max_results: 10,
            per_call_timeout_secs: 10,
            request_budget_secs: 30,
            text_content_limit: 500,
            snippet_limit: 200,
            user_agent: None,
            brave: ProviderSettings::with_base_url(BRAVE_DEFAULT_BASE_URL),
            exa: ProviderSettings::with_base_url(EXA_DEFAULT_BASE_URL),
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_results` must be greater than 0
    /// - `per_call_timeout_secs` must be greater than 0
    /// - `request_budget_secs` must be >= `per_call_timeout_secs`
    /// - content and snippet limits must be greater than 0
    /// - `supplemental` must differ from `primary`
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.per_call_timeout_secs == 0 {
            return Err(SearchError::Config(
                "per_call_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.request_budget_secs < self.per_call_timeout_secs {
            return Err(SearchError::Config(
                "request_budget_secs must be >= per_call_timeout_secs".into(),
            ));
        }
        if self.text_content_limit == 0 || self.snippet_limit == 0 {
            return Err(SearchError::Config(
                "text_content_limit and snippet_limit must be greater than 0".into(),
            ));
        }
        if self.supplemental == Some(self.primary) {
            return Err(SearchError::Config(
                "supplemental provider must differ from primary".into(),
            ));
        }
        Ok(())
    }

    /// Settings for the given provider.
    pub fn provider(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::Brave => &self.brave,
            ProviderKind::Exa => &self.exa,
        }
    }
}
