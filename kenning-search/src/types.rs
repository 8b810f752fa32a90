//! Core types for search results and provider identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a search result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Public web, via one of the search providers.
    #[default]
    Web,
    /// The user's own knowledge corpus.
    Personal,
}

impl SourceKind {
    /// Returns the lowercase label used in prompts and serialised output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Personal => "personal",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single search result in the shape shared by every provider.
///
/// Identity is the normalised `url` (see
/// [`crate::orchestrator::url_normalize::normalize_url`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The title of the result page or document.
    pub title: String,
    /// The URL of the result.
    pub url: String,
    /// Longer extracted text, bounded by the provider's content limit.
    pub text_content: String,
    /// A short text snippet, bounded by the provider's snippet limit.
    pub snippet: String,
    /// Whether this result is from the web or the user's personal corpus.
    #[serde(default)]
    pub source_kind: SourceKind,
    /// Provider relevance score, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Representative image for the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Site favicon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
    /// Human-readable site or domain label reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Publication date or age string as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

impl SearchResult {
    /// Create a web result with only the mandatory fields populated.
    pub fn web(
        title: impl Into<String>,
        url: impl Into<String>,
        text_content: impl Into<String>,
    ) -> Self {
        let text_content = text_content.into();
        Self {
            title: title.into(),
            url: url.into(),
            snippet: text_content.clone(),
            text_content,
            source_kind: SourceKind::Web,
            score: None,
            image_url: None,
            favicon_url: None,
            domain: None,
            published_date: None,
        }
    }

    /// Whether this result came from the personal corpus.
    pub fn is_personal(&self) -> bool {
        self.source_kind == SourceKind::Personal
    }
}

/// Supported search providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Brave Search, keyword web search API.
    Brave,
    /// Exa, neural search API with full-text contents.
    Exa,
}

impl ProviderKind {
    /// Returns the human-readable name of this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Brave => "Brave",
            Self::Exa => "Exa",
        }
    }

    /// Returns all available provider variants.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::Brave, Self::Exa]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Truncate `text` to at most `limit` characters, appending `...` when cut.
///
/// Counts `char`s rather than bytes so multi-byte text is never split
/// mid-codepoint.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
