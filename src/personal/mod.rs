//! Personal knowledge corpus: source boundary, documents and scanning.
//!
//! A [`PersonalSource`] lists a user's documents and fetches their raw
//! blocks. [`scanner::PersonalCorpusScanner`] turns those into
//! [`PersonalDocument`]s and personal [`SearchResult`]s.

pub mod blocks;
pub mod notion;
pub mod scanner;

use async_trait::async_trait;
use kenning_search::{SearchResult, SourceKind, truncate_with_ellipsis};
use serde_json::Value;

pub use notion::NotionClient;
pub use scanner::PersonalCorpusScanner;

use crate::credentials::Credential;
use crate::error::Result;

/// Maximum characters kept in a personal result's `text_content`.
pub const PERSONAL_TEXT_LIMIT: usize = 500;

/// Maximum characters of document text quoted in a personal result's snippet.
pub const PERSONAL_SNIPPET_LIMIT: usize = 200;

/// A document listed by a personal source, before its content is fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRef {
    /// Source-specific identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Link back to the document.
    pub url: String,
}

/// A scanned document with its flattened text.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalDocument {
    /// Source-specific identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Link back to the document.
    pub url: String,
    /// Blocks as returned by the source.
    pub raw_blocks: Vec<Value>,
    /// Plain text extracted from `raw_blocks`.
    pub extracted_text: String,
}

impl PersonalDocument {
    /// Build a document, extracting text from `raw_blocks`.
    pub fn from_blocks(doc: DocumentRef, raw_blocks: Vec<Value>) -> Self {
        let extracted_text = blocks::extract_text(&raw_blocks);
        Self {
            id: doc.id,
            title: doc.title,
            url: doc.url,
            raw_blocks,
            extracted_text,
        }
    }

    /// Lowercased `title + " " + text`, the haystack for relevance checks.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.extracted_text).to_lowercase()
    }

    /// This document as a personal search result.
    ///
    /// An empty document still yields usable text naming the page.
    pub fn to_search_result(&self) -> SearchResult {
        let has_text = !self.extracted_text.trim().is_empty();
        let text = if has_text {
            self.extracted_text.clone()
        } else {
            format!("Content from Notion page: {}", self.title)
        };
        let snippet = if has_text {
            format!(
                "From your personal Notion page: {}",
                truncate_with_ellipsis(&self.extracted_text, PERSONAL_SNIPPET_LIMIT)
            )
        } else {
            format!("Your personal Notion page: {}", self.title)
        };

        let mut result = SearchResult::web(
            self.title.clone(),
            self.url.clone(),
            truncate_with_ellipsis(&text, PERSONAL_TEXT_LIMIT),
        );
        result.snippet = snippet;
        result.source_kind = SourceKind::Personal;
        result.domain = Some("notion.so".into());
        result
    }
}

/// A user's personal knowledge store.
#[async_trait]
pub trait PersonalSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// List up to `limit` documents visible to `credential`.
    ///
    /// # Errors
    ///
    /// Returns [`KenningError::PersonalSourceUnavailable`](crate::error::KenningError::PersonalSourceUnavailable)
    /// when the credential is refused, or a request error otherwise.
    async fn list_documents(&self, credential: &Credential, limit: usize) -> Result<Vec<DocumentRef>>;

    /// Fetch the top-level blocks of one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    async fn fetch_blocks(&self, credential: &Credential, id: &str) -> Result<Vec<Value>>;
}
