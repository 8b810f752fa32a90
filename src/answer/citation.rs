//! Numbered source list shared by the prompt and the caller.

use kenning_search::{SearchResult, SourceKind};
use serde::{Deserialize, Serialize};

/// One numbered source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationEntry {
    /// 1-based citation number.
    pub index: usize,
    /// Source URL.
    pub url: String,
    /// Source title.
    pub title: String,
    /// Personal or web.
    pub source_kind: SourceKind,
    /// Representative image, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Site favicon, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
}

/// Citation numbers `1..=N` over a result set, personal sources first.
///
/// Built once per answer and never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationMap {
    entries: Vec<CitationEntry>,
}

/// `results` reordered so personal results precede web results.
///
/// The partition is stable: each group keeps its incoming order.
pub fn personal_first(results: &[SearchResult]) -> Vec<&SearchResult> {
    let (personal, web): (Vec<&SearchResult>, Vec<&SearchResult>) =
        results.iter().partition(|r| r.is_personal());
    personal.into_iter().chain(web).collect()
}

impl CitationMap {
    /// Number every result, personal first.
    pub fn from_results(results: &[SearchResult]) -> Self {
        let entries = personal_first(results)
            .into_iter()
            .enumerate()
            .map(|(i, r)| CitationEntry {
                index: i + 1,
                url: r.url.clone(),
                title: r.title.clone(),
                source_kind: r.source_kind,
                image_url: r.image_url.clone(),
                favicon_url: r.favicon_url.clone(),
            })
            .collect();
        Self { entries }
    }

    /// The entry for citation `index`.
    pub fn get(&self, index: usize) -> Option<&CitationEntry> {
        index.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// All entries in citation order.
    pub fn entries(&self) -> &[CitationEntry] {
        &self.entries
    }

    /// Number of cited sources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no sources.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any cited source is personal.
    pub fn has_personal(&self) -> bool {
        self.entries
            .first()
            .is_some_and(|e| e.source_kind == SourceKind::Personal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web(url: &str) -> SearchResult {
        SearchResult::web(url, url, "body")
    }

    fn personal(url: &str) -> SearchResult {
        let mut r = web(url);
        r.source_kind = SourceKind::Personal;
        r
    }

    #[test]
    fn indices_contiguous_personal_first() {
        let results = vec![
            web("https://a.com"),
            personal("https://notion.so/1"),
            web("https://b.com"),
            personal("https://notion.so/2"),
        ];
        let map = CitationMap::from_results(&results);
        let indices: Vec<usize> = map.entries().iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        let urls: Vec<&str> = map.entries().iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://notion.so/1", "https://notion.so/2", "https://a.com", "https://b.com"]
        );
        assert!(map.has_personal());
    }

    #[test]
    fn lookup_is_one_based() {
        let map = CitationMap::from_results(&[web("https://a.com")]);
        assert!(map.get(0).is_none());
        assert_eq!(map.get(1).map(|e| e.url.as_str()), Some("https://a.com"));
        assert!(map.get(2).is_none());
    }

    #[test]
    fn empty_results_give_empty_map() {
        let map = CitationMap::from_results(&[]);
        assert!(map.is_empty());
        assert!(!map.has_personal());
    }

    #[test]
    fn serialises_as_list() {
        let map = CitationMap::from_results(&[personal("https://notion.so/1")]);
        let json = serde_json::to_value(&map).expect("serialize");
        assert_eq!(json[0]["index"], 1);
        assert_eq!(json[0]["source_kind"], "personal");
        assert!(json[0].get("image_url").is_none());
    }
}
