//! Result deduplication by normalised URL.
//!
//! The first occurrence of each page wins and keeps its position; later
//! duplicates are dropped. This keeps the output order a pure function of
//! the input order, which the personal-first merge and the citation
//! numbering both rely on.

use std::collections::HashSet;

use crate::types::SearchResult;

use super::url_normalize::normalize_url;

/// Remove results whose normalised URL has already been seen.
///
/// Order of the surviving results is the order of first appearance.
pub fn dedup_first_seen(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen: HashSet<String> = HashSet::with_capacity(results.len());
    results
        .into_iter()
        .filter(|r| seen.insert(normalize_url(&r.url)))
        .collect()
}

/// Append `extra` to `base`, skipping anything already present, then truncate.
pub fn merge_unique(
    base: Vec<SearchResult>,
    extra: Vec<SearchResult>,
    limit: usize,
) -> Vec<SearchResult> {
    let mut merged = base;
    merged.extend(extra);
    let mut merged = dedup_first_seen(merged);
    merged.truncate(limit);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;

    fn make_result(url: &str, title: &str) -> SearchResult {
        SearchResult::web(title, url, format!("Content for {title}"))
    }

    #[test]
    fn unique_urls_pass_through() {
        let deduped = dedup_first_seen(vec![
            make_result("https://a.com", "A"),
            make_result("https://b.com", "B"),
        ]);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn first_occurrence_wins() {
        let deduped = dedup_first_seen(vec![
            make_result("https://example.com/page", "From Brave"),
            make_result("https://b.com", "B"),
            make_result("https://example.com/page", "From Exa"),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "From Brave");
        assert_eq!(deduped[1].title, "B");
    }

    #[test]
    fn equivalent_urls_collapse() {
        let deduped = dedup_first_seen(vec![
            make_result("https://www.Example.com/page/", "One"),
            make_result("http://example.com/page?utm_source=news", "Two"),
            make_result("https://example.com/page#intro", "Three"),
        ]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].title, "One");
    }

    #[test]
    fn order_is_preserved() {
        let urls = ["https://c.com", "https://a.com", "https://b.com", "https://a.com"];
        let deduped = dedup_first_seen(urls.iter().map(|u| make_result(u, u)).collect());
        let got: Vec<&str> = deduped.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(got, vec!["https://c.com", "https://a.com", "https://b.com"]);
    }

    #[test]
    fn empty_input_returns_empty() {
        assert!(dedup_first_seen(vec![]).is_empty());
    }

    #[test]
    fn merge_keeps_base_first_and_truncates() {
        let mut personal = make_result("https://notion.so/ml", "ML Research");
        personal.source_kind = SourceKind::Personal;
        let web = vec![
            make_result("https://notion.so/ml", "duplicate"),
            make_result("https://a.com", "A"),
            make_result("https://b.com", "B"),
        ];
        let merged = merge_unique(vec![personal], web, 2);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].is_personal());
        assert_eq!(merged[1].url, "https://a.com");
    }
}
