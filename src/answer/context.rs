//! Prompt assembly for cited answers.

use kenning_search::{SearchResult, SourceKind};

use super::citation::{CitationMap, personal_first};

/// Heading above the user's own documents.
pub const PERSONAL_HEADING: &str = "PERSONAL KNOWLEDGE";

/// Heading above web results.
pub const WEB_HEADING: &str = "WEB SEARCH RESULTS";

/// System instructions sent with every answer request.
pub const ANSWER_SYSTEM_PROMPT: &str = "You are a personalised research assistant. You can read \
the user's own notes as well as fresh web results. Connect what they already know with what is \
new, acknowledge their existing interests where relevant, and cite every claim.";

/// A ready-to-send prompt and the citations it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerContext {
    /// User prompt: sources, question and formatting instructions.
    pub prompt: String,
    /// Citation numbers used in `prompt`.
    pub citations: CitationMap,
}

/// Lay out `results` as numbered sources and append answer instructions.
///
/// Personal sources come first under [`PERSONAL_HEADING`], then web sources
/// under [`WEB_HEADING`], numbered consecutively across both blocks. With
/// any personal source the instructions ask for linked `[[n]](url)`
/// citations, inline images and an opening that names the user's notes;
/// otherwise plain `[n]` citations.
pub fn build_context(query: &str, results: &[SearchResult]) -> AnswerContext {
    let citations = CitationMap::from_results(results);
    let ordered = personal_first(results);

    let mut prompt = String::new();
    let mut current: Option<SourceKind> = None;
    for (entry, result) in citations.entries().iter().zip(ordered.iter()) {
        if current != Some(result.source_kind) {
            if current.is_some() {
                prompt.push('\n');
            }
            prompt.push_str(match result.source_kind {
                SourceKind::Personal => PERSONAL_HEADING,
                SourceKind::Web => WEB_HEADING,
            });
            prompt.push_str(":\n");
            current = Some(result.source_kind);
        }
        let body = if result.text_content.trim().is_empty() {
            &result.snippet
        } else {
            &result.text_content
        };
        prompt.push_str(&format!(
            "[{}] {}\n{}\nURL: {}\n",
            entry.index, result.title, body, result.url
        ));
        if let Some(image) = &result.image_url {
            prompt.push_str(&format!("Image: {image}\n"));
        }
    }
    if !citations.is_empty() {
        prompt.push('\n');
    }

    prompt.push_str(&format!("QUESTION: {query}\n\n"));

    if citations.has_personal() {
        let topics: Vec<&str> = ordered
            .iter()
            .filter(|r| r.is_personal())
            .map(|r| r.title.trim())
            .collect();
        prompt.push_str(&format!(
            "INSTRUCTIONS:\n\
             Open with: \"Based on your Notion page about {}, I searched for ...\" naming the \
             angles you searched, then summarise the newest developments in that area.\n\
             Cite sources as linked numbers, for example [[1]](https://example.com), using each \
             source's URL.\n\
             Where an image helps, embed it inline as ![description](image_url).\n\
             Organise the answer under short headings and relate web findings to the user's notes.\n",
            topics.join(", ")
        ));
    } else {
        prompt.push_str(
            "INSTRUCTIONS:\n\
             Answer the question thoroughly from the sources above. Cite them as [1], [2] and so on.\n",
        );
    }

    AnswerContext { prompt, citations }
}
