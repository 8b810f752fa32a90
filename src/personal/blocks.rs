//! Flattening of Notion's block and page JSON into plain text.

use serde_json::Value;

/// Block types whose payload carries a `title` instead of `rich_text`.
const TITLED_BLOCKS: [&str; 2] = ["child_page", "child_database"];

/// Concatenate the readable text of `blocks`, in order, separated by spaces.
///
/// Every rich-text run contributes its `text.content` (or `plain_text` when
/// that is all the run has). Child pages and databases contribute their
/// title. Blocks with no text are skipped.
pub fn extract_text(blocks: &[Value]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for block in blocks {
        let Some(kind) = block.get("type").and_then(Value::as_str) else {
            continue;
        };
        let Some(payload) = block.get(kind) else {
            continue;
        };

        if let Some(runs) = payload.get("rich_text").and_then(Value::as_array) {
            parts.extend(runs.iter().filter_map(run_text));
        } else if TITLED_BLOCKS.contains(&kind)
            && let Some(title) = payload.get("title").and_then(Value::as_str)
        {
            parts.push(title);
        }
    }
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn run_text(run: &Value) -> Option<&str> {
    run.pointer("/text/content")
        .and_then(Value::as_str)
        .or_else(|| run.get("plain_text").and_then(Value::as_str))
}

/// The page title from its `title`-typed property.
///
/// Falls back to a top-level `title` string, then to `Untitled (id)`.
pub fn page_title(page: &Value) -> String {
    let from_property = page
        .get("properties")
        .and_then(Value::as_object)
        .and_then(|props| {
            props
                .values()
                .find(|p| p.get("type").and_then(Value::as_str) == Some("title"))
        })
        .and_then(|p| p.get("title").and_then(Value::as_array))
        .map(|runs| {
            runs.iter()
                .filter_map(|r| r.get("plain_text").and_then(Value::as_str))
                .collect::<String>()
        })
        .filter(|t| !t.trim().is_empty());

    if let Some(title) = from_property {
        return title.trim().to_string();
    }
    if let Some(title) = page.get("title").and_then(Value::as_str)
        && !title.trim().is_empty()
    {
        return title.trim().to_string();
    }
    let id = page.get("id").and_then(Value::as_str).unwrap_or("unknown");
    format!("Untitled ({id})")
}
