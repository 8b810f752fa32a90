//! Interest profiling and query expansion.
//!
//! The engine asks the text generator two narrow questions: what a user's
//! documents say about them ([`PersonalizationEngine::analyze`]) and how to
//! rephrase a query for that user ([`PersonalizationEngine::expand_query`]).
//! Both answers are requested as bare JSON and parsed leniently. Any
//! failure falls back to "no personalisation" rather than an error.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use kenning_search::{OrDegrade, truncate_with_ellipsis};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GenerationConfig;
use crate::error::{KenningError, Result};
use crate::generation::{GenerationRequest, TextGenerator};
use crate::personal::PersonalDocument;

/// Most alternate queries kept after the original.
pub const MAX_ALTERNATES: usize = 4;

/// Characters of each document quoted in the analysis prompt.
const ANALYSIS_EXCERPT_CHARS: usize = 500;

const ANALYSIS_SYSTEM: &str = "You analyse personal knowledge bases and extract what the owner \
cares about. Reply with a single JSON object and nothing else.";

const EXPANSION_SYSTEM: &str = "You write web search queries tailored to one person's interests. \
Reply with a JSON array of strings and nothing else.";

/// What a user's documents suggest about them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalizationProfile {
    /// Main topics of interest.
    pub interests: BTreeSet<String>,
    /// Domains where the user has knowledge or experience.
    pub expertise_areas: BTreeSet<String>,
    /// Current research or learning goals.
    pub research_focus: BTreeSet<String>,
    /// Technical terms the user uses.
    pub keywords: BTreeSet<String>,
    /// One-paragraph summary.
    pub summary: String,
}

impl PersonalizationProfile {
    /// Whether the profile carries no interests, and so cannot drive expansion.
    pub fn is_empty(&self) -> bool {
        self.interests.is_empty()
    }

    /// Parse the generator's reply.
    ///
    /// Accepts a JSON object optionally wrapped in a markdown code fence.
    /// List fields may also be a single string. `context_summary` is read
    /// when `summary` is absent.
    ///
    /// # Errors
    ///
    /// Returns [`KenningError::Generation`] if no JSON object can be found.
    pub fn from_reply(reply: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(strip_code_fence(reply))
            .map_err(|e| KenningError::Generation(format!("profile reply is not JSON: {e}")))?;
        let Value::Object(map) = value else {
            return Err(KenningError::Generation("profile reply is not a JSON object".into()));
        };

        let summary = map
            .get("summary")
            .or_else(|| map.get("context_summary"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Self {
            interests: string_set(map.get("interests")),
            expertise_areas: string_set(map.get("expertise_areas")),
            research_focus: string_set(map.get("research_focus")),
            keywords: string_set(map.get("keywords")),
            summary,
        })
    }
}

fn string_set(value: Option<&Value>) -> BTreeSet<String> {
    let items: Vec<&str> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(s)) => vec![s.as_str()],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Remove a surrounding markdown code fence (```` ```json ... ``` ````).
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Builds profiles and expanded query sets through a [`TextGenerator`].
pub struct PersonalizationEngine {
    generator: Arc<dyn TextGenerator>,
    analysis_max_tokens: u32,
    expansion_max_tokens: u32,
    call_timeout: Duration,
}

impl std::fmt::Debug for PersonalizationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalizationEngine")
            .field("generator", &self.generator.name())
            .field("analysis_max_tokens", &self.analysis_max_tokens)
            .field("expansion_max_tokens", &self.expansion_max_tokens)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl PersonalizationEngine {
    /// Create an engine with token limits and the per-call timeout from `config`.
    pub fn new(generator: Arc<dyn TextGenerator>, config: &GenerationConfig) -> Self {
        Self {
            generator,
            analysis_max_tokens: config.analysis_max_tokens,
            expansion_max_tokens: config.expansion_max_tokens,
            call_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Override the limit on each generator call.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    async fn bounded<T>(&self, step: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.call_timeout, fut)
            .await
            .map_err(|_| {
                KenningError::Timeout(format!(
                    "{step} got no answer from {} within {}ms",
                    self.generator.name(),
                    self.call_timeout.as_millis()
                ))
            })?
    }

    /// Infer a profile from `documents`.
    ///
    /// No documents means an empty profile, without calling the generator.
    /// Generator or parse failures, or no answer within the call timeout,
    /// also yield an empty profile.
    pub async fn analyze(&self, documents: &[PersonalDocument]) -> PersonalizationProfile {
        if documents.is_empty() {
            return PersonalizationProfile::default();
        }
        self.bounded("profile analysis", self.try_analyze(documents))
            .await
            .or_degrade("profile analysis")
    }

    /// Fallible half of [`analyze`](Self::analyze).
    ///
    /// # Errors
    ///
    /// Returns the generator's error, or [`KenningError::Generation`] for an
    /// unparseable reply.
    pub async fn try_analyze(&self, documents: &[PersonalDocument]) -> Result<PersonalizationProfile> {
        let mut corpus = String::new();
        for doc in documents {
            corpus.push_str(&format!(
                "Page: {}\nContent: {}\n\n",
                doc.title,
                truncate_with_ellipsis(&doc.extracted_text, ANALYSIS_EXCERPT_CHARS)
            ));
        }
        let prompt = format!(
            "Read the personal notes below and describe their owner.\n\n\
             NOTES:\n{corpus}\
             Return a JSON object with these keys:\n\
             - \"interests\": main topics the owner follows\n\
             - \"expertise_areas\": domains where they show knowledge or experience\n\
             - \"research_focus\": current research questions or learning goals\n\
             - \"keywords\": technical terms and concepts they use\n\
             - \"summary\": two sentences on their knowledge focus\n"
        );
        let request = GenerationRequest::new(prompt)
            .with_system(ANALYSIS_SYSTEM)
            .with_temperature(0.1)
            .with_max_tokens(self.analysis_max_tokens);

        let reply = self.generator.complete(&request).await?;
        let profile = PersonalizationProfile::from_reply(&reply)?;
        tracing::debug!(
            interests = profile.interests.len(),
            keywords = profile.keywords.len(),
            "personal profile inferred"
        );
        Ok(profile)
    }

    /// The query set to search for `query` on behalf of `profile`.
    ///
    /// Always starts with `query` itself. With an empty profile, or on any
    /// failure or timeout, that is the whole set; otherwise up to
    /// [`MAX_ALTERNATES`] distinct alternates follow.
    pub async fn expand_query(&self, query: &str, profile: &PersonalizationProfile) -> Vec<String> {
        if profile.is_empty() {
            return vec![query.to_string()];
        }
        match self.bounded("query expansion", self.try_expand(query, profile)).await {
            Ok(alternates) => with_original(query, alternates),
            Err(e) => {
                tracing::warn!(step = "query expansion", error = %e, "degrading to original query");
                vec![query.to_string()]
            }
        }
    }

    /// Ask the generator for alternate queries, without the original.
    ///
    /// # Errors
    ///
    /// Returns the generator's error, or [`KenningError::Generation`] if the
    /// reply is not a JSON list of strings.
    pub async fn try_expand(&self, query: &str, profile: &PersonalizationProfile) -> Result<Vec<String>> {
        let prompt = format!(
            "PROFILE\n\
             - Interests: {}\n\
             - Expertise: {}\n\
             - Research focus: {}\n\
             - Key terms: {}\n\
             - Summary: {}\n\n\
             QUERY: \"{query}\"\n\n\
             Write 3 or 4 web search queries that answer the query from this person's angle: \
             tie it to their interests, use their terminology and pitch it at their level.\n\
             Return a JSON array of strings.",
            join(&profile.interests),
            join(&profile.expertise_areas),
            join(&profile.research_focus),
            join(&profile.keywords),
            profile.summary,
        );
        let request = GenerationRequest::new(prompt)
            .with_system(EXPANSION_SYSTEM)
            .with_temperature(0.2)
            .with_max_tokens(self.expansion_max_tokens);

        let reply = self.generator.complete(&request).await?;
        parse_query_list(&reply)
    }
}

/// Parse a JSON list of query strings, optionally fenced or under a `queries` key.
///
/// # Errors
///
/// Returns [`KenningError::Generation`] if the reply has no such list.
pub fn parse_query_list(reply: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(strip_code_fence(reply))
        .map_err(|e| KenningError::Generation(format!("expansion reply is not JSON: {e}")))?;
    let list = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("queries") {
            Some(Value::Array(items)) => items,
            _ => return Err(KenningError::Generation("expansion reply has no query list".into())),
        },
        _ => return Err(KenningError::Generation("expansion reply is not a list".into())),
    };
    Ok(list
        .iter()
        .filter_map(Value::as_str)
        .map(|s| s.trim().to_string())
        .collect())
}

/// `query` followed by up to [`MAX_ALTERNATES`] distinct, non-empty alternates.
fn with_original(query: &str, alternates: Vec<String>) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    seen.insert(query.trim().to_lowercase());
    let mut set = vec![query.to_string()];
    set.extend(
        alternates
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty() && seen.insert(q.to_lowercase()))
            .take(MAX_ALTERNATES),
    );
    set
}
