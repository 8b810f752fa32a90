//! Expert-mode score blending.
//!
//! Formula: `score = 0.7 * provider_score + 0.3 * domain_match`
//! where `domain_match` is 1.0 when the result's domain label or URL
//! contains one of the mode's preferred domains, else 0.0. A result with
//! no provider score takes `domain_match` as its score.

use std::cmp::Ordering;

use crate::types::SearchResult;

use super::expert::ExpertMode;

/// Weight of the provider's own relevance score.
pub const PROVIDER_WEIGHT: f64 = 0.7;

/// Weight of the preferred-domain match.
pub const DOMAIN_WEIGHT: f64 = 0.3;

/// 1.0 if `result` is hosted on one of `mode`'s preferred domains, else 0.0.
pub fn domain_match_score(result: &SearchResult, mode: ExpertMode) -> f64 {
    let url = result.url.to_lowercase();
    let domain = result.domain.as_deref().map(str::to_lowercase);
    let hit = mode.preferred_domains().iter().any(|pref| {
        url.contains(pref) || domain.as_deref().is_some_and(|d| d.contains(pref))
    });
    if hit {
        1.0
    } else {
        0.0
    }
}

/// The blended expert-mode score for one result.
pub fn blended_score(result: &SearchResult, mode: ExpertMode) -> f64 {
    let domain = domain_match_score(result, mode);
    match result.score {
        Some(original) => PROVIDER_WEIGHT * original + DOMAIN_WEIGHT * domain,
        None => domain,
    }
}

/// Rescore every result for `mode` and sort descending by the new score.
///
/// The sort is stable: equal scores keep their incoming relative order.
pub fn rank_for_expert_mode(results: Vec<SearchResult>, mode: ExpertMode) -> Vec<SearchResult> {
    let mut rescored: Vec<SearchResult> = results
        .into_iter()
        .map(|mut r| {
            r.score = Some(blended_score(&r, mode));
            r
        })
        .collect();
    rescored.sort_by(|a, b| compare_scores_desc(a.score, b.score));
    rescored
}

fn compare_scores_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.unwrap_or(0.0);
    let b = b.unwrap_or(0.0);
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
