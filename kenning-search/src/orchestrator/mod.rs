//! Search orchestration: primary/supplement fan-out, dedup, expert ranking.
//!
//! [`hybrid::HybridSearch`] is the entry point. The remaining modules are
//! the pure pieces it composes: URL normalisation for identity, first-seen
//! deduplication, expert-mode re-scoring and the deterministic fallback set.

pub mod dedup;
pub mod expert;
pub mod fallback;
pub mod hybrid;
pub mod scoring;
pub mod url_normalize;
