//! Expert modes: named domains that bias query wording and ranking.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// A named domain filter applied by
/// [`HybridSearch::search_with_expert_mode`](super::hybrid::HybridSearch::search_with_expert_mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpertMode {
    /// Technology research and industry news.
    Technology,
    /// Markets, investing and regulators.
    Finance,
    /// Peer-reviewed science.
    Science,
    /// Medicine and public health.
    Health,
    /// Strategy and management.
    Business,
    /// Government and think tanks.
    Policy,
    /// Scholarly literature.
    Academic,
    /// Climate and sustainability.
    Environment,
}

impl ExpertMode {
    /// Returns all modes.
    pub fn all() -> &'static [ExpertMode] {
        &[
            Self::Technology,
            Self::Finance,
            Self::Science,
            Self::Health,
            Self::Business,
            Self::Policy,
            Self::Academic,
            Self::Environment,
        ]
    }

    /// Lowercase mode name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Technology => "technology",
            Self::Finance => "finance",
            Self::Science => "science",
            Self::Health => "health",
            Self::Business => "business",
            Self::Policy => "policy",
            Self::Academic => "academic",
            Self::Environment => "environment",
        }
    }

    /// Keywords appended to the user's query.
    pub fn keywords(&self) -> &'static str {
        match self {
            Self::Technology => "tech innovation research development",
            Self::Finance => "financial analysis market trends investment",
            Self::Science => "scientific research peer-reviewed academic",
            Self::Health => "medical health clinical research evidence-based",
            Self::Business => "business strategy market analysis industry",
            Self::Policy => "policy government regulation governance",
            Self::Academic => "academic research literature review scholarly",
            Self::Environment => "environmental sustainability climate impact",
        }
    }

    /// Domain fragments that earn a result the full domain-match score.
    pub fn preferred_domains(&self) -> &'static [&'static str] {
        match self {
            Self::Technology => &["arxiv.org", "ieee.org", "acm.org", "techcrunch.com", "mit.edu"],
            Self::Finance => &[
                "bloomberg.com",
                "reuters.com",
                "wsj.com",
                "sec.gov",
                "federalreserve.gov",
            ],
            Self::Science => &["nature.com", "science.org", "plos.org", "pubmed.ncbi.nlm.nih.gov"],
            Self::Health => &["who.int", "cdc.gov", "nih.gov", "nejm.org", "bmj.com"],
            Self::Business => &["hbr.org", "mckinsey.com", "bain.com", "bcg.com", "fortune.com"],
            Self::Policy => &["gov", ".org", "brookings.edu", "cfr.org", "rand.org"],
            Self::Academic => &["edu", "ac.uk", "jstor.org", "springer.com", "elsevier.com"],
            Self::Environment => &["ipcc.ch", "epa.gov", "unep.org", "worldbank.org", "iea.org"],
        }
    }

    /// The query with this mode's keywords appended.
    pub fn enhance_query(&self, query: &str) -> String {
        format!("{} {}", query.trim(), self.keywords())
    }
}

impl fmt::Display for ExpertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExpertMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| SearchError::Config(format!("unknown expert mode: {s}")))
    }
}
