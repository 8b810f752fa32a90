//! Kenning: personalised search aggregation with cited, streamed answers.
//!
//! A query flows through a short pipeline:
//! Personal corpus → Profile → Query expansion → Web fan-out → Merge → Answer
//!
//! # Architecture
//!
//! - **Personal corpus**: Reads a user's Notion pages ([`personal`])
//! - **Personalization**: Infers interests and expands the query ([`personalization`])
//! - **Web search**: Hybrid keyword and neural providers via [`kenning_search`]
//! - **Pipeline**: Merges personal and web results ([`pipeline`])
//! - **Answer**: Numbers citations and streams the answer ([`answer`])
//!
//! Every aggregation step degrades to an empty or default value on failure.
//! The only failure a caller sees is a final answer chunk carrying an error.

pub mod answer;
pub mod config;
pub mod credentials;
pub mod error;
pub mod generation;
pub mod personal;
pub mod personalization;
pub mod pipeline;

pub use answer::{AnswerAssembler, AnswerChunk, CitationEntry, CitationMap};
pub use config::{GenerationConfig, KenningConfig, PersonalConfig};
pub use credentials::{Credential, TokenStore};
pub use error::{KenningError, Result};
pub use personalization::{PersonalizationEngine, PersonalizationProfile};
pub use pipeline::{PersonalizedSearch, SearchResponse};

pub use kenning_search::{ExpertMode, SearchResult, SourceKind};
