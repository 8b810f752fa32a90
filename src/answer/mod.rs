//! Cited answer assembly: citation numbering, prompt layout and streaming.

pub mod citation;
pub mod context;
pub mod stream;

pub use citation::{CitationEntry, CitationMap};
pub use context::{AnswerContext, build_context};
pub use stream::{AnswerAssembler, AnswerChunk};
