//! Natural-language understanding domain
//!
//! Intent/entity types produced by the NLU agent, plus the pure logic to
//! parse LLM output into them and a deterministic keyword fallback.

pub mod entities;
pub mod parsing;

pub use entities::{Ambiguity, Entity, Intent, NluOutput, SCHEMA_CONTEXT_NEED};
pub use parsing::{ParseError, keyword_fallback, parse_nlu_response};
