//! Text analysis for Glaive.
//!
//! Analyzers turn field text into positioned tokens; datetime parsers turn
//! text into timestamps. Both are referenced by name from mappings and
//! queries and resolved through the [`Registry`](crate::registry::Registry).

pub mod analyzer;
pub mod datetime;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::{Analyzer, PipelineAnalyzer};
pub use datetime::{DateTimeParser, FlexibleDateTimeParser};
pub use token::{Token, TokenStream};
