//! # Glaive
//!
//! An embeddable full-text indexing and search library for Rust.
//!
//! ## Features
//!
//! - Mapping of arbitrary nested data to typed fields, explicit or inferred
//! - Text, numeric and datetime fields
//! - Match, phrase, term, prefix, regexp, fuzzy, range and boolean queries
//! - A compact query-string syntax
//! - Facets, highlighting and stored-field retrieval
//! - Batched writes and point-in-time readers
//! - Pluggable analyzers, index types and kv stores

pub mod analysis;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod mapping;
pub mod query;
pub mod registry;
pub mod search;
pub mod util;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::document::{Document, Value};
    pub use crate::error::{GlaiveError, Result};
    pub use crate::index::{Batch, Index};
    pub use crate::mapping::{DocumentMapping, FieldMapping, IndexMapping};
    pub use crate::query::{Query, QueryStringQuery};
    pub use crate::search::{SearchRequest, SearchResult};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
