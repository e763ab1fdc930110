//! Error types for the Glaive library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`GlaiveError`] enum. The variants mirror the failure classes callers need
//! to tell apart: bad identifiers, operations on a closed index, unknown
//! registered type names, mapping and query validation failures, and
//! resource (I/O, storage, serialization) failures.
//!
//! # Examples
//!
//! ```
//! use glaive::error::{GlaiveError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(GlaiveError::query("disjunction min exceeds clause count"))
//! }
//!
//! assert!(example_operation().is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Glaive operations.
#[derive(Error, Debug)]
pub enum GlaiveError {
    /// An operation keyed by document id or internal key received an empty one.
    #[error("document id cannot be empty")]
    EmptyId,

    /// A data operation was attempted after the index was closed.
    #[error("index is closed")]
    IndexClosed,

    /// Creating an index at a path that already exists.
    #[error("cannot create new index, path already exists: {0}")]
    IndexExists(String),

    /// Opening an index at a path that does not exist.
    #[error("cannot open index, path does not exist: {0}")]
    IndexNotFound(String),

    /// The index meta descriptor could not be found or read.
    #[error("cannot open index, metadata missing: {0}")]
    IndexMetaMissing(String),

    /// No index-type constructor is registered under the name.
    #[error("unknown index type: {0}")]
    UnknownIndexType(String),

    /// No kv-store constructor is registered under the name.
    #[error("unknown storage type: {0}")]
    UnknownStorageType(String),

    /// Mapping validation or mapping application errors.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Query validation or compilation errors.
    #[error("Query error: {0}")]
    Query(String),

    /// Query-string syntax errors.
    #[error("syntax error at position {position}: {message}")]
    QuerySyntax {
        /// Byte offset in the query string where parsing failed.
        position: usize,
        /// Description of the unexpected input.
        message: String,
    },

    /// Analysis-related errors (unknown analyzer, unparseable date).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Storage-related errors.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error outside of JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid regular expression.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with GlaiveError.
pub type Result<T> = std::result::Result<T, GlaiveError>;

impl GlaiveError {
    /// Create a new mapping error.
    pub fn mapping<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Mapping(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Query(msg.into())
    }

    /// Create a new query-string syntax error.
    pub fn syntax<S: Into<String>>(position: usize, msg: S) -> Self {
        GlaiveError::QuerySyntax {
            position,
            message: msg.into(),
        }
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Analysis(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Storage(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Serialization(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Other(msg.into())
    }

    /// Wrap this error with a context prefix, keeping identity-bearing
    /// variants (empty id, closed index) intact.
    pub fn context<S: AsRef<str>>(self, ctx: S) -> Self {
        match self {
            GlaiveError::Storage(msg) => GlaiveError::Storage(format!("{}: {msg}", ctx.as_ref())),
            GlaiveError::Other(msg) => GlaiveError::Other(format!("{}: {msg}", ctx.as_ref())),
            GlaiveError::Io(e) => GlaiveError::Storage(format!("{}: {e}", ctx.as_ref())),
            other => other,
        }
    }
}

/// Combine the outcome of an operation with the outcome of closing the
/// resource it used.
///
/// An earlier functional error always wins; the close error surfaces only when
/// nothing else failed.
pub fn first_error<T>(result: Result<T>, close: Result<()>) -> Result<T> {
    match (result, close) {
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(e),
        (Ok(value), Ok(())) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = GlaiveError::mapping("unknown analyzer named 'x'");
        assert_eq!(error.to_string(), "Mapping error: unknown analyzer named 'x'");

        let error = GlaiveError::syntax(4, "unexpected ':'");
        assert_eq!(error.to_string(), "syntax error at position 4: unexpected ':'");

        assert_eq!(GlaiveError::EmptyId.to_string(), "document id cannot be empty");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = GlaiveError::from(io_error);

        match error {
            GlaiveError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_first_error_prefers_functional_error() {
        let result: Result<u32> = Err(GlaiveError::query("compile failed"));
        let combined = first_error(result, Err(GlaiveError::storage("close failed")));
        assert!(matches!(combined, Err(GlaiveError::Query(_))));

        let combined = first_error(Ok(7), Err(GlaiveError::storage("close failed")));
        assert!(matches!(combined, Err(GlaiveError::Storage(_))));

        let combined = first_error(Ok(7), Ok(()));
        assert_eq!(combined.unwrap(), 7);
    }
}
