//! Query model.
//!
//! [`Query`] is a closed set of query variants. Every variant carries an
//! optional boost (1.0 when unset), may target a field (the mapping's default
//! field when unset), validates itself, and compiles into a
//! [`Searcher`](crate::search::Searcher) against an index reader.
//!
//! Queries serialize as JSON objects tagged by `type`:
//!
//! ```
//! use glaive::query::{parse_query, Query};
//!
//! let query = parse_query(serde_json::json!({
//!     "type": "boolean",
//!     "must": {"conjuncts": [{"type": "term", "term": "rust", "field": "tags"}]},
//!     "must_not": {"disjuncts": [{"type": "match", "match": "beta"}]}
//! }))
//! .unwrap();
//!
//! assert!(matches!(query, Query::Boolean(_)));
//! assert!(query.validate().is_ok());
//! ```

macro_rules! boost_accessors {
    () => {
        fn boost(&self) -> f64 {
            self.boost.unwrap_or(1.0)
        }

        fn set_boost(&mut self, boost: f64) {
            self.boost = Some(boost);
        }
    };
}

macro_rules! field_accessors {
    () => {
        fn field(&self) -> Option<&str> {
            self.field.as_deref()
        }

        fn set_field(&mut self, field: String) {
            self.field = Some(field);
        }
    };
}

pub mod boolean;
pub mod match_all;
pub mod match_query;
pub mod parser;
pub mod query_string;
pub mod range;
pub mod term;

use serde::{Deserialize, Serialize};

use crate::engine::IndexReader;
use crate::error::{GlaiveError, Result};
use crate::mapping::IndexMapping;
use crate::search::Searcher;

pub use boolean::{BooleanQuery, ConjunctionQuery, DisjunctionQuery};
pub use match_all::{DocIdQuery, MatchAllQuery, MatchNoneQuery};
pub use match_query::{MatchPhraseQuery, MatchQuery};
pub use parser::parse_query_string;
pub use query_string::QueryStringQuery;
pub use range::{DateRangeQuery, NumericRangeQuery};
pub use term::{FuzzyQuery, PrefixQuery, RegexpQuery, TermQuery};

/// Behaviour shared by every query variant.
pub trait QueryNode {
    /// Score multiplier; 1.0 when unset.
    fn boost(&self) -> f64;

    fn set_boost(&mut self, boost: f64);

    /// Target field, for variants that have one.
    fn field(&self) -> Option<&str> {
        None
    }

    /// Set the target field. Ignored by compound variants.
    fn set_field(&mut self, _field: String) {}

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Compile into a searcher.
    fn searcher(
        &self,
        reader: &dyn IndexReader,
        mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>>;
}

/// Any query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    Match(MatchQuery),
    MatchPhrase(MatchPhraseQuery),
    Term(TermQuery),
    Prefix(PrefixQuery),
    Regexp(RegexpQuery),
    Fuzzy(FuzzyQuery),
    NumericRange(NumericRangeQuery),
    DateRange(DateRangeQuery),
    Conjunction(ConjunctionQuery),
    Disjunction(DisjunctionQuery),
    Boolean(BooleanQuery),
    DocId(DocIdQuery),
    MatchAll(MatchAllQuery),
    MatchNone(MatchNoneQuery),
    QueryString(QueryStringQuery),
}

macro_rules! dispatch {
    ($query:expr, $q:ident => $body:expr) => {
        match $query {
            Query::Match($q) => $body,
            Query::MatchPhrase($q) => $body,
            Query::Term($q) => $body,
            Query::Prefix($q) => $body,
            Query::Regexp($q) => $body,
            Query::Fuzzy($q) => $body,
            Query::NumericRange($q) => $body,
            Query::DateRange($q) => $body,
            Query::Conjunction($q) => $body,
            Query::Disjunction($q) => $body,
            Query::Boolean($q) => $body,
            Query::DocId($q) => $body,
            Query::MatchAll($q) => $body,
            Query::MatchNone($q) => $body,
            Query::QueryString($q) => $body,
        }
    };
}

impl Query {
    pub fn boost(&self) -> f64 {
        dispatch!(self, q => q.boost())
    }

    pub fn set_boost(&mut self, boost: f64) {
        dispatch!(self, q => q.set_boost(boost))
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.set_boost(boost);
        self
    }

    pub fn field(&self) -> Option<&str> {
        dispatch!(self, q => q.field())
    }

    pub fn set_field<S: Into<String>>(&mut self, field: S) {
        let field = field.into();
        dispatch!(self, q => q.set_field(field))
    }

    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.set_field(field);
        self
    }

    pub fn validate(&self) -> Result<()> {
        dispatch!(self, q => q.validate())
    }

    pub fn searcher(
        &self,
        reader: &dyn IndexReader,
        mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        dispatch!(self, q => q.searcher(reader, mapping, explain))
    }

    /// Decode a query from its JSON form.
    pub fn from_json(json: &str) -> Result<Query> {
        parse_query(serde_json::from_str(json)?)
    }
}

/// Decode a query from a JSON value, dispatching on its `type` field.
pub fn parse_query(value: serde_json::Value) -> Result<Query> {
    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| GlaiveError::query("query has no 'type' discriminator"))?
        .to_string();
    serde_json::from_value(value)
        .map_err(|e| GlaiveError::query(format!("cannot decode '{kind}' query: {e}")))
}

macro_rules! impl_from_variant {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Query {
                fn from(query: $ty) -> Self {
                    Query::$variant(query)
                }
            }
        )*
    };
}

impl_from_variant!(
    Match(MatchQuery),
    MatchPhrase(MatchPhraseQuery),
    Term(TermQuery),
    Prefix(PrefixQuery),
    Regexp(RegexpQuery),
    Fuzzy(FuzzyQuery),
    NumericRange(NumericRangeQuery),
    DateRange(DateRangeQuery),
    Conjunction(ConjunctionQuery),
    Disjunction(DisjunctionQuery),
    Boolean(BooleanQuery),
    DocId(DocIdQuery),
    MatchAll(MatchAllQuery),
    MatchNone(MatchNoneQuery),
    QueryString(QueryStringQuery),
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_type_is_an_error() {
        let err = parse_query(json!({"type": "telepathy", "field": "x"})).unwrap_err();
        assert!(matches!(err, GlaiveError::Query(_)));
        assert!(parse_query(json!({"term": "x"})).is_err());
    }

    #[test]
    fn test_boost_defaults_to_one() {
        let mut query = Query::from(TermQuery::new("rust"));
        assert_eq!(query.boost(), 1.0);
        query.set_boost(3.0);
        assert_eq!(query.boost(), 3.0);
    }

    #[test]
    fn test_json_round_trip_nested() {
        let query = Query::from(BooleanQuery::new(
            vec![Query::from(TermQuery::new("a").with_field("f"))],
            vec![Query::from(MatchQuery::new("b c"))],
            vec![Query::from(NumericRangeQuery::new(Some(1.0), None))],
        ));
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["type"], "boolean");

        let decoded = parse_query(json).unwrap();
        let Query::Boolean(boolean) = decoded else {
            panic!("expected boolean query");
        };
        assert_eq!(boolean.must.map(|m| m.conjuncts.len()), Some(1));
        assert_eq!(boolean.must_not.map(|m| m.disjuncts.len()), Some(1));
    }

    #[test]
    fn test_set_field_ignored_by_compounds() {
        let mut query = Query::from(ConjunctionQuery::new(vec![]));
        query.set_field("title");
        assert_eq!(query.field(), None);

        let query = Query::from(MatchQuery::new("x")).with_field("title");
        assert_eq!(query.field(), Some("title"));
    }
}
