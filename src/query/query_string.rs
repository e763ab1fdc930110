//! Queries written in the query-string syntax.

use serde::{Deserialize, Serialize};

use crate::engine::IndexReader;
use crate::error::Result;
use crate::mapping::IndexMapping;
use crate::query::{BooleanQuery, QueryNode, parse_query_string};
use crate::search::Searcher;

/// A query given as a query string, parsed when validated or compiled.
///
/// See [`parse_query_string`] for the syntax.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryStringQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl QueryStringQuery {
    pub fn new<S: Into<String>>(query: S) -> Self {
        QueryStringQuery {
            query: query.into(),
            boost: None,
        }
    }

    /// Parse into the equivalent boolean query.
    pub fn parse(&self) -> Result<BooleanQuery> {
        let mut parsed = parse_query_string(&self.query)?;
        if let Some(boost) = self.boost {
            parsed.set_boost(boost);
        }
        Ok(parsed)
    }
}

impl QueryNode for QueryStringQuery {
    boost_accessors!();

    fn validate(&self) -> Result<()> {
        self.parse()?.validate()
    }

    fn searcher(
        &self,
        reader: &dyn IndexReader,
        mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        self.parse()?.searcher(reader, mapping, explain)
    }
}
