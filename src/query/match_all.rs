//! Queries that do not look at terms.

use serde::{Deserialize, Serialize};

use crate::engine::IndexReader;
use crate::error::Result;
use crate::mapping::IndexMapping;
use crate::query::QueryNode;
use crate::search::Searcher;
use crate::search::searcher::{DocIdSearcher, MatchAllSearcher, MatchNoneSearcher};

/// Matches every document with a constant score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchAllQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl MatchAllQuery {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueryNode for MatchAllQuery {
    boost_accessors!();

    fn searcher(
        &self,
        reader: &dyn IndexReader,
        _mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        Ok(Box::new(MatchAllSearcher::new(reader, self.boost(), explain)))
    }
}

/// Matches nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchNoneQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl MatchNoneQuery {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueryNode for MatchNoneQuery {
    boost_accessors!();

    fn searcher(
        &self,
        _reader: &dyn IndexReader,
        _mapping: &IndexMapping,
        _explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        Ok(Box::new(MatchNoneSearcher::new()))
    }
}

/// Matches the documents with the listed ids. Unknown ids are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocIdQuery {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl DocIdQuery {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DocIdQuery {
            ids: ids.into_iter().map(Into::into).collect(),
            boost: None,
        }
    }
}

impl QueryNode for DocIdQuery {
    boost_accessors!();

    fn searcher(
        &self,
        reader: &dyn IndexReader,
        _mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        Ok(Box::new(DocIdSearcher::new(
            reader,
            &self.ids,
            self.boost(),
            explain,
        )))
    }
}
