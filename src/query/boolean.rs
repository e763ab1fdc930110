//! Compound queries.

use serde::{Deserialize, Serialize};

use crate::engine::IndexReader;
use crate::error::{GlaiveError, Result};
use crate::mapping::IndexMapping;
use crate::query::{Query, QueryNode};
use crate::search::Searcher;
use crate::search::searcher::{
    BooleanSearcher, ConjunctionSearcher, DisjunctionSearcher, MatchAllSearcher,
    MatchNoneSearcher,
};

fn compile_all(
    queries: &[Query],
    reader: &dyn IndexReader,
    mapping: &IndexMapping,
    explain: bool,
) -> Result<Vec<Box<dyn Searcher>>> {
    queries
        .iter()
        .map(|q| q.searcher(reader, mapping, explain))
        .collect()
}

/// Matches documents matched by every child.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConjunctionQuery {
    #[serde(default)]
    pub conjuncts: Vec<Query>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl ConjunctionQuery {
    pub fn new(conjuncts: Vec<Query>) -> Self {
        ConjunctionQuery {
            conjuncts,
            boost: None,
        }
    }

    pub fn add<Q: Into<Query>>(&mut self, query: Q) {
        self.conjuncts.push(query.into());
    }

    pub fn is_empty(&self) -> bool {
        self.conjuncts.is_empty()
    }
}

impl QueryNode for ConjunctionQuery {
    boost_accessors!();

    fn validate(&self) -> Result<()> {
        self.conjuncts.iter().try_for_each(Query::validate)
    }

    fn searcher(
        &self,
        reader: &dyn IndexReader,
        mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        if self.conjuncts.is_empty() {
            return Ok(Box::new(MatchNoneSearcher::new()));
        }
        let searchers = compile_all(&self.conjuncts, reader, mapping, explain)?;
        Ok(Box::new(ConjunctionSearcher::new(searchers, explain)))
    }
}

/// Matches documents matched by at least `min` children (at least one when
/// `min` is zero).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisjunctionQuery {
    #[serde(default)]
    pub disjuncts: Vec<Query>,
    #[serde(default)]
    pub min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl DisjunctionQuery {
    pub fn new(disjuncts: Vec<Query>) -> Self {
        DisjunctionQuery {
            disjuncts,
            min: 0.0,
            boost: None,
        }
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = min;
        self
    }

    pub fn add<Q: Into<Query>>(&mut self, query: Q) {
        self.disjuncts.push(query.into());
    }

    pub fn is_empty(&self) -> bool {
        self.disjuncts.is_empty()
    }
}

impl QueryNode for DisjunctionQuery {
    boost_accessors!();

    fn validate(&self) -> Result<()> {
        if self.min as usize > self.disjuncts.len() {
            return Err(GlaiveError::query(format!(
                "disjunction query has {} clauses but min is {}",
                self.disjuncts.len(),
                self.min
            )));
        }
        self.disjuncts.iter().try_for_each(Query::validate)
    }

    fn searcher(
        &self,
        reader: &dyn IndexReader,
        mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        if self.disjuncts.is_empty() {
            return Ok(Box::new(MatchNoneSearcher::new()));
        }
        let searchers = compile_all(&self.disjuncts, reader, mapping, explain)?;
        Ok(Box::new(DisjunctionSearcher::new(
            searchers,
            self.min as usize,
            explain,
        )))
    }
}

/// Combines required, optional and excluded clauses.
///
/// With `must` present, `should` clauses only add to the score unless the
/// should group has a non-zero `min`. Without `must`, at least one `should`
/// clause has to match. A query with only `must_not` clauses matches every
/// document not excluded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BooleanQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must: Option<ConjunctionQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should: Option<DisjunctionQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_not: Option<DisjunctionQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl BooleanQuery {
    pub fn new(must: Vec<Query>, should: Vec<Query>, must_not: Vec<Query>) -> Self {
        BooleanQuery {
            must: (!must.is_empty()).then(|| ConjunctionQuery::new(must)),
            should: (!should.is_empty()).then(|| DisjunctionQuery::new(should)),
            must_not: (!must_not.is_empty()).then(|| DisjunctionQuery::new(must_not)),
            boost: None,
        }
    }

    /// Require `min` of the should clauses to match.
    pub fn with_min_should(mut self, min: f64) -> Self {
        self.should.get_or_insert_with(DisjunctionQuery::default).min = min;
        self
    }

    pub fn add_must<Q: Into<Query>>(&mut self, query: Q) {
        self.must
            .get_or_insert_with(ConjunctionQuery::default)
            .add(query);
    }

    pub fn add_should<Q: Into<Query>>(&mut self, query: Q) {
        self.should
            .get_or_insert_with(DisjunctionQuery::default)
            .add(query);
    }

    pub fn add_must_not<Q: Into<Query>>(&mut self, query: Q) {
        self.must_not
            .get_or_insert_with(DisjunctionQuery::default)
            .add(query);
    }

    fn must_clauses(&self) -> Option<&ConjunctionQuery> {
        self.must.as_ref().filter(|m| !m.is_empty())
    }

    fn should_clauses(&self) -> Option<&DisjunctionQuery> {
        self.should.as_ref().filter(|s| !s.is_empty())
    }

    fn must_not_clauses(&self) -> Option<&DisjunctionQuery> {
        self.must_not.as_ref().filter(|m| !m.is_empty())
    }
}

impl QueryNode for BooleanQuery {
    boost_accessors!();

    fn validate(&self) -> Result<()> {
        if self.must_clauses().is_none()
            && self.should_clauses().is_none()
            && self.must_not_clauses().is_none()
        {
            return Err(GlaiveError::query(
                "boolean query must contain at least one must, should or must_not clause",
            ));
        }
        if let Some(must) = &self.must {
            must.validate()?;
        }
        if let Some(should) = &self.should {
            should.validate()?;
        }
        if let Some(must_not) = &self.must_not {
            must_not.validate()?;
        }
        Ok(())
    }

    fn searcher(
        &self,
        reader: &dyn IndexReader,
        mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        let mut must = self
            .must_clauses()
            .map(|m| m.searcher(reader, mapping, explain))
            .transpose()?;
        let should = self
            .should_clauses()
            .map(|s| s.searcher(reader, mapping, explain))
            .transpose()?;
        let must_not = self
            .must_not_clauses()
            .map(|m| m.searcher(reader, mapping, explain))
            .transpose()?;

        if must.is_none() && must_not.is_none() {
            return Ok(match should {
                Some(should) => should,
                None => Box::new(MatchNoneSearcher::new()),
            });
        }
        if must.is_none() && should.is_none() {
            must = Some(Box::new(MatchAllSearcher::new(reader, 1.0, explain)));
        }

        Ok(Box::new(BooleanSearcher::new(must, should, must_not, explain)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::TermQuery;

    fn term(t: &str) -> Query {
        TermQuery::new(t).into()
    }

    #[test]
    fn test_disjunction_min_validation() {
        let query = DisjunctionQuery::new(vec![term("a"), term("b"), term("c")]);
        assert!(query.clone().with_min(2.0).validate().is_ok());
        assert!(query.clone().with_min(3.0).validate().is_ok());
        assert!(matches!(
            query.with_min(4.0).validate(),
            Err(GlaiveError::Query(_))
        ));
    }

    #[test]
    fn test_empty_boolean_is_invalid() {
        assert!(BooleanQuery::default().validate().is_err());

        let mut query = BooleanQuery::default();
        query.add_must_not(term("spam"));
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_boolean_validates_nested_clauses() {
        let mut query = BooleanQuery::default();
        query.add_should(Query::from(
            DisjunctionQuery::new(vec![term("a")]).with_min(2.0),
        ));
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_builders_group_clauses() {
        let mut query = BooleanQuery::new(vec![term("a")], vec![], vec![]);
        query.add_must(term("b"));
        query.add_should(term("c"));
        assert_eq!(query.must.as_ref().map(|m| m.conjuncts.len()), Some(2));
        assert_eq!(query.should.as_ref().map(|s| s.disjuncts.len()), Some(1));
        assert!(query.must_not.is_none());
    }
}
