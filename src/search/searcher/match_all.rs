use crate::engine::{DocNum, IndexReader};
use crate::error::Result;
use crate::search::searcher::DocIdSearcher;
use crate::search::{DocumentMatch, Searcher};

/// Matches every live document.
#[derive(Debug)]
pub struct MatchAllSearcher {
    inner: DocIdSearcher,
}

impl MatchAllSearcher {
    pub fn new(reader: &dyn IndexReader, boost: f64, explain: bool) -> Self {
        MatchAllSearcher {
            inner: DocIdSearcher::from_numbers(reader.doc_numbers(), boost, explain),
        }
    }
}

impl Searcher for MatchAllSearcher {
    fn next(&mut self) -> Result<Option<DocumentMatch>> {
        self.inner.next()
    }

    fn advance(&mut self, target: DocNum) -> Result<Option<DocumentMatch>> {
        self.inner.advance(target)
    }

    fn count(&self) -> u64 {
        self.inner.count()
    }
}

/// Matches nothing.
#[derive(Debug, Default)]
pub struct MatchNoneSearcher;

impl MatchNoneSearcher {
    pub fn new() -> Self {
        MatchNoneSearcher
    }
}

impl Searcher for MatchNoneSearcher {
    fn next(&mut self) -> Result<Option<DocumentMatch>> {
        Ok(None)
    }

    fn advance(&mut self, _target: DocNum) -> Result<Option<DocumentMatch>> {
        Ok(None)
    }

    fn count(&self) -> u64 {
        0
    }
}
