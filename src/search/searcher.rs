//! Searchers: iterators over matching documents in document-number order.

mod boolean;
mod conjunction;
mod disjunction;
mod doc_id;
mod match_all;
mod multi_term;
mod phrase;
mod term;

use std::fmt;

use crate::engine::DocNum;
use crate::error::Result;
use crate::search::DocumentMatch;

pub use boolean::BooleanSearcher;
pub use conjunction::ConjunctionSearcher;
pub use disjunction::DisjunctionSearcher;
pub use doc_id::DocIdSearcher;
pub use match_all::{MatchAllSearcher, MatchNoneSearcher};
pub use multi_term::{
    fuzzy_searcher, multi_term_searcher, numeric_range_searcher, prefix_searcher,
    regexp_searcher,
};
pub use phrase::PhraseSearcher;
pub use term::TermSearcher;

/// A cursor over matching documents.
///
/// Matches come out in strictly increasing document-number order. After
/// `None` is returned the searcher stays exhausted.
pub trait Searcher: Send + fmt::Debug {
    /// Next match after the last one returned.
    fn next(&mut self) -> Result<Option<DocumentMatch>>;

    /// First match with a document number of at least `target`.
    fn advance(&mut self, target: DocNum) -> Result<Option<DocumentMatch>>;

    /// Upper bound on the number of matches.
    fn count(&self) -> u64;

    /// Minimum number of children that must match, for disjunctions.
    fn min(&self) -> usize {
        0
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Close every searcher, reporting the first failure.
pub(crate) fn close_all(searchers: &mut [Box<dyn Searcher>]) -> Result<()> {
    let mut first = Ok(());
    for searcher in searchers {
        let result = searcher.close();
        if first.is_ok() {
            first = result;
        }
    }
    first
}
