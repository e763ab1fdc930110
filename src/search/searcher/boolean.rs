use crate::engine::DocNum;
use crate::error::{Result, first_error};
use crate::search::scorer::combine;
use crate::search::{DocumentMatch, Searcher};

/// Combines required, optional and excluded clauses.
///
/// Candidates come from `must` when present, otherwise from `should`.
/// Candidates matched by `must_not` are dropped. With `must` present, a
/// `should` match adds to the score, and is required when the should
/// searcher's minimum is positive.
#[derive(Debug)]
pub struct BooleanSearcher {
    must: Option<Box<dyn Searcher>>,
    should: Option<Box<dyn Searcher>>,
    must_not: Option<Box<dyn Searcher>>,
    curr_should: Option<DocumentMatch>,
    should_started: bool,
    curr_must_not: Option<DocumentMatch>,
    must_not_started: bool,
    explain: bool,
}

impl BooleanSearcher {
    pub fn new(
        must: Option<Box<dyn Searcher>>,
        should: Option<Box<dyn Searcher>>,
        must_not: Option<Box<dyn Searcher>>,
        explain: bool,
    ) -> Self {
        BooleanSearcher {
            must,
            should,
            must_not,
            curr_should: None,
            should_started: false,
            curr_must_not: None,
            must_not_started: false,
            explain,
        }
    }

    fn candidate(&mut self, target: Option<DocNum>) -> Result<Option<DocumentMatch>> {
        let source = match (self.must.as_mut(), self.should.as_mut()) {
            (Some(must), _) => must,
            (None, Some(should)) => should,
            (None, None) => return Ok(None),
        };
        match target {
            Some(target) => source.advance(target),
            None => source.next(),
        }
    }

    fn excluded(&mut self, doc: DocNum) -> Result<bool> {
        let Some(must_not) = self.must_not.as_mut() else {
            return Ok(false);
        };
        let behind = match &self.curr_must_not {
            Some(m) => m.number < doc,
            None => !self.must_not_started,
        };
        if behind {
            self.curr_must_not = must_not.advance(doc)?;
            self.must_not_started = true;
        }
        Ok(self.curr_must_not.as_ref().is_some_and(|m| m.number == doc))
    }

    fn optional_match(&mut self, doc: DocNum) -> Result<Option<DocumentMatch>> {
        let Some(should) = self.should.as_mut() else {
            return Ok(None);
        };
        let behind = match &self.curr_should {
            Some(m) => m.number < doc,
            None => !self.should_started,
        };
        if behind {
            self.curr_should = should.advance(doc)?;
            self.should_started = true;
        }
        Ok(self.curr_should.clone().filter(|m| m.number == doc))
    }

    fn next_match(&mut self, mut target: Option<DocNum>) -> Result<Option<DocumentMatch>> {
        loop {
            let Some(candidate) = self.candidate(target.take())? else {
                return Ok(None);
            };
            let doc = candidate.number;
            if self.excluded(doc)? {
                continue;
            }
            if self.must.is_none() {
                return Ok(Some(candidate));
            }

            let should_required = self.should.as_ref().is_some_and(|s| s.min() > 0);
            match self.optional_match(doc)? {
                Some(optional) => return Ok(combine(vec![candidate, optional], None, self.explain)),
                None if should_required => continue,
                None => return Ok(Some(candidate)),
            }
        }
    }
}

impl Searcher for BooleanSearcher {
    fn next(&mut self) -> Result<Option<DocumentMatch>> {
        self.next_match(None)
    }

    fn advance(&mut self, target: DocNum) -> Result<Option<DocumentMatch>> {
        self.next_match(Some(target))
    }

    fn count(&self) -> u64 {
        match (&self.must, &self.should) {
            (Some(must), _) => must.count(),
            (None, Some(should)) => should.count(),
            (None, None) => 0,
        }
    }

    fn close(&mut self) -> Result<()> {
        let mut result = Ok(());
        for searcher in [&mut self.must, &mut self.should, &mut self.must_not]
            .into_iter()
            .flatten()
        {
            result = first_error(result, searcher.close());
        }
        result
    }
}
