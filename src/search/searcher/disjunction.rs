use crate::engine::DocNum;
use crate::error::Result;
use crate::search::scorer::combine;
use crate::search::searcher::close_all;
use crate::search::{DocumentMatch, Searcher};

/// Matches documents matched by at least `max(min, 1)` children.
///
/// Scores are summed and scaled by the fraction of children that matched.
#[derive(Debug)]
pub struct DisjunctionSearcher {
    searchers: Vec<Box<dyn Searcher>>,
    currs: Vec<Option<DocumentMatch>>,
    initialized: bool,
    min: usize,
    explain: bool,
}

impl DisjunctionSearcher {
    pub fn new(searchers: Vec<Box<dyn Searcher>>, min: usize, explain: bool) -> Self {
        DisjunctionSearcher {
            searchers,
            currs: Vec::new(),
            initialized: false,
            min,
            explain,
        }
    }

    fn init(&mut self) -> Result<()> {
        if !self.initialized {
            for searcher in &mut self.searchers {
                self.currs.push(searcher.next()?);
            }
            self.initialized = true;
        }
        Ok(())
    }

    fn next_match(&mut self) -> Result<Option<DocumentMatch>> {
        let required = self.min.max(1);
        loop {
            let Some(smallest) = self.currs.iter().flatten().map(|m| m.number).min() else {
                return Ok(None);
            };

            let mut matches = Vec::new();
            for (curr, searcher) in self.currs.iter_mut().zip(self.searchers.iter_mut()) {
                if let Some(m) = curr.take_if(|m| m.number == smallest) {
                    matches.push(m);
                    *curr = searcher.next()?;
                }
            }

            if matches.len() >= required {
                let coord = (matches.len(), self.searchers.len());
                return Ok(combine(matches, Some(coord), self.explain));
            }
        }
    }
}

impl Searcher for DisjunctionSearcher {
    fn next(&mut self) -> Result<Option<DocumentMatch>> {
        self.init()?;
        self.next_match()
    }

    fn advance(&mut self, target: DocNum) -> Result<Option<DocumentMatch>> {
        self.init()?;
        for (curr, searcher) in self.currs.iter_mut().zip(self.searchers.iter_mut()) {
            if curr.as_ref().is_some_and(|m| m.number < target) {
                *curr = searcher.advance(target)?;
            }
        }
        self.next_match()
    }

    fn count(&self) -> u64 {
        self.searchers.iter().map(|s| s.count()).sum()
    }

    fn min(&self) -> usize {
        self.min
    }

    fn close(&mut self) -> Result<()> {
        close_all(&mut self.searchers)
    }
}
