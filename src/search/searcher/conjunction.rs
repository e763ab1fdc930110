use crate::engine::DocNum;
use crate::error::Result;
use crate::search::scorer::combine;
use crate::search::searcher::close_all;
use crate::search::{DocumentMatch, Searcher};

/// Matches documents matched by every child.
#[derive(Debug)]
pub struct ConjunctionSearcher {
    searchers: Vec<Box<dyn Searcher>>,
    currs: Vec<Option<DocumentMatch>>,
    initialized: bool,
    explain: bool,
}

impl ConjunctionSearcher {
    pub fn new(searchers: Vec<Box<dyn Searcher>>, explain: bool) -> Self {
        ConjunctionSearcher {
            searchers,
            currs: Vec::new(),
            initialized: false,
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
        if self.searchers.is_empty() {
            return Ok(None);
        }
        loop {
            let mut max = 0;
            for curr in &self.currs {
                match curr {
                    Some(m) => max = max.max(m.number),
                    None => return Ok(None),
                }
            }

            let mut aligned = true;
            for (curr, searcher) in self.currs.iter_mut().zip(self.searchers.iter_mut()) {
                if curr.as_ref().is_some_and(|m| m.number < max) {
                    *curr = searcher.advance(max)?;
                    aligned = false;
                }
            }

            if aligned {
                let matches: Vec<DocumentMatch> =
                    self.currs.iter_mut().filter_map(Option::take).collect();
                for (curr, searcher) in self.currs.iter_mut().zip(self.searchers.iter_mut()) {
                    *curr = searcher.next()?;
                }
                return Ok(combine(matches, None, self.explain));
            }
        }
    }
}

impl Searcher for ConjunctionSearcher {
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
        self.searchers.iter().map(|s| s.count()).min().unwrap_or(0)
    }

    fn close(&mut self) -> Result<()> {
        close_all(&mut self.searchers)
    }
}
