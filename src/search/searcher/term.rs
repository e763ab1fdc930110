use crate::engine::{DocNum, IndexReader, Posting};
use crate::error::Result;
use crate::search::scorer::TermQueryScorer;
use crate::search::{DocumentMatch, Searcher};

/// Matches documents containing one exact term in one field.
#[derive(Debug)]
pub struct TermSearcher {
    postings: Vec<Posting>,
    cursor: usize,
    scorer: TermQueryScorer,
}

impl TermSearcher {
    pub fn new(
        reader: &dyn IndexReader,
        term: &str,
        field: &str,
        boost: f64,
        explain: bool,
    ) -> Result<Self> {
        let postings = reader.term_postings(field, term)?;
        let scorer = TermQueryScorer::new(
            term,
            field,
            boost,
            reader.doc_count(),
            postings.len() as u64,
            explain,
        );
        Ok(TermSearcher {
            postings,
            cursor: 0,
            scorer,
        })
    }
}

impl Searcher for TermSearcher {
    fn next(&mut self) -> Result<Option<DocumentMatch>> {
        let Some(posting) = self.postings.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        Ok(Some(self.scorer.score(posting)))
    }

    fn advance(&mut self, target: DocNum) -> Result<Option<DocumentMatch>> {
        let remaining = &self.postings[self.cursor.min(self.postings.len())..];
        self.cursor += remaining.partition_point(|p| p.doc < target);
        self.next()
    }

    fn count(&self) -> u64 {
        self.postings.len() as u64
    }
}
