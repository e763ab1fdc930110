use crate::engine::{DocNum, IndexReader};
use crate::error::Result;
use crate::search::{DocumentMatch, Explanation, Searcher};

/// Matches an explicit set of documents with a constant score.
#[derive(Debug)]
pub struct DocIdSearcher {
    docs: Vec<DocNum>,
    cursor: usize,
    boost: f64,
    explain: bool,
}

impl DocIdSearcher {
    /// Match the documents with the given external ids. Unknown ids are
    /// ignored.
    pub fn new<S: AsRef<str>>(
        reader: &dyn IndexReader,
        ids: &[S],
        boost: f64,
        explain: bool,
    ) -> Self {
        let docs = ids
            .iter()
            .filter_map(|id| reader.doc_number(id.as_ref()))
            .collect();
        Self::from_numbers(docs, boost, explain)
    }

    pub(crate) fn from_numbers(mut docs: Vec<DocNum>, boost: f64, explain: bool) -> Self {
        docs.sort_unstable();
        docs.dedup();
        DocIdSearcher {
            docs,
            cursor: 0,
            boost,
            explain,
        }
    }
}

impl Searcher for DocIdSearcher {
    fn next(&mut self) -> Result<Option<DocumentMatch>> {
        let Some(&doc) = self.docs.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        let mut hit = DocumentMatch::new(doc, self.boost);
        if self.explain {
            hit.expl = Some(Explanation::new(self.boost, "constant score, product of boost"));
        }
        Ok(Some(hit))
    }

    fn advance(&mut self, target: DocNum) -> Result<Option<DocumentMatch>> {
        let remaining = &self.docs[self.cursor.min(self.docs.len())..];
        self.cursor += remaining.partition_point(|doc| *doc < target);
        self.next()
    }

    fn count(&self) -> u64 {
        self.docs.len() as u64
    }
}
