//! Top-N collection of searcher output.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use crate::engine::IndexReader;
use crate::error::Result;
use crate::search::facet::{FacetResults, FacetsBuilder};
use crate::search::{DocumentMatch, Searcher};

/// Keeps the best `size` hits after skipping the first `skip`.
///
/// Hits are ordered by descending score, ties broken by ascending document
/// number.
#[derive(Debug)]
pub struct TopNCollector {
    size: usize,
    skip: usize,
    results: Vec<DocumentMatch>,
    total: u64,
    max_score: f64,
    took: Duration,
    facets: Option<FacetsBuilder>,
}

fn rank(a: &DocumentMatch, b: &DocumentMatch) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.number.cmp(&b.number))
}

impl TopNCollector {
    pub fn new(size: usize, skip: usize) -> Self {
        TopNCollector {
            size,
            skip,
            results: Vec::new(),
            total: 0,
            max_score: 0.0,
            took: Duration::ZERO,
            facets: None,
        }
    }

    pub fn set_facets_builder(&mut self, facets: FacetsBuilder) {
        self.facets = Some(facets);
    }

    /// Drain the searcher.
    pub fn collect(&mut self, searcher: &mut dyn Searcher, reader: &dyn IndexReader) -> Result<()> {
        let start = Instant::now();
        let capacity = self.size.saturating_add(self.skip);

        while let Some(hit) = searcher.next()? {
            self.total += 1;
            if hit.score > self.max_score {
                self.max_score = hit.score;
            }
            if let Some(facets) = self.facets.as_mut() {
                facets.update(&reader.document_field_terms(hit.number)?);
            }
            if capacity == 0 {
                continue;
            }

            let position = self
                .results
                .partition_point(|existing| rank(existing, &hit) != Ordering::Greater);
            if position < capacity {
                self.results.insert(position, hit);
                self.results.truncate(capacity);
            }
        }

        let skip = self.skip.min(self.results.len());
        self.results.drain(..skip);
        for hit in &mut self.results {
            hit.id = reader.external_id(hit.number)?;
        }

        self.took = start.elapsed();
        Ok(())
    }

    pub fn results(&self) -> &[DocumentMatch] {
        &self.results
    }

    pub fn into_results(self) -> Vec<DocumentMatch> {
        self.results
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    pub fn took(&self) -> Duration {
        self.took
    }

    pub fn facet_results(&self) -> FacetResults {
        self.facets
            .as_ref()
            .map(FacetsBuilder::results)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DocNum;

    #[derive(Debug)]
    struct FixedSearcher {
        hits: std::vec::IntoIter<DocumentMatch>,
    }

    impl Searcher for FixedSearcher {
        fn next(&mut self) -> Result<Option<DocumentMatch>> {
            Ok(self.hits.next())
        }

        fn advance(&mut self, target: DocNum) -> Result<Option<DocumentMatch>> {
            for hit in self.hits.by_ref() {
                if hit.number >= target {
                    return Ok(Some(hit));
                }
            }
            Ok(None)
        }

        fn count(&self) -> u64 {
            0
        }
    }

    fn ranked(scores: &[f64], size: usize, skip: usize) -> (Vec<DocNum>, u64) {
        use crate::engine::inverted::InvertedIndex;
        use crate::engine::store::MemoryStore;
        use crate::engine::IndexEngine;
        use crate::document::{Document, Field};
        use std::sync::Arc;

        let engine = InvertedIndex::new(Arc::new(MemoryStore::new()));
        engine.open().unwrap();
        for i in 0..scores.len() {
            engine
                .update(&Document::new(format!("d{i}")).with_field(Field::text("f", vec![], "x")))
                .unwrap();
        }
        let reader = engine.reader().unwrap();

        let hits: Vec<DocumentMatch> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| DocumentMatch::new(i as DocNum, *s))
            .collect();
        let mut searcher = FixedSearcher {
            hits: hits.into_iter(),
        };
        let mut collector = TopNCollector::new(size, skip);
        collector.collect(&mut searcher, reader.as_ref()).unwrap();
        (
            collector.results().iter().map(|h| h.number).collect(),
            collector.total(),
        )
    }

    #[test]
    fn test_top_n_ordering() {
        let (docs, total) = ranked(&[0.5, 2.0, 1.0, 2.0, 0.1], 3, 0);
        assert_eq!(docs, vec![1, 3, 2]);
        assert_eq!(total, 5);
    }

    #[test]
    fn test_skip() {
        let (docs, total) = ranked(&[0.5, 2.0, 1.0, 2.0, 0.1], 2, 2);
        assert_eq!(docs, vec![2, 0]);
        assert_eq!(total, 5);
    }

    #[test]
    fn test_unbounded_size_with_skip() {
        let (docs, total) = ranked(&[0.5, 2.0, 1.0], usize::MAX, 1);
        assert_eq!(docs, vec![2, 0]);
        assert_eq!(total, 3);
    }

    #[test]
    fn test_zero_size_counts_only() {
        let (docs, total) = ranked(&[1.0, 2.0], 0, 0);
        assert!(docs.is_empty());
        assert_eq!(total, 2);
    }
}
