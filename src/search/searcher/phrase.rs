use std::collections::BTreeMap;

use crate::engine::{DocNum, IndexReader};
use crate::error::Result;
use crate::search::searcher::{ConjunctionSearcher, TermSearcher};
use crate::search::{DocumentMatch, Location, Searcher};

/// Matches documents where the terms occur at consecutive positions.
///
/// Empty strings in `terms` are gaps: they match any single position, which
/// is how stop-word holes in an analyzed phrase are kept.
#[derive(Debug)]
pub struct PhraseSearcher {
    conjunction: ConjunctionSearcher,
    field: String,
    terms: Vec<String>,
}

impl PhraseSearcher {
    pub fn new(
        reader: &dyn IndexReader,
        terms: Vec<String>,
        field: &str,
        boost: f64,
        explain: bool,
    ) -> Result<Self> {
        let mut distinct: Vec<&String> = terms.iter().filter(|t| !t.is_empty()).collect();
        distinct.sort();
        distinct.dedup();

        let mut searchers: Vec<Box<dyn Searcher>> = Vec::with_capacity(distinct.len());
        for term in distinct {
            searchers.push(Box::new(TermSearcher::new(reader, term, field, boost, explain)?));
        }

        Ok(PhraseSearcher {
            conjunction: ConjunctionSearcher::new(searchers, explain),
            field: field.to_string(),
            terms,
        })
    }

    /// Locations of every complete phrase occurrence in a candidate.
    fn phrase_locations(&self, hit: &DocumentMatch) -> Option<BTreeMap<String, Vec<Location>>> {
        let field_locations = hit.locations.get(&self.field)?;
        let (first_index, first_term) = self
            .terms
            .iter()
            .enumerate()
            .find(|(_, t)| !t.is_empty())?;

        let mut matched: BTreeMap<String, Vec<Location>> = BTreeMap::new();
        for start in field_locations.get(first_term)? {
            let mut occurrence = vec![(first_term, start)];
            let complete = self
                .terms
                .iter()
                .enumerate()
                .skip(first_index + 1)
                .filter(|(_, t)| !t.is_empty())
                .all(|(i, term)| {
                    let wanted = start.pos + (i - first_index) as u64;
                    let found = field_locations.get(term).and_then(|locations| {
                        locations.iter().find(|l| {
                            l.pos == wanted && l.array_positions == start.array_positions
                        })
                    });
                    match found {
                        Some(location) => {
                            occurrence.push((term, location));
                            true
                        }
                        None => false,
                    }
                });
            if complete {
                for (term, location) in occurrence {
                    matched.entry(term.clone()).or_default().push(location.clone());
                }
            }
        }

        if matched.is_empty() { None } else { Some(matched) }
    }

    fn filter(&mut self, mut candidate: Option<DocumentMatch>) -> Result<Option<DocumentMatch>> {
        while let Some(mut hit) = candidate {
            if let Some(locations) = self.phrase_locations(&hit) {
                hit.locations = BTreeMap::from([(self.field.clone(), locations)]);
                return Ok(Some(hit));
            }
            candidate = self.conjunction.next()?;
        }
        Ok(None)
    }
}

impl Searcher for PhraseSearcher {
    fn next(&mut self) -> Result<Option<DocumentMatch>> {
        let candidate = self.conjunction.next()?;
        self.filter(candidate)
    }

    fn advance(&mut self, target: DocNum) -> Result<Option<DocumentMatch>> {
        let candidate = self.conjunction.advance(target)?;
        self.filter(candidate)
    }

    fn count(&self) -> u64 {
        self.conjunction.count()
    }

    fn close(&mut self) -> Result<()> {
        self.conjunction.close()
    }
}
