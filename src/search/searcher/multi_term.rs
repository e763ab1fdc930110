//! Searchers that expand into a disjunction over dictionary terms.

use regex::Regex;

use crate::engine::IndexReader;
use crate::error::Result;
use crate::search::Searcher;
use crate::search::searcher::{DisjunctionSearcher, MatchNoneSearcher, TermSearcher};
use crate::util::levenshtein::levenshtein_distance_threshold;
use crate::util::numeric::{decode_f64, encode_f64};

/// Disjunction of exact term searchers, one per term.
pub fn multi_term_searcher(
    reader: &dyn IndexReader,
    terms: &[String],
    field: &str,
    boost: f64,
    explain: bool,
) -> Result<Box<dyn Searcher>> {
    if terms.is_empty() {
        return Ok(Box::new(MatchNoneSearcher::new()));
    }
    let mut searchers: Vec<Box<dyn Searcher>> = Vec::with_capacity(terms.len());
    for term in terms {
        searchers.push(Box::new(TermSearcher::new(reader, term, field, boost, explain)?));
    }
    Ok(Box::new(DisjunctionSearcher::new(searchers, 0, explain)))
}

pub fn prefix_searcher(
    reader: &dyn IndexReader,
    prefix: &str,
    field: &str,
    boost: f64,
    explain: bool,
) -> Result<Box<dyn Searcher>> {
    let terms: Vec<String> = reader
        .field_dict_prefix(field, prefix)?
        .into_iter()
        .map(|e| e.term)
        .collect();
    multi_term_searcher(reader, &terms, field, boost, explain)
}

/// Terms fully matched by the expression.
pub fn regexp_searcher(
    reader: &dyn IndexReader,
    pattern: &Regex,
    field: &str,
    boost: f64,
    explain: bool,
) -> Result<Box<dyn Searcher>> {
    let terms: Vec<String> = reader
        .field_dict(field)?
        .into_iter()
        .map(|e| e.term)
        .filter(|term| pattern.is_match(term))
        .collect();
    multi_term_searcher(reader, &terms, field, boost, explain)
}

/// Terms within `fuzziness` edits of `term` that share its first
/// `prefix_length` characters.
pub fn fuzzy_searcher(
    reader: &dyn IndexReader,
    term: &str,
    prefix_length: usize,
    fuzziness: usize,
    field: &str,
    boost: f64,
    explain: bool,
) -> Result<Box<dyn Searcher>> {
    let prefix: String = term.chars().take(prefix_length).collect();
    let candidates = if prefix.is_empty() {
        reader.field_dict(field)?
    } else {
        reader.field_dict_prefix(field, &prefix)?
    };
    let terms: Vec<String> = candidates
        .into_iter()
        .map(|e| e.term)
        .filter(|candidate| levenshtein_distance_threshold(term, candidate, fuzziness).is_some())
        .collect();
    multi_term_searcher(reader, &terms, field, boost, explain)
}

/// Numeric terms between `min` and `max`. A missing or infinite bound is open.
#[allow(clippy::too_many_arguments)]
pub fn numeric_range_searcher(
    reader: &dyn IndexReader,
    min: Option<f64>,
    max: Option<f64>,
    inclusive_min: bool,
    inclusive_max: bool,
    field: &str,
    boost: f64,
    explain: bool,
) -> Result<Box<dyn Searcher>> {
    let min_term = min.filter(|v| v.is_finite()).map(encode_f64);
    let max_term = max.filter(|v| v.is_finite()).map(encode_f64);

    let terms: Vec<String> = reader
        .field_dict_range(field, min_term.as_deref(), max_term.as_deref())?
        .into_iter()
        .map(|e| e.term)
        .filter(|term| decode_f64(term).is_some())
        .filter(|term| inclusive_min || min_term.as_deref() != Some(term.as_str()))
        .filter(|term| inclusive_max || max_term.as_deref() != Some(term.as_str()))
        .collect();
    multi_term_searcher(reader, &terms, field, boost, explain)
}
