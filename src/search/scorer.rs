//! TF-IDF scoring for term matches.

use crate::engine::Posting;
use crate::search::{DocumentMatch, Explanation};

/// Scores postings of a single term.
#[derive(Debug, Clone)]
pub struct TermQueryScorer {
    field: String,
    term: String,
    boost: f64,
    idf: f64,
    explain: bool,
}

impl TermQueryScorer {
    pub fn new(
        term: &str,
        field: &str,
        boost: f64,
        doc_total: u64,
        doc_term: u64,
        explain: bool,
    ) -> Self {
        let idf = 1.0 + (doc_total as f64 / (doc_term as f64 + 1.0)).ln();
        TermQueryScorer {
            field: field.to_string(),
            term: term.to_string(),
            boost,
            idf,
            explain,
        }
    }

    pub fn idf(&self) -> f64 {
        self.idf
    }

    /// Build the match for one posting.
    pub fn score(&self, posting: &Posting) -> DocumentMatch {
        let tf = (posting.frequency as f64).sqrt();
        let norm = posting.norm as f64;
        let score = tf * self.idf * norm * self.boost;

        let mut hit = DocumentMatch::new(posting.doc, score);
        if self.explain {
            hit.expl = Some(
                Explanation::new(
                    score,
                    format!(
                        "fieldWeight({}:{} in {}), product of:",
                        self.field, self.term, posting.doc
                    ),
                )
                .with_children(vec![
                    Explanation::new(tf, format!("tf(termFreq({}:{})={})", self.field, self.term, posting.frequency)),
                    Explanation::new(norm, format!("fieldNorm(field={}, doc={})", self.field, posting.doc)),
                    Explanation::new(self.idf, format!("idf(docFreq, maxDocs) for {}", self.term)),
                    Explanation::new(self.boost, "boost"),
                ]),
            );
        }
        hit.add_locations(&self.field, &self.term, &posting.locations);
        hit
    }
}

/// Combine child scores of a compound match.
///
/// Sums the children and, when `coord` is given as `(matched, total)`,
/// scales the sum by `matched / total`.
pub fn combine(
    mut matches: Vec<DocumentMatch>,
    coord: Option<(usize, usize)>,
    explain: bool,
) -> Option<DocumentMatch> {
    let first = matches.first()?.number;
    let sum: f64 = matches.iter().map(|m| m.score).sum();
    let score = match coord {
        Some((matched, total)) if total > 0 => sum * matched as f64 / total as f64,
        _ => sum,
    };

    let mut combined = DocumentMatch::new(first, score);
    let mut children = Vec::new();
    for m in matches.iter_mut() {
        if let Some(expl) = m.expl.take() {
            children.push(expl);
        }
        combined.merge_locations(std::mem::take(&mut m.locations));
    }

    if explain {
        let sum_expl = Explanation::new(sum, "sum of:").with_children(children);
        combined.expl = Some(match coord {
            Some((matched, total)) => Explanation::new(score, "product of:").with_children(vec![
                sum_expl,
                Explanation::new(
                    matched as f64 / total.max(1) as f64,
                    format!("coord({matched}/{total})"),
                ),
            ]),
            None => sum_expl,
        });
    }
    Some(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(doc: u64, frequency: u64) -> Posting {
        Posting {
            doc,
            frequency,
            norm: 1.0,
            locations: Vec::new(),
        }
    }

    #[test]
    fn test_rarer_terms_score_higher() {
        let common = TermQueryScorer::new("the", "body", 1.0, 100, 90, false);
        let rare = TermQueryScorer::new("fox", "body", 1.0, 100, 2, false);
        assert!(rare.score(&posting(1, 1)).score > common.score(&posting(1, 1)).score);
    }

    #[test]
    fn test_boost_scales_score() {
        let plain = TermQueryScorer::new("fox", "body", 1.0, 10, 1, false);
        let boosted = TermQueryScorer::new("fox", "body", 2.0, 10, 1, true);
        let a = plain.score(&posting(3, 4));
        let b = boosted.score(&posting(3, 4));
        assert!((b.score - 2.0 * a.score).abs() < 1e-9);
        assert_eq!(b.expl.unwrap().children.len(), 4);
    }

    #[test]
    fn test_combine_with_coord() {
        let parts = vec![DocumentMatch::new(7, 1.0), DocumentMatch::new(7, 2.0)];
        let combined = combine(parts, Some((2, 4)), true).unwrap();
        assert_eq!(combined.number, 7);
        assert!((combined.score - 1.5).abs() < 1e-9);
        assert!(combine(Vec::new(), None, false).is_none());
    }
}
