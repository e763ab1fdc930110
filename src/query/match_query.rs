//! Analyzed queries: the text is run through the field's analyzer before
//! terms are looked up.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::{Analyzer, Token};
use crate::engine::IndexReader;
use crate::error::{GlaiveError, Result};
use crate::mapping::IndexMapping;
use crate::query::{DisjunctionQuery, FuzzyQuery, Query, QueryNode, TermQuery};
use crate::search::Searcher;
use crate::search::searcher::{MatchNoneSearcher, PhraseSearcher};

fn resolve_analyzer(
    mapping: &IndexMapping,
    explicit: Option<&str>,
    field: &str,
) -> Result<Arc<dyn Analyzer>> {
    match explicit {
        Some(name) => mapping
            .analyzer_named(name)
            .ok_or_else(|| GlaiveError::query(format!("no analyzer named '{name}' registered"))),
        None => mapping.analyzer_for_path(field),
    }
}

/// Analyze `text` and return the tokens, ordered by position.
fn analyze(
    mapping: &IndexMapping,
    explicit: Option<&str>,
    field: &str,
    text: &str,
) -> Result<Vec<Token>> {
    let analyzer = resolve_analyzer(mapping, explicit, field)?;
    let mut tokens: Vec<Token> = analyzer.analyze(text)?.collect();
    tokens.sort_by_key(|t| t.position);
    Ok(tokens)
}

/// Matches documents containing any of the analyzed terms of the text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchQuery {
    #[serde(rename = "match")]
    pub match_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
    /// Edit distance allowed per term; 0 means exact.
    #[serde(default)]
    pub fuzziness: u8,
    #[serde(default)]
    pub prefix_length: usize,
}

impl MatchQuery {
    pub fn new<S: Into<String>>(text: S) -> Self {
        MatchQuery {
            match_text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_analyzer<S: Into<String>>(mut self, analyzer: S) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }

    pub fn with_fuzziness(mut self, fuzziness: u8) -> Self {
        self.fuzziness = fuzziness;
        self
    }

    pub fn with_prefix_length(mut self, prefix_length: usize) -> Self {
        self.prefix_length = prefix_length;
        self
    }
}

impl QueryNode for MatchQuery {
    boost_accessors!();
    field_accessors!();

    fn validate(&self) -> Result<()> {
        if self.fuzziness > FuzzyQuery::MAX_FUZZINESS {
            return Err(GlaiveError::query(format!(
                "fuzziness {} exceeds the maximum of {}",
                self.fuzziness,
                FuzzyQuery::MAX_FUZZINESS
            )));
        }
        Ok(())
    }

    fn searcher(
        &self,
        reader: &dyn IndexReader,
        mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        let field = self.field.as_deref().unwrap_or(&mapping.default_field);
        let tokens = analyze(mapping, self.analyzer.as_deref(), field, &self.match_text)?;
        if tokens.is_empty() {
            return Ok(Box::new(MatchNoneSearcher::new()));
        }

        let boost = self.boost();
        let clauses: Vec<Query> = tokens
            .into_iter()
            .map(|token| {
                if self.fuzziness > 0 {
                    FuzzyQuery::new(token.text)
                        .with_field(field)
                        .with_fuzziness(self.fuzziness)
                        .with_prefix_length(self.prefix_length)
                        .with_boost(boost)
                        .into()
                } else {
                    TermQuery::new(token.text)
                        .with_field(field)
                        .with_boost(boost)
                        .into()
                }
            })
            .collect();
        DisjunctionQuery::new(clauses).searcher(reader, mapping, explain)
    }
}

/// Matches documents containing the analyzed terms at consecutive positions.
///
/// Positions dropped by the analyzer (stop words) stay as gaps that match any
/// term.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchPhraseQuery {
    pub match_phrase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl MatchPhraseQuery {
    pub fn new<S: Into<String>>(phrase: S) -> Self {
        MatchPhraseQuery {
            match_phrase: phrase.into(),
            ..Default::default()
        }
    }

    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_analyzer<S: Into<String>>(mut self, analyzer: S) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }
}

/// Lay tokens out by relative position, leaving "" where positions are missing.
fn phrase_terms(tokens: Vec<Token>) -> Vec<String> {
    let first = tokens.first().map(|t| t.position).unwrap_or(0);
    let last = tokens.last().map(|t| t.position).unwrap_or(first);
    let mut terms = vec![String::new(); last - first + 1];
    for token in tokens {
        terms[token.position - first] = token.text;
    }
    terms
}

impl QueryNode for MatchPhraseQuery {
    boost_accessors!();
    field_accessors!();

    fn searcher(
        &self,
        reader: &dyn IndexReader,
        mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        let field = self.field.as_deref().unwrap_or(&mapping.default_field);
        let tokens = analyze(mapping, self.analyzer.as_deref(), field, &self.match_phrase)?;
        if tokens.is_empty() {
            return Ok(Box::new(MatchNoneSearcher::new()));
        }
        let terms = phrase_terms(tokens);
        Ok(Box::new(PhraseSearcher::new(
            reader,
            terms,
            field,
            self.boost(),
            explain,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_terms_keep_gaps() {
        let tokens = vec![
            Token::new("quick", 2),
            Token::new("fox", 4),
            Token::new("jumps", 5),
        ];
        assert_eq!(phrase_terms(tokens), vec!["quick", "", "fox", "jumps"]);
    }

    #[test]
    fn test_match_json_shape() {
        let query = MatchQuery::new("brown fox").with_field("body");
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["match"], "brown fox");
        assert_eq!(json["field"], "body");
        assert!(json.get("analyzer").is_none());

        let decoded: MatchQuery =
            serde_json::from_value(serde_json::json!({"match": "x", "fuzziness": 2})).unwrap();
        assert_eq!(decoded.fuzziness, 2);
        assert_eq!(decoded.boost(), 1.0);
    }

    #[test]
    fn test_fuzziness_limit() {
        assert!(MatchQuery::new("x").with_fuzziness(2).validate().is_ok());
        assert!(MatchQuery::new("x").with_fuzziness(3).validate().is_err());
    }
}
