//! Analyzers: a tokenizer followed by a chain of token filters.
//!
//! Built-in analyzers, all registered by name in the default
//! [`Registry`](crate::registry::Registry):
//!
//! | name         | pipeline                                  |
//! |--------------|-------------------------------------------|
//! | `standard`   | unicode words, lowercase, English stops   |
//! | `simple`     | unicode words, lowercase                  |
//! | `whitespace` | whitespace split                          |
//! | `keyword`    | whole input as one token                  |
//!
//! # Examples
//!
//! ```
//! use glaive::analysis::analyzer::{Analyzer, PipelineAnalyzer};
//!
//! let analyzer = PipelineAnalyzer::standard();
//! let tokens: Vec<_> = analyzer.analyze("The Quick fox").unwrap().collect();
//!
//! assert_eq!(tokens.len(), 2);
//! assert_eq!(tokens[0].text, "quick");
//! ```

use std::fmt;
use std::sync::Arc;

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::{Filter, LowercaseFilter, StopFilter};
use crate::analysis::tokenizer::{
    Tokenizer, UnicodeWordTokenizer, WhitespaceTokenizer, WholeTokenizer,
};
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
pub trait Analyzer: Send + Sync + fmt::Debug {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer.
    fn name(&self) -> &str;
}

/// A configurable analyzer that combines a tokenizer with a chain of filters.
#[derive(Clone)]
pub struct PipelineAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
    filters: Vec<Arc<dyn Filter>>,
    name: String,
}

impl PipelineAnalyzer {
    /// Create a new pipeline analyzer with the given tokenizer.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        PipelineAnalyzer {
            name: format!("pipeline_{}", tokenizer.name()),
            tokenizer,
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline.
    pub fn add_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the analyzer name.
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Unicode words, lowercased, English stop words removed.
    pub fn standard() -> Self {
        PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(StopFilter::new()))
            .with_name("standard")
    }

    /// Unicode words, lowercased.
    pub fn simple() -> Self {
        PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
            .add_filter(Arc::new(LowercaseFilter::new()))
            .with_name("simple")
    }

    /// Whitespace-separated tokens, unchanged.
    pub fn whitespace() -> Self {
        PipelineAnalyzer::new(Arc::new(WhitespaceTokenizer::new())).with_name("whitespace")
    }

    /// The whole input as a single token.
    pub fn keyword() -> Self {
        PipelineAnalyzer::new(Arc::new(WholeTokenizer::new())).with_name("keyword")
    }
}

impl fmt::Debug for PipelineAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineAnalyzer")
            .field("name", &self.name)
            .field("tokenizer", &self.tokenizer.name())
            .field(
                "filters",
                &self.filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Analyzer for PipelineAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = self.tokenizer.tokenize(text)?;
        for filter in &self.filters {
            tokens = filter.filter(tokens)?;
        }
        Ok(tokens)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    #[test]
    fn test_standard_analyzer() {
        let tokens: Vec<Token> = PipelineAnalyzer::standard()
            .analyze("Hello the World")
            .unwrap()
            .collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "hello");
        assert_eq!(tokens[1].text, "world");
        assert_eq!(tokens[1].position, 3);
    }

    #[test]
    fn test_keyword_analyzer() {
        let analyzer = PipelineAnalyzer::keyword();
        let tokens: Vec<Token> = analyzer.analyze("New York").unwrap().collect();

        assert_eq!(analyzer.name(), "keyword");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "New York");
    }
}
