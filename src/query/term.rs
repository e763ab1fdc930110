//! Term-level queries. The input is compared against indexed terms without
//! being analyzed, so it should already be in indexed form.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::engine::IndexReader;
use crate::error::{GlaiveError, Result};
use crate::mapping::IndexMapping;
use crate::query::QueryNode;
use crate::search::Searcher;
use crate::search::searcher::{TermSearcher, fuzzy_searcher, prefix_searcher, regexp_searcher};

/// A query that matches documents containing an exact term.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermQuery {
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl TermQuery {
    pub fn new<T: Into<String>>(term: T) -> Self {
        TermQuery {
            term: term.into(),
            ..Default::default()
        }
    }

    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }
}

impl QueryNode for TermQuery {
    boost_accessors!();
    field_accessors!();

    fn searcher(
        &self,
        reader: &dyn IndexReader,
        mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        let field = self.field.as_deref().unwrap_or(&mapping.default_field);
        Ok(Box::new(TermSearcher::new(
            reader,
            &self.term,
            field,
            self.boost(),
            explain,
        )?))
    }
}

/// Matches documents containing a term that starts with the prefix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrefixQuery {
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl PrefixQuery {
    pub fn new<T: Into<String>>(prefix: T) -> Self {
        PrefixQuery {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl QueryNode for PrefixQuery {
    boost_accessors!();
    field_accessors!();

    fn searcher(
        &self,
        reader: &dyn IndexReader,
        mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        let field = self.field.as_deref().unwrap_or(&mapping.default_field);
        prefix_searcher(reader, &self.prefix, field, self.boost(), explain)
    }
}

/// Matches documents containing a term the expression matches in full.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegexpQuery {
    pub regexp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
    #[serde(skip)]
    compiled: OnceLock<Regex>,
}

impl RegexpQuery {
    pub fn new<T: Into<String>>(regexp: T) -> Self {
        RegexpQuery {
            regexp: regexp.into(),
            ..Default::default()
        }
    }

    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }

    /// The expression anchored at both ends, compiled once.
    fn compiled(&self) -> Result<&Regex> {
        if let Some(regex) = self.compiled.get() {
            return Ok(regex);
        }
        let regex = Regex::new(&format!("^(?:{})$", self.regexp))?;
        Ok(self.compiled.get_or_init(|| regex))
    }
}

impl QueryNode for RegexpQuery {
    boost_accessors!();
    field_accessors!();

    fn validate(&self) -> Result<()> {
        self.compiled().map(|_| ())
    }

    fn searcher(
        &self,
        reader: &dyn IndexReader,
        mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        let field = self.field.as_deref().unwrap_or(&mapping.default_field);
        regexp_searcher(reader, self.compiled()?, field, self.boost(), explain)
    }
}

fn default_fuzziness() -> u8 {
    1
}

/// Matches documents containing a term within `fuzziness` edits of the
/// given term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyQuery {
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
    #[serde(default = "default_fuzziness")]
    pub fuzziness: u8,
    /// Leading characters that must match exactly.
    #[serde(default)]
    pub prefix_length: usize,
}

impl FuzzyQuery {
    pub const MAX_FUZZINESS: u8 = 2;

    pub fn new<T: Into<String>>(term: T) -> Self {
        FuzzyQuery {
            term: term.into(),
            field: None,
            boost: None,
            fuzziness: default_fuzziness(),
            prefix_length: 0,
        }
    }

    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
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

impl QueryNode for FuzzyQuery {
    boost_accessors!();
    field_accessors!();

    fn validate(&self) -> Result<()> {
        if self.fuzziness > Self::MAX_FUZZINESS {
            return Err(GlaiveError::query(format!(
                "fuzziness {} exceeds the maximum of {}",
                self.fuzziness,
                Self::MAX_FUZZINESS
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
        fuzzy_searcher(
            reader,
            &self.term,
            self.prefix_length,
            self.fuzziness as usize,
            field,
            self.boost(),
            explain,
        )
    }
}
