//! Search requests and results.
//!
//! # Examples
//!
//! ```
//! use glaive::query::{MatchQuery, Query};
//! use glaive::search::{FacetRequest, SearchRequest};
//!
//! let mut request = SearchRequest::new(Query::Match(MatchQuery::new("fox")))
//!     .with_size(20)
//!     .with_fields(vec!["*".to_string()]);
//! request.add_facet("tags", FacetRequest::new("tags", 5));
//!
//! assert_eq!(request.size, 20);
//! assert_eq!(request.from, 0);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::query::Query;
use crate::search::DocumentMatch;
use crate::search::facet::FacetResults;

fn default_size() -> usize {
    10
}

/// A named numeric bucket, `[min, max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// A named date bucket, `[start, end)`. Bounds are parsed with the datetime
/// parser of the faceted field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateTimeRange {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// A facet to compute over the hits.
///
/// With numeric ranges it is a numeric facet, with date ranges a date facet,
/// and otherwise a terms facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetRequest {
    pub field: String,
    pub size: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub numeric_ranges: Vec<NumericRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub date_ranges: Vec<DateTimeRange>,
}

impl FacetRequest {
    pub fn new<S: Into<String>>(field: S, size: usize) -> Self {
        FacetRequest {
            field: field.into(),
            size,
            numeric_ranges: Vec::new(),
            date_ranges: Vec::new(),
        }
    }

    pub fn add_numeric_range<S: Into<String>>(
        &mut self,
        name: S,
        min: Option<f64>,
        max: Option<f64>,
    ) {
        self.numeric_ranges.push(NumericRange {
            name: name.into(),
            min,
            max,
        });
    }

    pub fn add_date_range<S: Into<String>>(
        &mut self,
        name: S,
        start: Option<&str>,
        end: Option<&str>,
    ) {
        self.date_ranges.push(DateTimeRange {
            name: name.into(),
            start: start.map(str::to_string),
            end: end.map(str::to_string),
        });
    }
}

/// Which fields to highlight, and how.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightRequest {
    /// Highlighter name; the configured default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Fields to highlight; every field with matches when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl HighlightRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style<S: Into<String>>(style: S) -> Self {
        HighlightRequest {
            style: Some(style.into()),
            fields: Vec::new(),
        }
    }

    pub fn add_field<S: Into<String>>(&mut self, field: S) {
        self.fields.push(field.into());
    }
}

/// A search to run against an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: Query,

    #[serde(default = "default_size")]
    pub size: usize,

    #[serde(default)]
    pub from: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<HighlightRequest>,

    /// Stored fields to return with each hit; `*` returns all of them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: BTreeMap<String, FacetRequest>,

    #[serde(default)]
    pub explain: bool,
}

impl SearchRequest {
    pub fn new(query: Query) -> Self {
        SearchRequest {
            query,
            size: default_size(),
            from: 0,
            highlight: None,
            fields: Vec::new(),
            facets: BTreeMap::new(),
            explain: false,
        }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_highlight(mut self, highlight: HighlightRequest) -> Self {
        self.highlight = Some(highlight);
        self
    }

    pub fn add_facet<S: Into<String>>(&mut self, name: S, facet: FacetRequest) {
        self.facets.insert(name.into(), facet);
    }
}

impl fmt::Display for SearchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

/// Outcome of a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub request: SearchRequest,
    pub hits: Vec<DocumentMatch>,
    pub total: u64,
    pub max_score: f64,
    pub took: Duration,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: FacetResults,
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            return writeln!(f, "No matches");
        }
        if self.hits.is_empty() {
            writeln!(f, "{} matches, took {:?}", self.total, self.took)?;
        } else {
            writeln!(
                f,
                "{} matches, showing {} through {}, took {:?}",
                self.total,
                self.request.from + 1,
                self.request.from + self.hits.len(),
                self.took
            )?;
        }
        for (i, hit) in self.hits.iter().enumerate() {
            writeln!(f, "{:5}. {} ({:.6})", self.request.from + i + 1, hit.id, hit.score)?;
            for (field, fragments) in &hit.fragments {
                writeln!(f, "\t{field}")?;
                for fragment in fragments {
                    writeln!(f, "\t\t{fragment}")?;
                }
            }
        }
        for (name, facet) in &self.facets {
            writeln!(
                f,
                "Facet {name} ({}): total {}, missing {}, other {}",
                facet.field, facet.total, facet.missing, facet.other
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults_from_json() {
        let request: SearchRequest = serde_json::from_value(json!({
            "query": {"type": "match_all"}
        }))
        .unwrap();
        assert_eq!(request.size, 10);
        assert_eq!(request.from, 0);
        assert!(!request.explain);
        assert!(matches!(request.query, Query::MatchAll(_)));
    }
}
