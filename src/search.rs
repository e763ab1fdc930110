//! Search execution: searchers, scoring, collection, facets and highlighting.
//!
//! A compiled query is a tree of [`Searcher`]s. Each searcher yields
//! [`DocumentMatch`]es in increasing document-number order, which lets the
//! compound searchers merge their children with a single forward pass.

pub mod collector;
pub mod facet;
pub mod highlight;
pub mod request;
pub mod scorer;
pub mod searcher;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::TermLocation;
use crate::engine::DocNum;

pub use collector::TopNCollector;
pub use facet::{FacetResult, FacetResults};
pub use request::{
    DateTimeRange, FacetRequest, HighlightRequest, NumericRange, SearchRequest, SearchResult,
};
pub use searcher::Searcher;

/// Occurrence of a matched term, as returned with a hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub pos: u64,
    pub start: u64,
    pub end: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub array_positions: Vec<u64>,
}

impl From<&TermLocation> for Location {
    fn from(location: &TermLocation) -> Self {
        Location {
            pos: location.position,
            start: location.start,
            end: location.end,
            array_positions: location.array_positions.clone(),
        }
    }
}

/// field -> term -> locations
pub type FieldTermLocationMap = BTreeMap<String, BTreeMap<String, Vec<Location>>>;

/// How a score was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub value: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Explanation>,
}

impl Explanation {
    pub fn new<S: Into<String>>(value: f64, message: S) -> Self {
        Explanation {
            value,
            message: message.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Explanation>) -> Self {
        self.children = children;
        self
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{} = {}", "", self.value, self.message, indent = depth * 2)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// A single search hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMatch {
    /// Name of the index the hit came from.
    pub index: String,

    pub id: String,

    pub score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expl: Option<Explanation>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub locations: FieldTermLocationMap,

    /// Highlighted fragments, keyed by field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fragments: BTreeMap<String, Vec<String>>,

    /// Requested stored field values, keyed by field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,

    #[serde(skip)]
    pub number: DocNum,
}

impl DocumentMatch {
    pub fn new(number: DocNum, score: f64) -> Self {
        DocumentMatch {
            number,
            score,
            ..Default::default()
        }
    }

    /// Record the locations of a term.
    pub fn add_locations(&mut self, field: &str, term: &str, locations: &[TermLocation]) {
        if locations.is_empty() {
            return;
        }
        self.locations
            .entry(field.to_string())
            .or_default()
            .entry(term.to_string())
            .or_default()
            .extend(locations.iter().map(Location::from));
    }

    /// Fold another match's locations into this one.
    pub fn merge_locations(&mut self, other: FieldTermLocationMap) {
        for (field, terms) in other {
            let target = self.locations.entry(field).or_default();
            for (term, locations) in terms {
                target.entry(term).or_default().extend(locations);
            }
        }
    }

    /// Add a field value, turning repeated values into an array.
    pub fn add_field_value(&mut self, name: &str, value: serde_json::Value) {
        match self.fields.get_mut(name) {
            None => {
                self.fields.insert(name.to_string(), value);
            }
            Some(serde_json::Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = serde_json::Value::Array(vec![first, value]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_field_value_accumulates() {
        let mut hit = DocumentMatch::new(1, 1.0);
        hit.add_field_value("tag", json!("a"));
        assert_eq!(hit.fields["tag"], json!("a"));
        hit.add_field_value("tag", json!("b"));
        hit.add_field_value("tag", json!("c"));
        assert_eq!(hit.fields["tag"], json!(["a", "b", "c"]));
    }

    #[test]
    fn test_merge_locations() {
        let loc = TermLocation {
            position: 1,
            start: 0,
            end: 3,
            array_positions: vec![],
        };
        let mut a = DocumentMatch::new(1, 1.0);
        a.add_locations("body", "fox", std::slice::from_ref(&loc));
        let mut b = DocumentMatch::new(1, 1.0);
        b.add_locations("body", "fox", &[loc.clone()]);
        b.add_locations("body", "dog", &[loc]);

        a.merge_locations(b.locations);
        assert_eq!(a.locations["body"]["fox"].len(), 2);
        assert_eq!(a.locations["body"]["dog"].len(), 1);
    }
}
