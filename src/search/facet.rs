//! Facet builders: aggregate the terms of every matching document.
//!
//! Builders see the indexed terms of each hit, so numeric and date facets
//! decode the sortable term encodings back into values.

use std::collections::BTreeMap;
use std::fmt;

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::numeric::{decode_f64, decode_i64};

/// Count of one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermFacet {
    pub term: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRangeFacet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeFacet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    pub count: u64,
}

/// Result of one facet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetResult {
    pub field: String,
    /// Values counted, across all buckets.
    pub total: u64,
    /// Hits without the field.
    pub missing: u64,
    /// Values counted but not in a returned bucket.
    pub other: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<TermFacet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub numeric_ranges: Vec<NumericRangeFacet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub date_ranges: Vec<DateRangeFacet>,
}

/// Facet results keyed by facet name.
pub type FacetResults = BTreeMap<String, FacetResult>;

/// Aggregates one field over the hits of a search.
pub trait FacetBuilder: Send + fmt::Debug {
    fn field(&self) -> &str;

    /// Account for one hit, given its field's terms (absent when missing).
    fn update(&mut self, terms: Option<&[String]>);

    fn result(&self) -> FacetResult;
}

/// Counts the most frequent terms of a field.
#[derive(Debug)]
pub struct TermsFacetBuilder {
    field: String,
    size: usize,
    counts: AHashMap<String, u64>,
    total: u64,
    missing: u64,
}

impl TermsFacetBuilder {
    pub fn new<S: Into<String>>(field: S, size: usize) -> Self {
        TermsFacetBuilder {
            field: field.into(),
            size,
            counts: AHashMap::new(),
            total: 0,
            missing: 0,
        }
    }
}

impl FacetBuilder for TermsFacetBuilder {
    fn field(&self) -> &str {
        &self.field
    }

    fn update(&mut self, terms: Option<&[String]>) {
        match terms {
            Some(terms) if !terms.is_empty() => {
                for term in terms {
                    *self.counts.entry(term.clone()).or_insert(0) += 1;
                    self.total += 1;
                }
            }
            _ => self.missing += 1,
        }
    }

    fn result(&self) -> FacetResult {
        let mut terms: Vec<TermFacet> = self
            .counts
            .iter()
            .map(|(term, count)| TermFacet {
                term: term.clone(),
                count: *count,
            })
            .collect();
        terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
        terms.truncate(self.size);

        let shown: u64 = terms.iter().map(|t| t.count).sum();
        FacetResult {
            field: self.field.clone(),
            total: self.total,
            missing: self.missing,
            other: self.total - shown,
            terms,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
struct Bucket<T> {
    name: String,
    min: Option<T>,
    max: Option<T>,
    count: u64,
}

impl<T: PartialOrd + Copy> Bucket<T> {
    fn contains(&self, value: T) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value < max)
    }
}

/// Buckets a numeric field into named `[min, max)` ranges.
#[derive(Debug)]
pub struct NumericFacetBuilder {
    field: String,
    size: usize,
    buckets: Vec<Bucket<f64>>,
    total: u64,
    missing: u64,
}

impl NumericFacetBuilder {
    pub fn new<S: Into<String>>(field: S, size: usize) -> Self {
        NumericFacetBuilder {
            field: field.into(),
            size,
            buckets: Vec::new(),
            total: 0,
            missing: 0,
        }
    }

    pub fn add_range<S: Into<String>>(&mut self, name: S, min: Option<f64>, max: Option<f64>) {
        self.buckets.push(Bucket {
            name: name.into(),
            min,
            max,
            count: 0,
        });
    }
}

impl FacetBuilder for NumericFacetBuilder {
    fn field(&self) -> &str {
        &self.field
    }

    fn update(&mut self, terms: Option<&[String]>) {
        let values: Vec<f64> = terms
            .unwrap_or_default()
            .iter()
            .filter_map(|t| decode_f64(t))
            .collect();
        if values.is_empty() {
            self.missing += 1;
            return;
        }
        for value in values {
            for bucket in &mut self.buckets {
                if bucket.contains(value) {
                    bucket.count += 1;
                    self.total += 1;
                }
            }
        }
    }

    fn result(&self) -> FacetResult {
        let mut ranges: Vec<NumericRangeFacet> = self
            .buckets
            .iter()
            .filter(|b| b.count > 0)
            .map(|b| NumericRangeFacet {
                name: b.name.clone(),
                min: b.min,
                max: b.max,
                count: b.count,
            })
            .collect();
        ranges.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        ranges.truncate(self.size);

        let shown: u64 = ranges.iter().map(|r| r.count).sum();
        FacetResult {
            field: self.field.clone(),
            total: self.total,
            missing: self.missing,
            other: self.total - shown,
            numeric_ranges: ranges,
            ..Default::default()
        }
    }
}

/// Buckets a datetime field into named `[start, end)` ranges.
#[derive(Debug)]
pub struct DateTimeFacetBuilder {
    field: String,
    size: usize,
    buckets: Vec<Bucket<i64>>,
    total: u64,
    missing: u64,
}

impl DateTimeFacetBuilder {
    pub fn new<S: Into<String>>(field: S, size: usize) -> Self {
        DateTimeFacetBuilder {
            field: field.into(),
            size,
            buckets: Vec::new(),
            total: 0,
            missing: 0,
        }
    }

    /// Add a range. Bounds outside the nanosecond range are treated as open.
    pub fn add_range<S: Into<String>>(
        &mut self,
        name: S,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) {
        self.buckets.push(Bucket {
            name: name.into(),
            min: start.and_then(|t| t.timestamp_nanos_opt()),
            max: end.and_then(|t| t.timestamp_nanos_opt()),
            count: 0,
        });
    }
}

impl FacetBuilder for DateTimeFacetBuilder {
    fn field(&self) -> &str {
        &self.field
    }

    fn update(&mut self, terms: Option<&[String]>) {
        let values: Vec<i64> = terms
            .unwrap_or_default()
            .iter()
            .filter_map(|t| decode_i64(t))
            .collect();
        if values.is_empty() {
            self.missing += 1;
            return;
        }
        for value in values {
            for bucket in &mut self.buckets {
                if bucket.contains(value) {
                    bucket.count += 1;
                    self.total += 1;
                }
            }
        }
    }

    fn result(&self) -> FacetResult {
        let format =
            |nanos: Option<i64>| nanos.map(|n| DateTime::from_timestamp_nanos(n).to_rfc3339());
        let mut ranges: Vec<DateRangeFacet> = self
            .buckets
            .iter()
            .filter(|b| b.count > 0)
            .map(|b| DateRangeFacet {
                name: b.name.clone(),
                start: format(b.min),
                end: format(b.max),
                count: b.count,
            })
            .collect();
        ranges.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        ranges.truncate(self.size);

        let shown: u64 = ranges.iter().map(|r| r.count).sum();
        FacetResult {
            field: self.field.clone(),
            total: self.total,
            missing: self.missing,
            other: self.total - shown,
            date_ranges: ranges,
            ..Default::default()
        }
    }
}

/// All facet builders of one search.
#[derive(Debug, Default)]
pub struct FacetsBuilder {
    builders: BTreeMap<String, Box<dyn FacetBuilder>>,
}

impl FacetsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<S: Into<String>>(&mut self, name: S, builder: Box<dyn FacetBuilder>) {
        self.builders.insert(name.into(), builder);
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Account for one hit given its indexed terms keyed by field.
    pub fn update(&mut self, field_terms: &BTreeMap<String, Vec<String>>) {
        for builder in self.builders.values_mut() {
            let terms = field_terms.get(builder.field()).map(Vec::as_slice);
            builder.update(terms);
        }
    }

    pub fn results(&self) -> FacetResults {
        self.builders
            .iter()
            .map(|(name, builder)| (name.clone(), builder.result()))
            .collect()
    }
}
