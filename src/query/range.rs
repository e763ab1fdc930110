//! Range queries over numeric and datetime fields.
//!
//! Both compile to a scan of the field's sortable numeric terms. Datetimes are
//! indexed as nanosecond integers, so date bounds are parsed and converted to
//! the same float representation before the scan.

use serde::{Deserialize, Serialize};

use crate::engine::IndexReader;
use crate::error::{GlaiveError, Result};
use crate::mapping::IndexMapping;
use crate::query::QueryNode;
use crate::search::Searcher;
use crate::search::searcher::numeric_range_searcher;
use crate::util::numeric::int64_to_float64;

/// Matches numeric field values between `min` and `max`.
///
/// The lower bound is inclusive and the upper bound exclusive unless stated
/// otherwise. At least one bound is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumericRangeQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusive_min: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusive_max: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl NumericRangeQuery {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        NumericRangeQuery {
            min,
            max,
            ..Default::default()
        }
    }

    pub fn new_inclusive(
        min: Option<f64>,
        max: Option<f64>,
        inclusive_min: bool,
        inclusive_max: bool,
    ) -> Self {
        NumericRangeQuery {
            min,
            max,
            inclusive_min: Some(inclusive_min),
            inclusive_max: Some(inclusive_max),
            ..Default::default()
        }
    }

    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl QueryNode for NumericRangeQuery {
    boost_accessors!();
    field_accessors!();

    fn validate(&self) -> Result<()> {
        if self.min.is_none() && self.max.is_none() {
            return Err(GlaiveError::query(
                "numeric range query must specify min or max",
            ));
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
        numeric_range_searcher(
            reader,
            self.min,
            self.max,
            self.inclusive_min.unwrap_or(true),
            self.inclusive_max.unwrap_or(false),
            field,
            self.boost(),
            explain,
        )
    }
}

/// Matches datetime field values between `start` and `end`.
///
/// Bounds are strings parsed with the named datetime parser, or the field's
/// parser when none is named. An absent or empty bound is open.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRangeQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusive_start: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusive_end: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime_parser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

fn non_empty(bound: &Option<String>) -> Option<&str> {
    bound.as_deref().filter(|s| !s.is_empty())
}

impl DateRangeQuery {
    pub fn new<S: Into<String>>(start: Option<S>, end: Option<S>) -> Self {
        DateRangeQuery {
            start: start.map(Into::into),
            end: end.map(Into::into),
            ..Default::default()
        }
    }

    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_datetime_parser<S: Into<String>>(mut self, parser: S) -> Self {
        self.datetime_parser = Some(parser.into());
        self
    }

    pub fn with_inclusive(mut self, inclusive_start: bool, inclusive_end: bool) -> Self {
        self.inclusive_start = Some(inclusive_start);
        self.inclusive_end = Some(inclusive_end);
        self
    }

    /// Parse the bounds into the numeric form datetimes are indexed under.
    ///
    /// A missing start is negative infinity and a missing end positive
    /// infinity.
    pub fn numeric_bounds(&self, mapping: &IndexMapping) -> Result<(f64, f64)> {
        let field = self.field.as_deref().unwrap_or(&mapping.default_field);
        let parser = match &self.datetime_parser {
            Some(name) => mapping.datetime_parser_named(name).ok_or_else(|| {
                GlaiveError::query(format!("no datetime parser named '{name}' registered"))
            })?,
            None => mapping.datetime_parser_for_path(field)?,
        };

        let convert = |label: &str, input: &str| -> Result<f64> {
            let parsed = parser.parse_datetime(input).map_err(|e| {
                GlaiveError::query(format!("cannot parse {label} '{input}': {e}"))
            })?;
            let nanos = parsed.timestamp_nanos_opt().ok_or_else(|| {
                GlaiveError::query(format!("{label} '{input}' is outside the supported range"))
            })?;
            Ok(int64_to_float64(nanos))
        };

        let min = match non_empty(&self.start) {
            Some(start) => convert("start", start)?,
            None => f64::NEG_INFINITY,
        };
        let max = match non_empty(&self.end) {
            Some(end) => convert("end", end)?,
            None => f64::INFINITY,
        };
        Ok((min, max))
    }
}

impl QueryNode for DateRangeQuery {
    boost_accessors!();
    field_accessors!();

    fn validate(&self) -> Result<()> {
        if non_empty(&self.start).is_none() && non_empty(&self.end).is_none() {
            return Err(GlaiveError::query(
                "date range query must specify start or end",
            ));
        }
        Ok(())
    }

    fn searcher(
        &self,
        reader: &dyn IndexReader,
        mapping: &IndexMapping,
        explain: bool,
    ) -> Result<Box<dyn Searcher>> {
        let (min, max) = self.numeric_bounds(mapping)?;
        let field = self.field.as_deref().unwrap_or(&mapping.default_field);
        numeric_range_searcher(
            reader,
            Some(min),
            Some(max),
            self.inclusive_start.unwrap_or(true),
            self.inclusive_end.unwrap_or(false),
            field,
            self.boost(),
            explain,
        )
    }
}
