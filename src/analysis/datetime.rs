//! Named datetime parsers.
//!
//! A [`DateTimeParser`] converts text to a UTC timestamp. The mapping engine
//! tries the index's default parser on every dynamically mapped string; date
//! range queries and date facets resolve a parser per field.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{GlaiveError, Result};

/// Trait for parsers converting text into a timestamp.
pub trait DateTimeParser: Send + Sync + fmt::Debug {
    /// Parse the input into a UTC timestamp.
    fn parse_datetime(&self, input: &str) -> Result<DateTime<Utc>>;

    /// Get the name of this parser.
    fn name(&self) -> &str;
}

/// A parser that accepts RFC 3339 timestamps plus a list of naive layouts
/// interpreted as UTC.
#[derive(Debug, Clone)]
pub struct FlexibleDateTimeParser {
    name: String,
    layouts: Vec<String>,
    accept_rfc3339: bool,
}

impl FlexibleDateTimeParser {
    /// Create a parser from chrono layouts.
    ///
    /// Layouts without a time component (such as `%Y-%m-%d`) parse to
    /// midnight UTC.
    pub fn new<S: Into<String>>(name: S, layouts: Vec<String>, accept_rfc3339: bool) -> Self {
        FlexibleDateTimeParser {
            name: name.into(),
            layouts,
            accept_rfc3339,
        }
    }

    /// RFC 3339 with optional time: `2014-11-01T12:00:00Z`,
    /// `2014-11-01 12:00:00`, `2014-11-01`.
    pub fn datetime_optional() -> Self {
        Self::new(
            "datetime_optional",
            vec![
                "%Y-%m-%dT%H:%M:%S%.f".to_string(),
                "%Y-%m-%d %H:%M:%S%.f".to_string(),
                "%Y-%m-%d".to_string(),
            ],
            true,
        )
    }

    /// Strict RFC 3339 only.
    pub fn rfc3339() -> Self {
        Self::new("rfc3339", Vec::new(), true)
    }
}

impl DateTimeParser for FlexibleDateTimeParser {
    fn parse_datetime(&self, input: &str) -> Result<DateTime<Utc>> {
        if self.accept_rfc3339 {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
                return Ok(parsed.with_timezone(&Utc));
            }
        }
        for layout in &self.layouts {
            if let Ok(naive) = NaiveDateTime::parse_from_str(input, layout) {
                return Ok(Utc.from_utc_datetime(&naive));
            }
            if let Ok(date) = NaiveDate::parse_from_str(input, layout) {
                if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                    return Ok(Utc.from_utc_datetime(&naive));
                }
            }
        }
        Err(GlaiveError::analysis(format!(
            "'{input}' is not a valid date for parser '{}'",
            self.name
        )))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_datetime_optional_layouts() {
        let parser = FlexibleDateTimeParser::datetime_optional();

        let dt = parser.parse_datetime("2014-11-01T12:30:00Z").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2014, 11, 1, 12));

        let dt = parser.parse_datetime("2014-11-01 08:15:00").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (8, 15));

        let dt = parser.parse_datetime("2014-11-01").unwrap();
        assert_eq!((dt.day(), dt.hour()), (1, 0));
    }

    #[test]
    fn test_rejects_plain_text() {
        let parser = FlexibleDateTimeParser::datetime_optional();
        assert!(parser.parse_datetime("hello world").is_err());
        assert!(FlexibleDateTimeParser::rfc3339()
            .parse_datetime("2014-11-01")
            .is_err());
    }
}
