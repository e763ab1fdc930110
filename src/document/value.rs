//! Tagged value tree accepted by the mapping engine.
//!
//! [`Value`] is the explicit sum type the mapping walker dispatches on. It can
//! be built by hand, converted from `serde_json::Value`, or adapted from any
//! `Serialize` type with [`Value::from_serialize`]. In the latter case struct
//! field names become object keys, `#[serde(rename = "...")]` acts as the
//! field's tag name and `#[serde(skip)]` removes a field entirely.
//!
//! # Examples
//!
//! ```
//! use glaive::document::Value;
//!
//! let value = Value::object([
//!     ("name", Value::from("marty")),
//!     ("age", Value::from(19)),
//!     ("tags", Value::from(vec!["a", "b"])),
//! ]);
//!
//! assert_eq!(value.get("name"), Some(&Value::from("marty")));
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent or null value; never indexed.
    Null,
    /// Boolean value; not indexed by the mapping engine.
    Bool(bool),
    /// Any number, integer or float.
    Number(f64),
    /// A string.
    String(String),
    /// A point in time. Always mapped as a datetime, never descended into.
    Time(DateTime<Utc>),
    /// An ordered list; every element is mapped at the list's own path.
    List(Vec<Value>),
    /// An object with string keys.
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Build an object from key/value pairs.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Adapt any serializable value.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Value::from(serde_json::to_value(value)?))
    }

    /// Look up a key when this value is an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Follow a sequence of object keys.
    pub fn lookup_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |current, segment| current.get(segment.as_ref()))
    }

    /// Get the string content if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check whether this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Time(value)
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Number(value as f64)
                }
            }
        )*
    };
}

impl_from_number!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Person {
        #[serde(rename = "fullName")]
        name: String,
        #[serde(skip)]
        #[allow(dead_code)]
        secret: String,
        age: u32,
        nickname: Option<String>,
    }

    #[test]
    fn test_from_serialize_honours_rename_and_skip() {
        let person = Person {
            name: "Marty McFly".to_string(),
            secret: "hidden".to_string(),
            age: 17,
            nickname: None,
        };
        let value = Value::from_serialize(&person).unwrap();

        assert_eq!(value.get("fullName"), Some(&Value::from("Marty McFly")));
        assert_eq!(value.get("age"), Some(&Value::Number(17.0)));
        assert_eq!(value.get("nickname"), Some(&Value::Null));
        assert!(value.get("secret").is_none());
        assert!(value.get("name").is_none());
    }

    #[test]
    fn test_lookup_path() {
        let value = Value::object([("a", Value::object([("b", Value::from("deep"))]))]);
        assert_eq!(value.lookup_path(&["a", "b"]), Some(&Value::from("deep")));
        assert_eq!(value.lookup_path(&["a", "c"]), None);
    }
}
