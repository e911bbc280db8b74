//! Core Database Backend Traits
//!
//! Defines the traits and value types the engine uses to talk to a database.
//! The engine never resolves a connection from ambient state: every operation
//! receives a `&dyn DatabasePool` from the caller.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::OrmResult;

/// Abstract database connection pool trait
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Execute a statement and return the affected row count
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64>;

    /// Execute a query and return all result rows
    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue])
        -> OrmResult<Vec<Box<dyn DatabaseRow>>>;

    /// Execute a query and return the first result row
    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue])
        -> OrmResult<Option<Box<dyn DatabaseRow>>>;
}

/// Abstract database row trait
pub trait DatabaseRow: Send + Sync {
    /// Get a column value by index
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue>;

    /// Get a column value by name (including aliased names from join queries)
    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue>;

    /// Get column count
    fn column_count(&self) -> usize;

    /// Get column names in result order
    fn column_names(&self) -> Vec<String>;

    /// Convert row to a name/value map
    fn to_map(&self) -> OrmResult<HashMap<String, DatabaseValue>> {
        let mut map = HashMap::new();
        for name in self.column_names() {
            map.insert(name.clone(), self.get_by_name(&name)?);
        }
        Ok(map)
    }

    /// Convert row to a JSON object
    fn to_json(&self) -> OrmResult<JsonValue> {
        let mut map = serde_json::Map::new();
        for name in self.column_names() {
            map.insert(name.clone(), self.get_by_name(&name)?.to_json());
        }
        Ok(JsonValue::Object(map))
    }
}

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    DateTime(chrono::DateTime<chrono::Utc>),
    Date(chrono::NaiveDate),
    Time(chrono::NaiveTime),
    Json(JsonValue),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Int32(i) => JsonValue::Number(serde_json::Number::from(*i)),
            DatabaseValue::Int64(i) => JsonValue::Number(serde_json::Number::from(*i)),
            DatabaseValue::Float32(f) => serde_json::Number::from_f64(*f as f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::String(s) => JsonValue::String(s.clone()),
            DatabaseValue::Bytes(b) => JsonValue::Array(
                b.iter()
                    .map(|&x| JsonValue::Number(serde_json::Number::from(x)))
                    .collect(),
            ),
            DatabaseValue::Uuid(u) => JsonValue::String(u.to_string()),
            DatabaseValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
            DatabaseValue::Date(d) => JsonValue::String(d.to_string()),
            DatabaseValue::Time(t) => JsonValue::String(t.to_string()),
            DatabaseValue::Json(j) => j.clone(),
        }
    }

    /// Stable string key used when grouping rows into dictionaries.
    ///
    /// Numeric widths collapse to the same key so an `Int32(1)` owner key
    /// matches an `Int64(1)` column value.
    pub fn as_key(&self) -> String {
        match self {
            DatabaseValue::String(s) => s.clone(),
            DatabaseValue::Uuid(u) => u.to_string(),
            DatabaseValue::Int32(i) => i.to_string(),
            DatabaseValue::Int64(i) => i.to_string(),
            other => other.to_json().to_string(),
        }
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Int32(value)
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int64(value)
    }
}

impl From<f32> for DatabaseValue {
    fn from(value: f32) -> Self {
        DatabaseValue::Float32(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float64(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(value: Vec<u8>) -> Self {
        DatabaseValue::Bytes(value)
    }
}

impl From<uuid::Uuid> for DatabaseValue {
    fn from(value: uuid::Uuid) -> Self {
        DatabaseValue::Uuid(value)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for DatabaseValue {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        DatabaseValue::DateTime(value)
    }
}

impl From<chrono::NaiveDate> for DatabaseValue {
    fn from(value: chrono::NaiveDate) -> Self {
        DatabaseValue::Date(value)
    }
}

impl From<chrono::NaiveTime> for DatabaseValue {
    fn from(value: chrono::NaiveTime) -> Self {
        DatabaseValue::Time(value)
    }
}

impl From<JsonValue> for DatabaseValue {
    fn from(value: JsonValue) -> Self {
        DatabaseValue::Json(value)
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_null_check() {
        assert!(DatabaseValue::Null.is_null());
        assert!(!DatabaseValue::Int64(0).is_null());
    }

    #[test]
    fn test_numeric_widths_share_keys() {
        assert_eq!(DatabaseValue::Int32(7).as_key(), DatabaseValue::Int64(7).as_key());
    }

    #[test]
    fn test_string_key_is_raw() {
        assert_eq!(DatabaseValue::String("abc".into()).as_key(), "abc");
    }

    #[test]
    fn test_option_conversion() {
        let none: Option<i64> = None;
        assert_eq!(DatabaseValue::from(none), DatabaseValue::Null);
        assert_eq!(DatabaseValue::from(Some(3i64)), DatabaseValue::Int64(3));
    }
}
