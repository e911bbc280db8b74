//! PostgreSQL Backend Implementation
//!
//! PostgreSQL implementation of the database pool traits using sqlx as the
//! underlying driver. The engine renders `?` placeholders; this backend
//! rewrites them to `$n` at bind time.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Column, Pool, Postgres, Row as SqlxRow, TypeInfo};

use super::core::{DatabasePool, DatabaseRow, DatabaseValue};
use crate::error::{OrmError, OrmResult};

/// PostgreSQL connection pool implementation
pub struct PostgresPool {
    pool: Pool<Postgres>,
}

impl PostgresPool {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Connect to a PostgreSQL database and build a pool
    pub async fn connect(database_url: &str, max_connections: u32) -> OrmResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| OrmError::Connection(format!("Failed to create PostgreSQL pool: {}", e)))?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl DatabasePool for PostgresPool {
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        let sql = rewrite_placeholders(sql);
        let mut query = sqlx::query(&sql);

        for param in params {
            query = bind_database_value(query, param);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| OrmError::Query(format!("Query execution failed: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn fetch_all(
        &self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        let sql = rewrite_placeholders(sql);
        let mut query = sqlx::query(&sql);

        for param in params {
            query = bind_database_value(query, param);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| OrmError::Query(format!("Query fetch failed: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|row| Box::new(PostgresRow::new(row)) as Box<dyn DatabaseRow>)
            .collect())
    }

    async fn fetch_optional(
        &self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        let sql = rewrite_placeholders(sql);
        let mut query = sqlx::query(&sql);

        for param in params {
            query = bind_database_value(query, param);
        }

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| OrmError::Query(format!("Query fetch failed: {}", e)))?;

        Ok(row.map(|r| Box::new(PostgresRow::new(r)) as Box<dyn DatabaseRow>))
    }
}

/// PostgreSQL row implementation
pub struct PostgresRow {
    row: sqlx::postgres::PgRow,
}

impl PostgresRow {
    pub fn new(row: sqlx::postgres::PgRow) -> Self {
        Self { row }
    }
}

impl DatabaseRow for PostgresRow {
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue> {
        postgres_value_to_database_value(&self.row, index)
    }

    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        let columns = self.row.columns();
        let index = columns
            .iter()
            .position(|col| col.name() == name)
            .ok_or_else(|| OrmError::ColumnNotFound(name.to_string()))?;

        postgres_value_to_database_value(&self.row, index)
    }

    fn column_count(&self) -> usize {
        self.row.len()
    }

    fn column_names(&self) -> Vec<String> {
        self.row
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect()
    }
}

/// Rewrite `?` placeholders to PostgreSQL's `$n` form.
///
/// Skips question marks inside single-quoted string literals.
fn rewrite_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0usize;
    let mut in_string = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                out.push(ch);
            }
            '?' if !in_string => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            }
            _ => out.push(ch),
        }
    }

    out
}

/// Bind a DatabaseValue to a sqlx query
fn bind_database_value<'a>(
    query: sqlx::query::Query<'a, Postgres, sqlx::postgres::PgArguments>,
    value: &DatabaseValue,
) -> sqlx::query::Query<'a, Postgres, sqlx::postgres::PgArguments> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Int32(i) => query.bind(*i),
        DatabaseValue::Int64(i) => query.bind(*i),
        DatabaseValue::Float32(f) => query.bind(*f),
        DatabaseValue::Float64(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
        DatabaseValue::Bytes(b) => query.bind(b.clone()),
        DatabaseValue::Uuid(u) => query.bind(*u),
        DatabaseValue::DateTime(dt) => query.bind(*dt),
        DatabaseValue::Date(d) => query.bind(*d),
        DatabaseValue::Time(t) => query.bind(*t),
        DatabaseValue::Json(j) => query.bind(j.clone()),
    }
}

/// Convert a PostgreSQL column value to DatabaseValue
fn postgres_value_to_database_value(
    row: &sqlx::postgres::PgRow,
    index: usize,
) -> OrmResult<DatabaseValue> {
    let column = &row.columns()[index];
    let type_name = column.type_info().name();

    macro_rules! decode {
        ($ty:ty, $variant:expr) => {{
            let value: Option<$ty> = row
                .try_get(index)
                .map_err(|e| OrmError::Query(format!("Failed to decode column {}: {}", index, e)))?;
            Ok(value.map($variant).unwrap_or(DatabaseValue::Null))
        }};
    }

    match type_name {
        "BOOL" => decode!(bool, DatabaseValue::Bool),
        "INT2" => decode!(i16, |v: i16| DatabaseValue::Int32(v as i32)),
        "INT4" => decode!(i32, DatabaseValue::Int32),
        "INT8" => decode!(i64, DatabaseValue::Int64),
        "FLOAT4" => decode!(f32, DatabaseValue::Float32),
        "FLOAT8" => decode!(f64, DatabaseValue::Float64),
        "TEXT" | "VARCHAR" | "CHAR" | "NAME" => decode!(String, DatabaseValue::String),
        "BYTEA" => decode!(Vec<u8>, DatabaseValue::Bytes),
        "UUID" => decode!(uuid::Uuid, DatabaseValue::Uuid),
        "TIMESTAMPTZ" | "TIMESTAMP" => {
            decode!(chrono::DateTime<chrono::Utc>, DatabaseValue::DateTime)
        }
        "DATE" => decode!(chrono::NaiveDate, DatabaseValue::Date),
        "TIME" => decode!(chrono::NaiveTime, DatabaseValue::Time),
        "JSON" | "JSONB" => decode!(JsonValue, DatabaseValue::Json),
        _ => decode!(String, DatabaseValue::String),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_rewrite() {
        assert_eq!(
            rewrite_placeholders("SELECT * FROM users WHERE id = ? AND name = ?"),
            "SELECT * FROM users WHERE id = $1 AND name = $2"
        );
    }

    #[test]
    fn test_placeholder_rewrite_skips_string_literals() {
        assert_eq!(
            rewrite_placeholders("SELECT * FROM users WHERE name = '?' AND id = ?"),
            "SELECT * FROM users WHERE name = '?' AND id = $1"
        );
    }

    #[test]
    fn test_placeholder_rewrite_no_params() {
        assert_eq!(rewrite_placeholders("SELECT 1"), "SELECT 1");
    }
}
