//! Fake Backend - Scripted in-memory pool for tests
//!
//! `FakePool` records every executed statement with its bindings and serves
//! fetch queries from a FIFO queue of scripted row sets, so tests can assert
//! query counts, SQL shape and binding order without a running database.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::backends::{DatabasePool, DatabaseRow, DatabaseValue};
use crate::error::{OrmError, OrmResult};

/// One in-memory row
#[derive(Debug, Clone, PartialEq)]
pub struct FakeRow {
    values: IndexMap<String, DatabaseValue>,
}

impl FakeRow {
    pub fn new<I, K, V>(columns: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<DatabaseValue>,
    {
        Self {
            values: columns
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.into()))
                .collect(),
        }
    }
}

impl DatabaseRow for FakeRow {
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue> {
        self.values
            .get_index(index)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| OrmError::ColumnNotFound(format!("index {}", index)))
    }

    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| OrmError::ColumnNotFound(name.to_string()))
    }

    fn column_count(&self) -> usize {
        self.values.len()
    }

    fn column_names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// One recorded statement
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub sql: String,
    pub bindings: Vec<DatabaseValue>,
}

#[derive(Default)]
struct FakeState {
    queries: Vec<RecordedQuery>,
    fetch_results: VecDeque<Vec<FakeRow>>,
    execute_results: VecDeque<u64>,
}

/// Scripted in-memory pool
#[derive(Default)]
pub struct FakePool {
    state: Mutex<FakeState>,
}

impl FakePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the row set served by the next fetch query
    pub fn push_rows(&self, rows: Vec<FakeRow>) {
        if let Ok(mut state) = self.state.lock() {
            state.fetch_results.push_back(rows);
        }
    }

    /// Queue the affected-row count returned by the next execute call.
    ///
    /// Without a queued count, execute calls report one affected row.
    pub fn push_affected(&self, affected: u64) {
        if let Ok(mut state) = self.state.lock() {
            state.execute_results.push_back(affected);
        }
    }

    /// Every statement run so far, in execution order
    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.state
            .lock()
            .map(|state| state.queries.clone())
            .unwrap_or_default()
    }

    /// Number of statements run so far
    pub fn query_count(&self) -> usize {
        self.queries().len()
    }

    /// Drop all recorded statements, keeping queued results
    pub fn clear_queries(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.queries.clear();
        }
    }

    fn record(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| OrmError::Connection("Fake pool state poisoned".to_string()))?;
        state.queries.push(RecordedQuery {
            sql: sql.to_string(),
            bindings: params.to_vec(),
        });
        Ok(())
    }

    fn next_rows(&self) -> Vec<FakeRow> {
        self.state
            .lock()
            .ok()
            .and_then(|mut state| state.fetch_results.pop_front())
            .unwrap_or_default()
    }

    fn next_affected(&self) -> u64 {
        self.state
            .lock()
            .ok()
            .and_then(|mut state| state.execute_results.pop_front())
            .unwrap_or(1)
    }
}

#[async_trait]
impl DatabasePool for FakePool {
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        self.record(sql, params)?;
        Ok(self.next_affected())
    }

    async fn fetch_all(
        &self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        self.record(sql, params)?;
        Ok(self
            .next_rows()
            .into_iter()
            .map(|row| Box::new(row) as Box<dyn DatabaseRow>)
            .collect())
    }

    async fn fetch_optional(
        &self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        self.record(sql, params)?;
        Ok(self
            .next_rows()
            .into_iter()
            .next()
            .map(|row| Box::new(row) as Box<dyn DatabaseRow>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_consumes_queued_rows_in_order() {
        let pool = FakePool::new();
        pool.push_rows(vec![FakeRow::new([("id", 1i64)])]);
        pool.push_rows(vec![]);

        let first = pool.fetch_all("SELECT * FROM posts", &[]).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].get_by_name("id").unwrap(), DatabaseValue::Int64(1));

        let second = pool.fetch_all("SELECT * FROM posts", &[]).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_queries_are_recorded_with_bindings() {
        let pool = FakePool::new();
        pool.execute("DELETE FROM posts WHERE id = ?", &[DatabaseValue::Int64(3)])
            .await
            .unwrap();

        let queries = pool.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].sql, "DELETE FROM posts WHERE id = ?");
        assert_eq!(queries[0].bindings, vec![DatabaseValue::Int64(3)]);
    }

    #[test]
    fn test_row_to_json_object() {
        let row = FakeRow::new([
            ("id", DatabaseValue::Int64(1)),
            ("name", DatabaseValue::String("admin".to_string())),
        ]);

        let json = row.to_json().unwrap();
        assert_eq!(json["id"], serde_json::json!(1));
        assert_eq!(json["name"], serde_json::json!("admin"));
    }

    #[tokio::test]
    async fn test_missing_column_is_an_error() {
        let row = FakeRow::new([("id", 1i64)]);
        assert!(row.get_by_name("missing").is_err());
        assert!(row.get_by_index(5).is_err());
    }
}
