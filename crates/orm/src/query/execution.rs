//! Query Execution
//!
//! Runs a rendered builder against a `DatabasePool` and hydrates the result
//! rows into model instances through a type descriptor.

use std::sync::Arc;

use crate::backends::{DatabasePool, DatabaseRow, DatabaseValue};
use crate::collection::Collection;
use crate::error::{ModelError, ModelResult};
use crate::model::{Model, ModelDescriptor};
use crate::query::builder::QueryBuilder;

impl QueryBuilder {
    /// Fetch all matching rows and hydrate them in database order
    pub async fn get(
        &self,
        pool: &dyn DatabasePool,
        descriptor: &Arc<ModelDescriptor>,
    ) -> ModelResult<Collection> {
        let rows = self.fetch_rows(pool).await?;
        let mut collection = Collection::new();
        for row in &rows {
            collection.push(descriptor.hydrate_row(row.as_ref())?);
        }
        Ok(collection)
    }

    /// Fetch the first matching row, if any
    pub async fn first(
        &self,
        pool: &dyn DatabasePool,
        descriptor: &Arc<ModelDescriptor>,
    ) -> ModelResult<Option<Model>> {
        let limited = self.clone().limit(1);
        let (sql, bindings) = limited.to_sql_with_bindings(false);
        tracing::debug!(sql = %sql, "executing first query");

        match pool.fetch_optional(&sql, &bindings).await? {
            Some(row) => Ok(Some(descriptor.hydrate_row(row.as_ref())?)),
            None => Ok(None),
        }
    }

    /// Fetch one instance by primary key
    pub async fn find<T: Into<DatabaseValue>>(
        pool: &dyn DatabasePool,
        descriptor: &Arc<ModelDescriptor>,
        id: T,
    ) -> ModelResult<Option<Model>> {
        QueryBuilder::table(descriptor.table())
            .where_eq(descriptor.primary_key(), id)
            .first(pool, descriptor)
            .await
    }

    /// Fetch one column of the first matching row, if any
    pub async fn value(
        &self,
        pool: &dyn DatabasePool,
        column: &str,
    ) -> ModelResult<Option<DatabaseValue>> {
        let limited = self.clone().limit(1);
        let (sql, bindings) = limited.to_sql_with_bindings(false);

        match pool.fetch_optional(&sql, &bindings).await? {
            Some(row) => Ok(Some(row.get_by_name(column)?)),
            None => Ok(None),
        }
    }

    /// Count the matching rows
    pub async fn count(&self, pool: &dyn DatabasePool) -> ModelResult<i64> {
        let (sql, bindings) = self.to_sql_with_bindings(true);
        tracing::debug!(sql = %sql, "executing count query");

        let row = pool
            .fetch_optional(&sql, &bindings)
            .await?
            .ok_or_else(|| ModelError::Query("Count query returned no row".to_string()))?;

        match row.get_by_name("count")? {
            DatabaseValue::Int64(count) => Ok(count),
            DatabaseValue::Int32(count) => Ok(count as i64),
            other => Err(ModelError::Query(format!(
                "Count query returned a non-integer value: {:?}",
                other
            ))),
        }
    }

    /// True when at least one row matches
    pub async fn exists(&self, pool: &dyn DatabasePool) -> ModelResult<bool> {
        Ok(self.count(pool).await? > 0)
    }

    /// Execute a DML statement, returning the affected row count
    pub async fn execute(&self, pool: &dyn DatabasePool) -> ModelResult<u64> {
        let (sql, bindings) = self.to_sql_with_bindings(false);
        tracing::debug!(sql = %sql, "executing statement");
        pool.execute(&sql, &bindings).await
    }

    /// Fetch raw rows without hydrating through a descriptor.
    ///
    /// Pivot tables have no model type of their own; the attachment
    /// synchronizer reads them through this.
    pub async fn fetch_rows(
        &self,
        pool: &dyn DatabasePool,
    ) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        let (sql, bindings) = self.to_sql_with_bindings(false);
        tracing::debug!(sql = %sql, bindings = bindings.len(), "executing select query");
        pool.fetch_all(&sql, &bindings).await
    }
}
