//! Query Builder - Fluent statement construction
//!
//! One builder type covers SELECT, INSERT, UPDATE and DELETE. Constraints
//! accumulate in call order and render in the same order, so placeholder
//! positions always line up with the binding list.

use crate::query::types::{JoinClause, OrderDirection, QueryType, SetClause, WhereClause};

/// Fluent SQL statement builder with `?` placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    pub(crate) query_type: QueryType,
    pub(crate) table: String,
    pub(crate) columns: Vec<String>,
    pub(crate) set_clauses: Vec<SetClause>,
    pub(crate) where_clauses: Vec<WhereClause>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) orders: Vec<(String, OrderDirection)>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl QueryBuilder {
    fn new(query_type: QueryType, table: &str) -> Self {
        Self {
            query_type,
            table: table.to_string(),
            columns: Vec::new(),
            set_clauses: Vec::new(),
            where_clauses: Vec::new(),
            joins: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Start a SELECT query against `table`
    pub fn table(table: &str) -> Self {
        Self::new(QueryType::Select, table)
    }

    /// Start an INSERT statement into `table`
    pub fn insert_into(table: &str) -> Self {
        Self::new(QueryType::Insert, table)
    }

    /// Start an UPDATE statement against `table`
    pub fn update(table: &str) -> Self {
        Self::new(QueryType::Update, table)
    }

    /// Start a DELETE statement against `table`
    pub fn delete_from(table: &str) -> Self {
        Self::new(QueryType::Delete, table)
    }

    /// The target table name
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Restrict the selected columns (defaults to `*`)
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add one more selected column
    pub fn add_select(mut self, column: &str) -> Self {
        self.columns.push(column.to_string());
        self
    }

    /// Assign a column value for INSERT or UPDATE
    pub fn set<T: Into<crate::backends::DatabaseValue>>(mut self, column: &str, value: T) -> Self {
        self.set_clauses.push(SetClause {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Add an inner join on `first = second`
    pub fn join(mut self, table: &str, first: &str, second: &str) -> Self {
        self.joins.push(JoinClause {
            table: table.to_string(),
            first: first.to_string(),
            second: second.to_string(),
        });
        self
    }

    /// Order ascending by `column`
    pub fn order_by(mut self, column: &str) -> Self {
        self.orders.push((column.to_string(), OrderDirection::Asc));
        self
    }

    /// Order descending by `column`
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.orders.push((column.to_string(), OrderDirection::Desc));
        self
    }

    /// Cap the number of returned rows
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Alias for `limit`
    pub fn take(self, limit: u64) -> Self {
        self.limit(limit)
    }

    /// Skip the first `offset` rows
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Alias for `offset`
    pub fn skip(self, offset: u64) -> Self {
        self.offset(offset)
    }

    /// The accumulated where clauses, in call order
    pub fn where_clauses(&self) -> &[WhereClause] {
        &self.where_clauses
    }
}
