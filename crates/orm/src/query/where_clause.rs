//! Where Clause Construction
//!
//! Constraint methods for `QueryBuilder`. Clauses are kept in call order;
//! the first clause renders without a connector, later ones render with the
//! connector they were added with.

use crate::backends::DatabaseValue;
use crate::query::builder::QueryBuilder;
use crate::query::types::{QueryOperator, WhereClause, WhereConnector};

impl QueryBuilder {
    fn push_where(mut self, clause: WhereClause) -> Self {
        self.where_clauses.push(clause);
        self
    }

    /// Add an AND-connected basic constraint with an explicit operator string
    pub fn where_condition<T: Into<DatabaseValue>>(
        self,
        column: &str,
        operator: &str,
        value: T,
    ) -> Self {
        self.push_where(WhereClause::Basic {
            column: column.to_string(),
            operator: QueryOperator::parse(operator),
            value: value.into(),
            connector: WhereConnector::And,
        })
    }

    /// Add an AND-connected equality constraint
    pub fn where_eq<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.where_condition(column, "=", value)
    }

    /// Add an OR-connected basic constraint with an explicit operator string
    pub fn or_where<T: Into<DatabaseValue>>(self, column: &str, operator: &str, value: T) -> Self {
        self.push_where(WhereClause::Basic {
            column: column.to_string(),
            operator: QueryOperator::parse(operator),
            value: value.into(),
            connector: WhereConnector::Or,
        })
    }

    /// Add an OR-connected equality constraint
    pub fn or_where_eq<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.or_where(column, "=", value)
    }

    /// Add an AND-connected membership constraint.
    ///
    /// An empty list renders as an always-false predicate.
    pub fn where_in<T: Into<DatabaseValue>>(self, column: &str, values: Vec<T>) -> Self {
        self.push_where(WhereClause::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            connector: WhereConnector::And,
        })
    }

    /// Add an AND-connected exclusion constraint.
    ///
    /// An empty list renders as an always-true predicate.
    pub fn where_not_in<T: Into<DatabaseValue>>(self, column: &str, values: Vec<T>) -> Self {
        self.push_where(WhereClause::NotIn {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            connector: WhereConnector::And,
        })
    }

    /// Add an AND-connected IS NULL constraint
    pub fn where_null(self, column: &str) -> Self {
        self.push_where(WhereClause::Null {
            column: column.to_string(),
            connector: WhereConnector::And,
        })
    }

    /// Add an AND-connected IS NOT NULL constraint
    pub fn where_not_null(self, column: &str) -> Self {
        self.push_where(WhereClause::NotNull {
            column: column.to_string(),
            connector: WhereConnector::And,
        })
    }

    /// Constrain to an empty result set without touching the database schema.
    ///
    /// A column can never be both null and non-null, so the pair is
    /// unsatisfiable and carries no bindings.
    pub fn where_nothing(self, column: &str) -> Self {
        self.where_null(column).where_not_null(column)
    }
}
