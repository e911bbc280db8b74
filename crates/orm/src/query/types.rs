//! Query Builder Types - Core types and enums for query building

use std::fmt;

use crate::backends::DatabaseValue;

/// Comparison operators for basic where clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    NotLike,
}

impl QueryOperator {
    /// Parse a SQL operator string; unknown operators fall back to equality
    pub fn parse(operator: &str) -> Self {
        match operator {
            "=" => QueryOperator::Equal,
            "!=" | "<>" => QueryOperator::NotEqual,
            ">" => QueryOperator::GreaterThan,
            ">=" => QueryOperator::GreaterThanOrEqual,
            "<" => QueryOperator::LessThan,
            "<=" => QueryOperator::LessThanOrEqual,
            "LIKE" | "like" => QueryOperator::Like,
            "NOT LIKE" | "not like" => QueryOperator::NotLike,
            _ => QueryOperator::Equal,
        }
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOperator::Equal => write!(f, "="),
            QueryOperator::NotEqual => write!(f, "!="),
            QueryOperator::GreaterThan => write!(f, ">"),
            QueryOperator::GreaterThanOrEqual => write!(f, ">="),
            QueryOperator::LessThan => write!(f, "<"),
            QueryOperator::LessThanOrEqual => write!(f, "<="),
            QueryOperator::Like => write!(f, "LIKE"),
            QueryOperator::NotLike => write!(f, "NOT LIKE"),
        }
    }
}

/// Boolean connector joining a where clause to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereConnector {
    And,
    Or,
}

impl fmt::Display for WhereConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhereConnector::And => write!(f, "AND"),
            WhereConnector::Or => write!(f, "OR"),
        }
    }
}

/// A single where clause, tagged by kind.
///
/// Clauses join sequentially: the first clause carries no leading connector,
/// every later clause is preceded by its own. There is no grouping.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    Basic {
        column: String,
        operator: QueryOperator,
        value: DatabaseValue,
        connector: WhereConnector,
    },
    In {
        column: String,
        values: Vec<DatabaseValue>,
        connector: WhereConnector,
    },
    NotIn {
        column: String,
        values: Vec<DatabaseValue>,
        connector: WhereConnector,
    },
    Null {
        column: String,
        connector: WhereConnector,
    },
    NotNull {
        column: String,
        connector: WhereConnector,
    },
}

impl WhereClause {
    /// The connector joining this clause to the previous one
    pub fn connector(&self) -> WhereConnector {
        match self {
            WhereClause::Basic { connector, .. }
            | WhereClause::In { connector, .. }
            | WhereClause::NotIn { connector, .. }
            | WhereClause::Null { connector, .. }
            | WhereClause::NotNull { connector, .. } => *connector,
        }
    }

    /// The constrained column
    pub fn column(&self) -> &str {
        match self {
            WhereClause::Basic { column, .. }
            | WhereClause::In { column, .. }
            | WhereClause::NotIn { column, .. }
            | WhereClause::Null { column, .. }
            | WhereClause::NotNull { column, .. } => column,
        }
    }
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Statement kinds supported by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

/// Inner join clause used by the many-to-many relation queries
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table: String,
    pub first: String,
    pub second: String,
}

/// Column assignment for INSERT and UPDATE statements
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    pub column: String,
    pub value: DatabaseValue,
}
