//! Query System - Fluent builder, SQL generation and execution
//!
//! - `types`: clause and operator enums
//! - `builder`: the fluent `QueryBuilder` state
//! - `where_clause`: constraint methods
//! - `sql_generation`: rendering with `?` placeholders and ordered bindings
//! - `dml`: INSERT / UPDATE / DELETE rendering
//! - `execution`: async execution and hydration

pub mod builder;
pub mod dml;
pub mod execution;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use types::{
    JoinClause, OrderDirection, QueryOperator, QueryType, SetClause, WhereClause, WhereConnector,
};
