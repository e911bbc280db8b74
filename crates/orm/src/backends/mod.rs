//! Database Backend Abstraction
//!
//! The engine talks to the database exclusively through the traits in
//! `core`; `postgres` provides the sqlx-backed production implementation.

pub mod core;
pub mod postgres;

pub use self::core::{DatabasePool, DatabaseRow, DatabaseValue};
pub use self::postgres::{PostgresPool, PostgresRow};
