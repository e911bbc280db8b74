//! Error types for the ORM system
//!
//! Provides error handling for database operations, query building,
//! and relationship resolution.

use std::fmt;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone)]
pub enum ModelError {
    /// Database connection or query error
    Database(String),
    /// Record not found in database
    NotFound(String),
    /// Query building error
    Query(String),
    /// Relationship resolution failed
    Relationship(String),
    /// Configuration error
    Configuration(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// Primary key is missing on an instance that requires one
    MissingPrimaryKey,
    /// Attempt to overwrite an immutable key
    InvalidKey(String),
    /// Column not present in a fetched row
    ColumnNotFound(String),
    /// Connection pool error
    Connection(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "Database error: {}", msg),
            ModelError::NotFound(table) => write!(f, "Record not found in table '{}'", table),
            ModelError::Query(msg) => write!(f, "Query error: {}", msg),
            ModelError::Relationship(msg) => write!(f, "Relationship error: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ModelError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ModelError::MissingPrimaryKey => write!(f, "Primary key is missing or invalid"),
            ModelError::InvalidKey(msg) => write!(f, "Invalid key error: {}", msg),
            ModelError::ColumnNotFound(name) => write!(f, "Column '{}' not found in row", name),
            ModelError::Connection(msg) => write!(f, "Connection error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

// Convert from anyhow errors
impl From<anyhow::Error> for ModelError {
    fn from(err: anyhow::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

/// Error types for relationship configuration
#[derive(Debug, Clone)]
pub enum RelationshipError {
    /// Invalid relationship configuration detected at construction time
    InvalidConfiguration(String),
    /// Relationship not found on a model instance
    NotFound(String),
}

impl fmt::Display for RelationshipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipError::InvalidConfiguration(msg) => {
                write!(f, "Invalid relationship configuration: {}", msg)
            }
            RelationshipError::NotFound(msg) => write!(f, "Relationship not found: {}", msg),
        }
    }
}

impl std::error::Error for RelationshipError {}

impl From<RelationshipError> for ModelError {
    fn from(err: RelationshipError) -> Self {
        ModelError::Relationship(err.to_string())
    }
}
