//! Model Type Descriptor
//!
//! Describes one persisted entity type: its short name, table name, primary
//! key column and default foreign key column. All default names are computed
//! once at construction time from plain strings; nothing is derived by
//! runtime reflection.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::backends::{DatabaseRow, DatabaseValue};
use crate::error::{ModelError, ModelResult};
use crate::model::instance::Model;

/// Type descriptor for a persisted entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Short type name, e.g. "Post"
    name: String,

    /// Table name, derived from the short name unless set explicitly
    table: String,

    /// Primary key column name (defaults to "id")
    primary_key: String,

    /// Default foreign key column other tables use to reference this type,
    /// e.g. "post_id"
    foreign_key: String,
}

impl ModelDescriptor {
    /// Create a descriptor with default naming for the given short type name
    pub fn new(name: &str) -> ModelResult<Self> {
        if name.trim().is_empty() {
            return Err(ModelError::Configuration(
                "Model descriptor name cannot be empty".to_string(),
            ));
        }

        let lower = name.to_lowercase();
        Ok(Self {
            name: name.to_string(),
            table: pluralize(&lower),
            primary_key: "id".to_string(),
            foreign_key: format!("{}_id", lower),
        })
    }

    /// Override the table name
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    /// Override the primary key column name
    pub fn with_primary_key(mut self, primary_key: &str) -> Self {
        self.primary_key = primary_key.to_string();
        self
    }

    /// Override the default foreign key column name
    pub fn with_foreign_key(mut self, foreign_key: &str) -> Self {
        self.foreign_key = foreign_key.to_string();
        self
    }

    /// Validate the descriptor for consistency.
    ///
    /// Relations call this at construction time so that a misconfigured
    /// descriptor fails fast instead of producing wrong key names that would
    /// silently corrupt pivot mutations.
    pub fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::Configuration(
                "Model descriptor name cannot be empty".to_string(),
            ));
        }
        if self.table.trim().is_empty() {
            return Err(ModelError::Configuration(format!(
                "Model descriptor '{}' has an empty table name",
                self.name
            )));
        }
        if self.primary_key.trim().is_empty() {
            return Err(ModelError::Configuration(format!(
                "Model descriptor '{}' has an empty primary key name",
                self.name
            )));
        }
        if self.foreign_key.trim().is_empty() {
            return Err(ModelError::Configuration(format!(
                "Model descriptor '{}' has an empty foreign key name",
                self.name
            )));
        }
        Ok(())
    }

    /// Short type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Primary key column name
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Default foreign key column name referencing this type
    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    /// Default pivot table name for a many-to-many relation with `other`:
    /// the two short names, lowercased, sorted alphabetically, joined by "_"
    pub fn join_table_with(&self, other: &ModelDescriptor) -> String {
        let mut pair = [self.name.to_lowercase(), other.name.to_lowercase()];
        pair.sort();
        pair.join("_")
    }

    /// Construct a fresh, non-persisted instance of this type
    pub fn new_instance(self: &Arc<Self>) -> Model {
        Model::new(Arc::clone(self))
    }

    /// Hydrate an instance from a fetched row; marks the instance as existing
    pub fn hydrate_row(self: &Arc<Self>, row: &dyn DatabaseRow) -> ModelResult<Model> {
        let mut attributes = IndexMap::new();
        for name in row.column_names() {
            let value = row.get_by_name(&name)?;
            attributes.insert(name, value);
        }
        Ok(Model::hydrated(Arc::clone(self), attributes))
    }

    /// Hydrate an instance from an attribute map; marks the instance as existing
    pub fn hydrate(self: &Arc<Self>, attributes: IndexMap<String, DatabaseValue>) -> Model {
        Model::hydrated(Arc::clone(self), attributes)
    }
}

/// Naive English pluralization for derived table names
fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        let penultimate = stem.chars().last();
        if !matches!(penultimate, Some('a' | 'e' | 'i' | 'o' | 'u')) {
            return format!("{}ies", stem);
        }
    }

    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{}es", word);
    }

    format!("{}s", word)
}
