//! Model Instance
//!
//! A dynamically-typed persisted row: an ordered attribute bag plus an
//! existence flag and a side-table of already-resolved relations. Pivot
//! attributes from many-to-many joins live in a separate side record and are
//! never merged into the attribute bag.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::backends::{DatabasePool, DatabaseValue};
use crate::collection::Collection;
use crate::error::{ModelError, ModelResult};
use crate::model::descriptor::ModelDescriptor;
use crate::query::QueryBuilder;
use crate::relationships::Relation;

/// A resolved relation value stored on a model instance
#[derive(Debug, Clone, PartialEq)]
pub enum RelationValue {
    /// To-one relation: a single related instance or none
    One(Option<Model>),
    /// To-many relation: an ordered collection, possibly empty
    Many(Collection),
}

impl RelationValue {
    /// The single related instance, if this is a to-one value
    pub fn as_one(&self) -> Option<&Model> {
        match self {
            RelationValue::One(value) => value.as_ref(),
            RelationValue::Many(_) => None,
        }
    }

    /// The related collection, if this is a to-many value
    pub fn as_many(&self) -> Option<&Collection> {
        match self {
            RelationValue::One(_) => None,
            RelationValue::Many(collection) => Some(collection),
        }
    }
}

/// One persisted (or to-be-persisted) row of a model type
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    descriptor: Arc<ModelDescriptor>,
    attributes: IndexMap<String, DatabaseValue>,
    exists: bool,
    relations: HashMap<String, RelationValue>,
    pivot: Option<IndexMap<String, DatabaseValue>>,
}

impl Model {
    /// Construct an empty, non-persisted instance
    pub fn new(descriptor: Arc<ModelDescriptor>) -> Self {
        Self {
            descriptor,
            attributes: IndexMap::new(),
            exists: false,
            relations: HashMap::new(),
            pivot: None,
        }
    }

    /// Construct an instance hydrated from a fetched row
    pub(crate) fn hydrated(
        descriptor: Arc<ModelDescriptor>,
        attributes: IndexMap<String, DatabaseValue>,
    ) -> Self {
        Self {
            descriptor,
            attributes,
            exists: true,
            relations: HashMap::new(),
            pivot: None,
        }
    }

    /// The type descriptor for this instance
    pub fn descriptor(&self) -> &Arc<ModelDescriptor> {
        &self.descriptor
    }

    /// Table name for this instance
    pub fn table(&self) -> &str {
        self.descriptor.table()
    }

    /// Primary key column name for this instance
    pub fn primary_key_name(&self) -> &str {
        self.descriptor.primary_key()
    }

    /// True once the instance has been persisted or hydrated from a row
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// All attributes in insertion order
    pub fn attributes(&self) -> &IndexMap<String, DatabaseValue> {
        &self.attributes
    }

    /// Get an attribute value by column name
    pub fn attribute(&self, column: &str) -> Option<&DatabaseValue> {
        self.attributes.get(column)
    }

    /// Get an attribute value, treating SQL NULL as absent.
    ///
    /// Relations resolve through this: a missing or null key short-circuits
    /// without issuing a query.
    pub fn key_value(&self, column: &str) -> Option<&DatabaseValue> {
        self.attributes.get(column).filter(|v| !v.is_null())
    }

    /// The primary key value, if set and non-null
    pub fn primary_key_value(&self) -> Option<&DatabaseValue> {
        self.key_value(self.descriptor.primary_key())
    }

    /// Set an attribute value.
    ///
    /// The primary key is immutable once the instance exists.
    pub fn set_attribute<T: Into<DatabaseValue>>(
        &mut self,
        column: &str,
        value: T,
    ) -> ModelResult<()> {
        if self.exists && column == self.descriptor.primary_key() {
            return Err(ModelError::InvalidKey(format!(
                "Cannot change primary key '{}' of an existing {} instance",
                column,
                self.descriptor.name()
            )));
        }
        self.attributes.insert(column.to_string(), value.into());
        Ok(())
    }

    /// Set several attributes at once
    pub fn fill<I, K, V>(&mut self, attributes: I) -> ModelResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<DatabaseValue>,
    {
        for (column, value) in attributes {
            self.set_attribute(column.as_ref(), value)?;
        }
        Ok(())
    }

    /// Get a resolved relation value by name
    pub fn relation(&self, name: &str) -> Option<&RelationValue> {
        self.relations.get(name)
    }

    /// True when a relation has been resolved (eagerly or lazily)
    pub fn relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Store a resolved relation value
    pub fn set_relation(&mut self, name: &str, value: RelationValue) {
        self.relations.insert(name.to_string(), value);
    }

    /// Remove a resolved relation value
    pub fn unset_relation(&mut self, name: &str) {
        self.relations.remove(name);
    }

    /// Resolve a relation lazily: runs the relation's single-owner query on
    /// first access and caches the value in the relations side-table.
    pub async fn load_relation(
        &mut self,
        name: &str,
        relation: &dyn Relation,
        pool: &dyn DatabasePool,
    ) -> ModelResult<&RelationValue> {
        if !self.relations.contains_key(name) {
            let value = relation.get_value(pool).await?;
            self.relations.insert(name.to_string(), value);
        }
        self.relations
            .get(name)
            .ok_or_else(|| ModelError::Relationship(format!("Relation '{}' failed to load", name)))
    }

    /// The pivot attachment record, present on instances hydrated through a
    /// many-to-many join
    pub fn pivot(&self) -> Option<&IndexMap<String, DatabaseValue>> {
        self.pivot.as_ref()
    }

    /// Get one pivot column value
    pub fn pivot_value(&self, column: &str) -> Option<&DatabaseValue> {
        self.pivot.as_ref().and_then(|p| p.get(column))
    }

    pub(crate) fn set_pivot(&mut self, pivot: IndexMap<String, DatabaseValue>) {
        self.pivot = Some(pivot);
    }

    /// Insert or update this instance based on its existence flag.
    ///
    /// Inserts go through `INSERT ... RETURNING *` so database defaults and
    /// generated keys come back onto the instance.
    pub async fn save(&mut self, pool: &dyn DatabasePool) -> ModelResult<()> {
        if self.exists {
            self.perform_update(pool).await
        } else {
            self.perform_insert(pool).await
        }
    }

    async fn perform_insert(&mut self, pool: &dyn DatabasePool) -> ModelResult<()> {
        if self.attributes.is_empty() {
            return Err(ModelError::Query(format!(
                "Cannot insert a {} instance with no attributes",
                self.descriptor.name()
            )));
        }

        let mut query = QueryBuilder::insert_into(self.descriptor.table());
        for (column, value) in &self.attributes {
            query = query.set(column, value.clone());
        }

        let (mut sql, bindings) = query.to_sql_with_bindings(false);
        sql.push_str(" RETURNING *");

        let row = pool
            .fetch_optional(&sql, &bindings)
            .await?
            .ok_or_else(|| {
                ModelError::Database(format!(
                    "Insert into '{}' returned no row",
                    self.descriptor.table()
                ))
            })?;

        let mut attributes = IndexMap::new();
        for name in row.column_names() {
            attributes.insert(name.clone(), row.get_by_name(&name)?);
        }
        self.attributes = attributes;
        self.exists = true;
        Ok(())
    }

    async fn perform_update(&self, pool: &dyn DatabasePool) -> ModelResult<()> {
        let key = self
            .primary_key_value()
            .cloned()
            .ok_or(ModelError::MissingPrimaryKey)?;

        let mut query = QueryBuilder::update(self.descriptor.table());
        let mut assignments = 0;
        for (column, value) in &self.attributes {
            if column == self.descriptor.primary_key() {
                continue;
            }
            query = query.set(column, value.clone());
            assignments += 1;
        }

        // Nothing beyond the primary key: no statement to run
        if assignments == 0 {
            return Ok(());
        }

        let query = query.where_eq(self.descriptor.primary_key(), key);
        query.execute(pool).await?;
        Ok(())
    }
}
