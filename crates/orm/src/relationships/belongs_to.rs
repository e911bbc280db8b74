//! BelongsTo Relation - Child references parent through a foreign key
//!
//! The owning instance carries the foreign key; the related row is located by
//! matching that value against the related table's owner key.

use std::sync::Arc;

use async_trait::async_trait;

use crate::backends::{DatabasePool, DatabaseValue};
use crate::collection::Collection;
use crate::error::ModelResult;
use crate::model::{Model, ModelDescriptor, RelationValue};
use crate::query::QueryBuilder;
use crate::relationships::traits::Relation;

/// Inverse to-one relation: the owner's foreign key points at the related
/// type's owner key
#[derive(Debug, Clone)]
pub struct BelongsTo {
    owner: Model,
    related: Arc<ModelDescriptor>,
    foreign_key: String,
    owner_key: String,
    name: String,
    query: QueryBuilder,
}

impl BelongsTo {
    /// Create the relation with default key naming: foreign key from the
    /// related descriptor, owner key from its primary key, relation name from
    /// its lowercased short name.
    pub fn new(owner: Model, related: Arc<ModelDescriptor>) -> ModelResult<Self> {
        owner.descriptor().validate()?;
        related.validate()?;

        let foreign_key = related.foreign_key().to_string();
        let owner_key = related.primary_key().to_string();
        let name = related.name().to_lowercase();
        let query = QueryBuilder::table(related.table());

        Ok(Self {
            owner,
            related,
            foreign_key,
            owner_key,
            name,
            query,
        })
    }

    /// Override the foreign key column on the owning side
    pub fn with_foreign_key(mut self, foreign_key: &str) -> Self {
        self.foreign_key = foreign_key.to_string();
        self
    }

    /// Override the owner key column on the related side
    pub fn with_owner_key(mut self, owner_key: &str) -> Self {
        self.owner_key = owner_key.to_string();
        self
    }

    /// Override the relation name
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// The owning instance
    pub fn owner(&self) -> &Model {
        &self.owner
    }

    /// The owning instance, mutably (associate/dissociate write through this)
    pub fn owner_mut(&mut self) -> &mut Model {
        &mut self.owner
    }

    /// Consume the relation, returning the owning instance
    pub fn into_owner(self) -> Model {
        self.owner
    }

    /// The underlying query, for chaining extra constraints
    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut QueryBuilder {
        &mut self.query
    }

    /// Resolve the related instance for the bound owner
    pub async fn get(&self, pool: &dyn DatabasePool) -> ModelResult<Option<Model>> {
        let value = match self.owner.key_value(&self.foreign_key) {
            Some(value) => value.clone(),
            None => return Ok(None),
        };

        self.query
            .clone()
            .where_eq(&self.owner_key, value)
            .first(pool, &self.related)
            .await
    }

    /// Point the owner at `related`: writes its owner-key value into the
    /// owner's foreign key and records the instance in the relations
    /// side-table.
    pub fn associate(&mut self, related: &Model) -> ModelResult<()> {
        let value = related
            .key_value(&self.owner_key)
            .cloned()
            .unwrap_or(DatabaseValue::Null);
        self.owner.set_attribute(&self.foreign_key, value)?;
        self.owner
            .set_relation(&self.name, RelationValue::One(Some(related.clone())));
        Ok(())
    }

    /// Clear the owner's foreign key and the cached relation value
    pub fn dissociate(&mut self) -> ModelResult<()> {
        self.owner
            .set_attribute(&self.foreign_key, DatabaseValue::Null)?;
        self.owner.set_relation(&self.name, RelationValue::One(None));
        Ok(())
    }
}

#[async_trait]
impl Relation for BelongsTo {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_to_many(&self) -> bool {
        false
    }

    async fn get_value(&self, pool: &dyn DatabasePool) -> ModelResult<RelationValue> {
        Ok(RelationValue::One(self.get(pool).await?))
    }

    fn add_eager_constraints(&mut self, owners: &[Model]) {
        let owners: Collection = owners.iter().cloned().collect();
        let keys = owners.distinct_keys(&self.foreign_key);

        self.query = if keys.is_empty() {
            self.query.clone().where_nothing(&self.owner_key)
        } else {
            self.query.clone().where_in(&self.owner_key, keys)
        };
    }

    async fn get_eager(&self, pool: &dyn DatabasePool) -> ModelResult<Collection> {
        self.query.get(pool, &self.related).await
    }

    fn match_eager(&self, owners: &mut [Model], results: Collection) {
        let dictionary = results.dictionary(&self.owner_key);
        for owner in owners.iter_mut() {
            let matched = owner
                .key_value(&self.foreign_key)
                .map(|v| v.as_key())
                .and_then(|key| dictionary.get(&key))
                .and_then(|group| group.first())
                .cloned();
            owner.set_relation(&self.name, RelationValue::One(matched));
        }
    }
}
