//! HasOne Relation - Parent exclusively owns one child row
//!
//! The owning instance's local key (its primary key by default) is matched
//! against the related table's foreign key column.

use std::sync::Arc;

use async_trait::async_trait;

use crate::backends::{DatabasePool, DatabaseValue};
use crate::collection::Collection;
use crate::error::{ModelError, ModelResult};
use crate::model::{Model, ModelDescriptor, RelationValue};
use crate::query::QueryBuilder;
use crate::relationships::traits::Relation;

/// Forward to-one relation
#[derive(Debug, Clone)]
pub struct HasOne {
    owner: Model,
    related: Arc<ModelDescriptor>,
    foreign_key: String,
    local_key: String,
    name: String,
    query: QueryBuilder,
}

impl HasOne {
    /// Create the relation with default key naming: the related table's
    /// foreign key is derived from the owner's short name, the local key is
    /// the owner's primary key.
    pub fn new(owner: Model, related: Arc<ModelDescriptor>) -> ModelResult<Self> {
        owner.descriptor().validate()?;
        related.validate()?;

        let foreign_key = owner.descriptor().foreign_key().to_string();
        let local_key = owner.descriptor().primary_key().to_string();
        let name = related.name().to_lowercase();
        let query = QueryBuilder::table(related.table());

        Ok(Self {
            owner,
            related,
            foreign_key,
            local_key,
            name,
            query,
        })
    }

    /// Override the foreign key column on the related side
    pub fn with_foreign_key(mut self, foreign_key: &str) -> Self {
        self.foreign_key = foreign_key.to_string();
        self
    }

    /// Override the local key column on the owning side
    pub fn with_local_key(mut self, local_key: &str) -> Self {
        self.local_key = local_key.to_string();
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

    /// The underlying query, for chaining extra constraints
    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut QueryBuilder {
        &mut self.query
    }

    fn owner_key(&self) -> ModelResult<DatabaseValue> {
        self.owner.key_value(&self.local_key).cloned().ok_or_else(|| {
            ModelError::Relationship(format!(
                "Cannot mutate relation '{}': owner has no '{}' value",
                self.name, self.local_key
            ))
        })
    }

    /// Resolve the related instance for the bound owner
    pub async fn get(&self, pool: &dyn DatabasePool) -> ModelResult<Option<Model>> {
        let value = match self.owner.key_value(&self.local_key) {
            Some(value) => value.clone(),
            None => return Ok(None),
        };

        self.query
            .clone()
            .where_eq(&self.foreign_key, value)
            .first(pool, &self.related)
            .await
    }

    /// Build and insert a related instance with the foreign key stamped on
    pub async fn create<I, K, V>(
        &self,
        pool: &dyn DatabasePool,
        attributes: I,
    ) -> ModelResult<Model>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<DatabaseValue>,
    {
        let mut instance = self.related.new_instance();
        instance.fill(attributes)?;
        self.save(pool, &mut instance).await?;
        Ok(instance)
    }

    /// Stamp the foreign key onto `instance` and insert-or-update it
    pub async fn save(&self, pool: &dyn DatabasePool, instance: &mut Model) -> ModelResult<()> {
        let key = self.owner_key()?;
        instance.set_attribute(&self.foreign_key, key)?;
        instance.save(pool).await
    }
}

#[async_trait]
impl Relation for HasOne {
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
        let keys = owners.distinct_keys(&self.local_key);

        self.query = if keys.is_empty() {
            self.query.clone().where_nothing(&self.foreign_key)
        } else {
            self.query.clone().where_in(&self.foreign_key, keys)
        };
    }

    async fn get_eager(&self, pool: &dyn DatabasePool) -> ModelResult<Collection> {
        self.query.get(pool, &self.related).await
    }

    fn match_eager(&self, owners: &mut [Model], results: Collection) {
        let dictionary = results.dictionary(&self.foreign_key);
        for owner in owners.iter_mut() {
            let matched = owner
                .key_value(&self.local_key)
                .map(|v| v.as_key())
                .and_then(|key| dictionary.get(&key))
                .and_then(|group| group.first())
                .cloned();
            owner.set_relation(&self.name, RelationValue::One(matched));
        }
    }
}
