//! Eager Loader - Batch relation resolution entry point
//!
//! Drives the three-step batch protocol for a set of owning instances:
//! seed constraints from all owners' keys, issue exactly one query, then
//! distribute the results back onto the owners in their original order.

use crate::backends::DatabasePool;
use crate::collection::Collection;
use crate::error::ModelResult;
use crate::model::Model;
use crate::relationships::Relation;

/// Batch relation loader.
///
/// Usable either through the associated functions for a single relation, or
/// as a registry: chain `with(..)` calls and resolve every registered
/// relation in one pass with `load_all`.
#[derive(Default)]
pub struct EagerLoader {
    relations: Vec<Box<dyn Relation>>,
}

impl EagerLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one relation for batch loading
    pub fn with(mut self, relation: Box<dyn Relation>) -> Self {
        self.relations.push(relation);
        self
    }

    /// Resolve every registered relation for the owners, one query each
    pub async fn load_all(
        &mut self,
        owners: &mut [Model],
        pool: &dyn DatabasePool,
    ) -> ModelResult<()> {
        for relation in &mut self.relations {
            Self::load(owners, relation.as_mut(), pool).await?;
        }
        Ok(())
    }

    /// Eagerly resolve one relation for every owner in `owners`.
    ///
    /// Issues at most one query: zero when `owners` is empty, exactly one
    /// otherwise (including the all-null-keys case, which runs the
    /// unsatisfiable query and assigns every owner its empty value).
    pub async fn load(
        owners: &mut [Model],
        relation: &mut dyn Relation,
        pool: &dyn DatabasePool,
    ) -> ModelResult<()> {
        if owners.is_empty() {
            return Ok(());
        }

        relation.add_eager_constraints(owners);
        let results = relation.get_eager(pool).await?;

        tracing::debug!(
            relation = relation.name(),
            owners = owners.len(),
            results = results.len(),
            "eager-loaded relation"
        );

        relation.match_eager(owners, results);
        Ok(())
    }

    /// Eagerly resolve one relation for every instance in a collection
    pub async fn load_collection(
        collection: &mut Collection,
        relation: &mut dyn Relation,
        pool: &dyn DatabasePool,
    ) -> ModelResult<()> {
        let mut owners = collection.take();
        let outcome = Self::load(&mut owners, relation, pool).await;
        *collection = owners.into_iter().collect();
        outcome
    }
}
