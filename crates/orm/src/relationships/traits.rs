//! Relation Contract
//!
//! The shared interface every relation variant implements. Two resolution
//! paths exist:
//!
//! - single-owner: `get_value` resolves the relation for the one bound
//!   owning instance, short-circuiting when its key is missing;
//! - batch: `add_eager_constraints` seeds the query from all owners' keys,
//!   `get_eager` issues exactly one query, and `match_eager` distributes the
//!   results back through a dictionary keyed on the matching column.

use async_trait::async_trait;

use crate::backends::DatabasePool;
use crate::collection::Collection;
use crate::error::ModelResult;
use crate::model::{Model, RelationValue};

/// One relation between an owning model instance and a related type
#[async_trait]
pub trait Relation: Send + Sync {
    /// The relation name, used as the key in the owner's relations side-table
    fn name(&self) -> &str;

    /// True for relations resolving to a collection rather than a single
    /// instance
    fn is_to_many(&self) -> bool;

    /// Resolve the relation for the bound owning instance.
    ///
    /// A missing or null owner key returns the variant's empty value without
    /// issuing a query.
    async fn get_value(&self, pool: &dyn DatabasePool) -> ModelResult<RelationValue>;

    /// Install batch constraints covering all owners' distinct, non-null key
    /// values. An empty key set installs an unsatisfiable constraint pair so
    /// the batch query deterministically returns zero rows.
    fn add_eager_constraints(&mut self, owners: &[Model]);

    /// Execute the batch query built by `add_eager_constraints`
    async fn get_eager(&self, pool: &dyn DatabasePool) -> ModelResult<Collection>;

    /// Distribute batch results onto the owners, preserving owner order.
    ///
    /// Owners with no matching result receive the variant's empty value
    /// (`None` for to-one, an empty collection for to-many).
    fn match_eager(&self, owners: &mut [Model], results: Collection);
}
