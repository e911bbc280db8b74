//! Relationship System - The four relation variants and their shared contract
//!
//! - `traits`: the `Relation` contract (single-owner and batch paths)
//! - `belongs_to`: inverse to-one (child references parent)
//! - `has_one`: forward to-one (exclusive child)
//! - `has_many`: forward to-many (child collection)
//! - `belongs_to_many`: many-to-many through a link table, with the pivot
//!   attach/detach/sync/toggle primitives

pub mod belongs_to;
pub mod belongs_to_many;
pub mod has_many;
pub mod has_one;
pub mod traits;

pub use belongs_to::BelongsTo;
pub use belongs_to_many::{BelongsToMany, SyncChanges, ToggleChanges};
pub use has_many::HasMany;
pub use has_one::HasOne;
pub use traits::Relation;
