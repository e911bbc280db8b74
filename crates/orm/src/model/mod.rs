//! Model System - Descriptor and dynamic instance types
//!
//! - `descriptor`: per-type metadata (table, keys, default naming)
//! - `instance`: the attribute bag, existence flag and relations side-table

pub mod descriptor;
pub mod instance;

pub use descriptor::ModelDescriptor;
pub use instance::{Model, RelationValue};
