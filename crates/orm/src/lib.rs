//! Kinship ORM - Relationship resolution and eager loading engine
//!
//! The object-relational core: dynamically-typed model instances over an
//! ordered attribute bag, a fluent query constraint builder rendering
//! parameterized SQL, four relation variants sharing one contract, a batch
//! eager loader that resolves a relation for N owners in one query, and the
//! pivot attach/detach/sync/toggle primitives for many-to-many link tables.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use kinship_orm::{EagerLoader, HasMany, ModelDescriptor, QueryBuilder};
//! use kinship_orm::backends::PostgresPool;
//!
//! # async fn demo() -> kinship_orm::ModelResult<()> {
//! let pool = PostgresPool::connect("postgres://localhost/app", 5).await?;
//! let post = Arc::new(ModelDescriptor::new("Post")?);
//! let comment = Arc::new(ModelDescriptor::new("Comment")?);
//!
//! let mut posts = QueryBuilder::table(post.table())
//!     .where_eq("status", "published")
//!     .get(&pool, &post)
//!     .await?;
//!
//! let owner = post.new_instance();
//! let mut comments = HasMany::new(owner, comment)?;
//! EagerLoader::load_collection(&mut posts, &mut comments, &pool).await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod collection;
pub mod error;
pub mod fake;
pub mod loading;
pub mod model;
pub mod query;
pub mod relationships;

pub use backends::{DatabasePool, DatabaseRow, DatabaseValue};
pub use collection::Collection;
pub use error::{ModelError, ModelResult, OrmError, OrmResult, RelationshipError};
pub use loading::EagerLoader;
pub use model::{Model, ModelDescriptor, RelationValue};
pub use query::QueryBuilder;
pub use relationships::{
    BelongsTo, BelongsToMany, HasMany, HasOne, Relation, SyncChanges, ToggleChanges,
};
