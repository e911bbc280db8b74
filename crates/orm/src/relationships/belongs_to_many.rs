//! BelongsToMany Relation - Many-to-many through a link table
//!
//! Resolution joins the related table against the link table and splits each
//! row into related-instance attributes plus a pivot attachment record. The
//! attach/detach/sync/toggle mutation primitives operate on related primary
//! key values via set arithmetic over the currently attached ID set.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::backends::{DatabasePool, DatabaseRow, DatabaseValue};
use crate::collection::Collection;
use crate::error::{ModelError, ModelResult};
use crate::model::{Model, ModelDescriptor, RelationValue};
use crate::query::QueryBuilder;
use crate::relationships::traits::Relation;

/// Alias prefix separating link-table columns from related-table columns in
/// join query results
const PIVOT_PREFIX: &str = "pivot_";

/// Delta report from `sync`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncChanges {
    pub attached: Vec<DatabaseValue>,
    pub detached: Vec<DatabaseValue>,
    pub updated: Vec<DatabaseValue>,
}

/// Delta report from `toggle`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToggleChanges {
    pub attached: Vec<DatabaseValue>,
    pub detached: Vec<DatabaseValue>,
}

/// Many-to-many relation through a link table
#[derive(Debug, Clone)]
pub struct BelongsToMany {
    owner: Model,
    related: Arc<ModelDescriptor>,
    table: String,
    foreign_pivot_key: String,
    related_pivot_key: String,
    parent_key: String,
    related_key: String,
    pivot_columns: Vec<String>,
    timestamps: bool,
    name: String,
    query: QueryBuilder,
}

impl BelongsToMany {
    /// Create the relation with default naming: the link table is the two
    /// lowercased short names sorted and joined by "_", the two link columns
    /// are each side's default foreign key.
    pub fn new(owner: Model, related: Arc<ModelDescriptor>) -> ModelResult<Self> {
        owner.descriptor().validate()?;
        related.validate()?;

        let table = owner.descriptor().join_table_with(&related);
        let foreign_pivot_key = owner.descriptor().foreign_key().to_string();
        let related_pivot_key = related.foreign_key().to_string();
        let parent_key = owner.descriptor().primary_key().to_string();
        let related_key = related.primary_key().to_string();
        let name = related.table().to_string();
        let query = QueryBuilder::table(related.table());

        Ok(Self {
            owner,
            related,
            table,
            foreign_pivot_key,
            related_pivot_key,
            parent_key,
            related_key,
            pivot_columns: Vec::new(),
            timestamps: false,
            name,
            query,
        })
    }

    /// Override the link table name
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    /// Override the two link-table key columns
    pub fn with_pivot_keys(mut self, foreign_pivot_key: &str, related_pivot_key: &str) -> Self {
        self.foreign_pivot_key = foreign_pivot_key.to_string();
        self.related_pivot_key = related_pivot_key.to_string();
        self
    }

    /// Surface extra link-table columns on the pivot attachment record
    pub fn with_pivot(mut self, columns: &[&str]) -> Self {
        self.pivot_columns
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }

    /// Maintain `created_at` / `updated_at` on the link table
    pub fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
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

    /// The link table name
    pub fn pivot_table(&self) -> &str {
        &self.table
    }

    fn qualified(&self, column: &str) -> String {
        format!("{}.{}", self.table, column)
    }

    fn owner_key(&self) -> ModelResult<DatabaseValue> {
        self.owner.key_value(&self.parent_key).cloned().ok_or_else(|| {
            ModelError::Relationship(format!(
                "Cannot mutate relation '{}': owner has no '{}' value",
                self.name, self.parent_key
            ))
        })
    }

    /// Columns the pivot attachment record surfaces beyond the two keys
    fn extra_pivot_columns(&self) -> Vec<String> {
        let mut columns = self.pivot_columns.clone();
        if self.timestamps {
            columns.push("created_at".to_string());
            columns.push("updated_at".to_string());
        }
        columns
    }

    /// The join query selecting related columns plus aliased pivot columns
    fn join_query(&self) -> QueryBuilder {
        let star = format!("{}.*", self.related.table());
        let mut query = self
            .query
            .clone()
            .select(&[star.as_str()])
            .add_select(&format!(
                "{} AS {}{}",
                self.qualified(&self.foreign_pivot_key),
                PIVOT_PREFIX,
                self.foreign_pivot_key
            ))
            .add_select(&format!(
                "{} AS {}{}",
                self.qualified(&self.related_pivot_key),
                PIVOT_PREFIX,
                self.related_pivot_key
            ));

        for column in self.extra_pivot_columns() {
            query = query.add_select(&format!(
                "{} AS {}{}",
                self.qualified(&column),
                PIVOT_PREFIX,
                column
            ));
        }

        query.join(
            &self.table,
            &self.qualified(&self.related_pivot_key),
            &format!("{}.{}", self.related.table(), self.related_key),
        )
    }

    /// Hydrate one join row, splitting aliased pivot columns into the side
    /// attachment record
    fn hydrate_join_row(&self, row: &dyn DatabaseRow) -> ModelResult<Model> {
        let mut attributes = IndexMap::new();
        let mut pivot = IndexMap::new();

        for column in row.column_names() {
            let value = row.get_by_name(&column)?;
            match column.strip_prefix(PIVOT_PREFIX) {
                Some(pivot_column) => {
                    pivot.insert(pivot_column.to_string(), value);
                }
                None => {
                    attributes.insert(column, value);
                }
            }
        }

        let mut model = self.related.hydrate(attributes);
        model.set_pivot(pivot);
        Ok(model)
    }

    /// Resolve the related collection for the bound owner
    pub async fn get(&self, pool: &dyn DatabasePool) -> ModelResult<Collection> {
        let value = match self.owner.key_value(&self.parent_key) {
            Some(value) => value.clone(),
            None => return Ok(Collection::new()),
        };

        let query = self
            .join_query()
            .where_eq(&self.qualified(&self.foreign_pivot_key), value);

        let rows = query.fetch_rows(pool).await?;
        let mut collection = Collection::new();
        for row in &rows {
            collection.push(self.hydrate_join_row(row.as_ref())?);
        }
        Ok(collection)
    }

    /// The currently attached related primary key values, in row order
    pub async fn attached_ids(&self, pool: &dyn DatabasePool) -> ModelResult<Vec<DatabaseValue>> {
        Ok(self.get(pool).await?.distinct_keys(&self.related_key))
    }

    /// Insert one link-table row for `id`, with optional extra pivot columns.
    ///
    /// Attaching an already-attached ID is not deduplicated; use `sync` or
    /// `toggle` for idempotent mutation.
    pub async fn attach(
        &self,
        pool: &dyn DatabasePool,
        id: DatabaseValue,
        extra: &[(&str, DatabaseValue)],
    ) -> ModelResult<()> {
        let owner_key = self.owner_key()?;

        let mut query = QueryBuilder::insert_into(&self.table)
            .set(&self.foreign_pivot_key, owner_key)
            .set(&self.related_pivot_key, id);

        for (column, value) in extra {
            query = query.set(column, value.clone());
        }

        if self.timestamps {
            let now = chrono::Utc::now();
            query = query.set("created_at", now).set("updated_at", now);
        }

        query.execute(pool).await?;
        Ok(())
    }

    /// Delete link-table rows for this owner. With `ids` given, only rows
    /// whose related key is in `ids`; without, all rows for the owner.
    pub async fn detach(
        &self,
        pool: &dyn DatabasePool,
        ids: Option<&[DatabaseValue]>,
    ) -> ModelResult<u64> {
        let owner_key = self.owner_key()?;

        let mut query =
            QueryBuilder::delete_from(&self.table).where_eq(&self.foreign_pivot_key, owner_key);
        if let Some(ids) = ids {
            query = query.where_in(&self.related_pivot_key, ids.to_vec());
        }

        query.execute(pool).await
    }

    /// Reconcile the attached set to exactly `desired`: detaches what is
    /// attached but not desired, attaches what is desired but not attached.
    pub async fn sync(
        &self,
        pool: &dyn DatabasePool,
        desired: &[DatabaseValue],
    ) -> ModelResult<SyncChanges> {
        let desired = dedupe_ids(desired);
        let current = self.attached_ids(pool).await?;
        let current_keys: HashSet<String> = current.iter().map(|v| v.as_key()).collect();
        let desired_keys: HashSet<String> = desired.iter().map(|v| v.as_key()).collect();

        let to_detach: Vec<DatabaseValue> = current
            .iter()
            .filter(|v| !desired_keys.contains(&v.as_key()))
            .cloned()
            .collect();
        let to_attach: Vec<DatabaseValue> = desired
            .iter()
            .filter(|v| !current_keys.contains(&v.as_key()))
            .cloned()
            .collect();

        if !to_detach.is_empty() {
            self.detach(pool, Some(&to_detach)).await?;
        }
        for id in &to_attach {
            self.attach(pool, id.clone(), &[]).await?;
        }

        tracing::debug!(
            table = %self.table,
            attached = to_attach.len(),
            detached = to_detach.len(),
            "synchronized pivot table"
        );

        Ok(SyncChanges {
            attached: to_attach,
            detached: to_detach,
            updated: Vec::new(),
        })
    }

    /// Flip membership for each of `ids`: attached IDs are detached,
    /// unattached IDs are attached.
    pub async fn toggle(
        &self,
        pool: &dyn DatabasePool,
        ids: &[DatabaseValue],
    ) -> ModelResult<ToggleChanges> {
        let ids = dedupe_ids(ids);
        let current = self.attached_ids(pool).await?;
        let current_keys: HashSet<String> = current.iter().map(|v| v.as_key()).collect();

        let to_detach: Vec<DatabaseValue> = ids
            .iter()
            .filter(|v| current_keys.contains(&v.as_key()))
            .cloned()
            .collect();
        let to_attach: Vec<DatabaseValue> = ids
            .iter()
            .filter(|v| !current_keys.contains(&v.as_key()))
            .cloned()
            .collect();

        if !to_detach.is_empty() {
            self.detach(pool, Some(&to_detach)).await?;
        }
        for id in &to_attach {
            self.attach(pool, id.clone(), &[]).await?;
        }

        Ok(ToggleChanges {
            attached: to_attach,
            detached: to_detach,
        })
    }
}

/// Drop repeated IDs, keeping first occurrences in order. The set arithmetic
/// in `sync`/`toggle` works on distinct keys, so a repeated input ID must
/// not produce a second link-table row.
fn dedupe_ids(ids: &[DatabaseValue]) -> Vec<DatabaseValue> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|v| seen.insert(v.as_key()))
        .cloned()
        .collect()
}

#[async_trait]
impl Relation for BelongsToMany {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_to_many(&self) -> bool {
        true
    }

    async fn get_value(&self, pool: &dyn DatabasePool) -> ModelResult<RelationValue> {
        Ok(RelationValue::Many(self.get(pool).await?))
    }

    fn add_eager_constraints(&mut self, owners: &[Model]) {
        let owners: Collection = owners.iter().cloned().collect();
        let keys = owners.distinct_keys(&self.parent_key);
        let column = self.qualified(&self.foreign_pivot_key);

        self.query = if keys.is_empty() {
            self.query.clone().where_nothing(&column)
        } else {
            self.query.clone().where_in(&column, keys)
        };
    }

    async fn get_eager(&self, pool: &dyn DatabasePool) -> ModelResult<Collection> {
        let rows = self.join_query().fetch_rows(pool).await?;
        let mut collection = Collection::new();
        for row in &rows {
            collection.push(self.hydrate_join_row(row.as_ref())?);
        }
        Ok(collection)
    }

    fn match_eager(&self, owners: &mut [Model], results: Collection) {
        // Group by the pivot record's owner key; the related instance's own
        // attribute bag never carries it.
        let mut dictionary: std::collections::HashMap<String, Collection> =
            std::collections::HashMap::new();
        for model in results {
            if let Some(key) = model
                .pivot_value(&self.foreign_pivot_key)
                .filter(|v| !v.is_null())
                .map(|v| v.as_key())
            {
                dictionary.entry(key).or_default().push(model);
            }
        }

        for owner in owners.iter_mut() {
            // Owners may share a key value, so every owner reads its slice
            // rather than consuming it.
            let matched = owner
                .key_value(&self.parent_key)
                .map(|v| v.as_key())
                .and_then(|key| dictionary.get(&key).cloned())
                .unwrap_or_default();
            owner.set_relation(&self.name, RelationValue::Many(matched));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role_descriptor() -> Arc<ModelDescriptor> {
        Arc::new(ModelDescriptor::new("Role").unwrap())
    }

    fn user(id: i64) -> Model {
        let descriptor = Arc::new(ModelDescriptor::new("User").unwrap());
        let mut attributes = IndexMap::new();
        attributes.insert("id".to_string(), DatabaseValue::Int64(id));
        descriptor.hydrate(attributes)
    }

    #[test]
    fn test_default_link_table_and_keys() {
        let relation = BelongsToMany::new(user(1), role_descriptor()).unwrap();
        assert_eq!(relation.pivot_table(), "role_user");
        assert_eq!(relation.foreign_pivot_key, "user_id");
        assert_eq!(relation.related_pivot_key, "role_id");
        assert_eq!(relation.name(), "roles");
    }

    #[test]
    fn test_join_query_aliases_pivot_columns() {
        let relation = BelongsToMany::new(user(1), role_descriptor())
            .unwrap()
            .with_pivot(&["granted_by"]);

        let sql = relation.join_query().to_sql(false);
        assert_eq!(
            sql,
            "SELECT roles.*, role_user.user_id AS pivot_user_id, \
             role_user.role_id AS pivot_role_id, role_user.granted_by AS pivot_granted_by \
             FROM roles INNER JOIN role_user ON role_user.role_id = roles.id"
        );
    }

    #[test]
    fn test_timestamps_add_pivot_columns() {
        let relation = BelongsToMany::new(user(1), role_descriptor())
            .unwrap()
            .with_timestamps();

        let sql = relation.join_query().to_sql(false);
        assert!(sql.contains("role_user.created_at AS pivot_created_at"));
        assert!(sql.contains("role_user.updated_at AS pivot_updated_at"));
    }

    #[test]
    fn test_eager_constraints_qualify_owner_column() {
        let mut relation = BelongsToMany::new(user(1), role_descriptor()).unwrap();
        relation.add_eager_constraints(&[user(1), user(2)]);

        let (sql, bindings) = relation.query.to_sql_with_bindings(false);
        assert!(sql.contains("role_user.user_id IN (?, ?)"));
        assert_eq!(
            bindings,
            vec![DatabaseValue::Int64(1), DatabaseValue::Int64(2)]
        );
    }

    #[test]
    fn test_match_groups_by_pivot_owner_key() {
        let relation = BelongsToMany::new(user(1), role_descriptor()).unwrap();
        let descriptor = role_descriptor();

        let role = |id: i64, owner: i64| {
            let mut attributes = IndexMap::new();
            attributes.insert("id".to_string(), DatabaseValue::Int64(id));
            let mut model = descriptor.hydrate(attributes);
            let mut pivot = IndexMap::new();
            pivot.insert("user_id".to_string(), DatabaseValue::Int64(owner));
            pivot.insert("role_id".to_string(), DatabaseValue::Int64(id));
            model.set_pivot(pivot);
            model
        };

        let results: Collection = vec![role(10, 1), role(11, 2), role(12, 1)]
            .into_iter()
            .collect();
        let mut owners = vec![user(1), user(2), user(3)];

        relation.match_eager(&mut owners, results);

        let first = owners[0].relation("roles").and_then(|r| r.as_many()).unwrap();
        assert_eq!(
            first.pluck("id"),
            vec![DatabaseValue::Int64(10), DatabaseValue::Int64(12)]
        );
        let third = owners[2].relation("roles").and_then(|r| r.as_many()).unwrap();
        assert!(third.is_empty());
    }

    #[test]
    fn test_match_shares_slice_between_owners_with_equal_keys() {
        let relation = BelongsToMany::new(user(1), role_descriptor()).unwrap();
        let descriptor = role_descriptor();

        let mut attributes = IndexMap::new();
        attributes.insert("id".to_string(), DatabaseValue::Int64(10));
        let mut role = descriptor.hydrate(attributes);
        let mut pivot = IndexMap::new();
        pivot.insert("user_id".to_string(), DatabaseValue::Int64(1));
        pivot.insert("role_id".to_string(), DatabaseValue::Int64(10));
        role.set_pivot(pivot);

        let results: Collection = vec![role].into_iter().collect();
        let mut owners = vec![user(1), user(1)];

        relation.match_eager(&mut owners, results);

        for owner in &owners {
            let loaded = owner.relation("roles").and_then(|r| r.as_many()).unwrap();
            assert_eq!(loaded.pluck("id"), vec![DatabaseValue::Int64(10)]);
        }
    }

    #[test]
    fn test_dedupe_ids_keeps_first_occurrences() {
        let ids = [
            DatabaseValue::Int64(3),
            DatabaseValue::Int64(2),
            DatabaseValue::Int64(3),
        ];
        assert_eq!(
            dedupe_ids(&ids),
            vec![DatabaseValue::Int64(3), DatabaseValue::Int64(2)]
        );
    }
}
