//! End-to-end relationship resolution tests against the scripted fake pool:
//! batch loading query counts, result distribution, and pivot mutation
//! semantics.

use std::sync::Arc;

use indexmap::IndexMap;

use kinship_orm::fake::{FakePool, FakeRow};
use kinship_orm::{
    BelongsTo, BelongsToMany, Collection, DatabaseValue, EagerLoader, HasMany, Model,
    ModelDescriptor, RelationValue,
};

fn descriptor(name: &str) -> Arc<ModelDescriptor> {
    Arc::new(ModelDescriptor::new(name).unwrap())
}

fn instance(descriptor: &Arc<ModelDescriptor>, columns: &[(&str, DatabaseValue)]) -> Model {
    let mut attributes = IndexMap::new();
    for (column, value) in columns {
        attributes.insert(column.to_string(), value.clone());
    }
    descriptor.hydrate(attributes)
}

fn post(descriptor: &Arc<ModelDescriptor>, id: i64) -> Model {
    instance(descriptor, &[("id", DatabaseValue::Int64(id))])
}

fn comment_row(id: i64, post_id: i64) -> FakeRow {
    FakeRow::new([("id", id), ("post_id", post_id)])
}

fn pivot_row(role_id: i64, user_id: i64) -> FakeRow {
    FakeRow::new([
        ("id", DatabaseValue::Int64(role_id)),
        ("pivot_user_id", DatabaseValue::Int64(user_id)),
        ("pivot_role_id", DatabaseValue::Int64(role_id)),
    ])
}

#[tokio::test]
async fn eager_load_distributes_comments_with_one_query() {
    let posts = descriptor("Post");
    let comments = descriptor("Comment");
    let pool = FakePool::new();
    pool.push_rows(vec![
        comment_row(10, 1),
        comment_row(11, 1),
        comment_row(12, 2),
    ]);

    let mut owners = vec![
        post(&posts, 1),
        post(&posts, 2),
        post(&posts, 3),
    ];
    let mut relation = HasMany::new(posts.new_instance(), Arc::clone(&comments)).unwrap();

    EagerLoader::load(&mut owners, &mut relation, &pool).await.unwrap();

    // Exactly one query, constrained over all three owner keys
    let queries = pool.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(
        queries[0].sql,
        "SELECT * FROM comments WHERE post_id IN (?, ?, ?)"
    );
    assert_eq!(
        queries[0].bindings,
        vec![
            DatabaseValue::Int64(1),
            DatabaseValue::Int64(2),
            DatabaseValue::Int64(3)
        ]
    );

    let a = owners[0].relation("comments").and_then(|r| r.as_many()).unwrap();
    assert_eq!(
        a.pluck("id"),
        vec![DatabaseValue::Int64(10), DatabaseValue::Int64(11)]
    );

    let b = owners[1].relation("comments").and_then(|r| r.as_many()).unwrap();
    assert_eq!(b.pluck("id"), vec![DatabaseValue::Int64(12)]);

    let c = owners[2].relation("comments").and_then(|r| r.as_many()).unwrap();
    assert!(c.is_empty());
}

#[tokio::test]
async fn eager_load_with_no_owners_issues_no_query() {
    let posts = descriptor("Post");
    let comments = descriptor("Comment");
    let pool = FakePool::new();

    let mut owners: Vec<Model> = Vec::new();
    let mut relation = HasMany::new(posts.new_instance(), comments).unwrap();

    EagerLoader::load(&mut owners, &mut relation, &pool).await.unwrap();
    assert_eq!(pool.query_count(), 0);
}

#[tokio::test]
async fn eager_load_with_all_null_keys_runs_one_unsatisfiable_query() {
    let posts = descriptor("Post");
    let comments = descriptor("Comment");
    let pool = FakePool::new();
    pool.push_rows(vec![]);

    let mut owners = vec![instance(&posts, &[("id", DatabaseValue::Null)])];
    let mut relation = HasMany::new(posts.new_instance(), comments).unwrap();

    EagerLoader::load(&mut owners, &mut relation, &pool).await.unwrap();

    let queries = pool.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(
        queries[0].sql,
        "SELECT * FROM comments WHERE post_id IS NULL AND post_id IS NOT NULL"
    );
    assert!(queries[0].bindings.is_empty());

    let loaded = owners[0].relation("comments").and_then(|r| r.as_many()).unwrap();
    assert!(loaded.is_empty());
}

#[tokio::test]
async fn eager_load_preserves_owner_order() {
    let posts = descriptor("Post");
    let comments = descriptor("Comment");
    let pool = FakePool::new();
    pool.push_rows(vec![comment_row(10, 1), comment_row(12, 2)]);

    let mut collection: Collection = vec![
        post(&posts, 3),
        post(&posts, 1),
        post(&posts, 2),
    ]
    .into_iter()
    .collect();
    let mut relation = HasMany::new(posts.new_instance(), comments).unwrap();

    EagerLoader::load_collection(&mut collection, &mut relation, &pool)
        .await
        .unwrap();

    assert_eq!(
        collection.pluck("id"),
        vec![
            DatabaseValue::Int64(3),
            DatabaseValue::Int64(1),
            DatabaseValue::Int64(2)
        ]
    );
    assert!(collection.iter().all(|m| m.relation_loaded("comments")));
}

#[tokio::test]
async fn registered_relations_load_one_query_each() {
    let posts = descriptor("Post");
    let comments = descriptor("Comment");
    let users = descriptor("User");
    let pool = FakePool::new();
    pool.push_rows(vec![comment_row(10, 1)]);
    pool.push_rows(vec![FakeRow::new([("id", 5i64)])]);

    let mut owners = vec![instance(
        &posts,
        &[("id", DatabaseValue::Int64(1)), ("user_id", DatabaseValue::Int64(5))],
    )];

    let mut loader = EagerLoader::new()
        .with(Box::new(
            HasMany::new(posts.new_instance(), comments).unwrap(),
        ))
        .with(Box::new(
            BelongsTo::new(posts.new_instance(), users).unwrap(),
        ));

    loader.load_all(&mut owners, &pool).await.unwrap();

    assert_eq!(pool.query_count(), 2);
    assert!(owners[0].relation_loaded("comments"));
    assert!(owners[0].relation_loaded("user"));
}

#[tokio::test]
async fn belongs_to_eager_load_defaults_to_none() {
    let posts = descriptor("Post");
    let users = descriptor("User");
    let pool = FakePool::new();
    pool.push_rows(vec![FakeRow::new([("id", 5i64)])]);

    let mut owners = vec![
        instance(
            &posts,
            &[("id", DatabaseValue::Int64(1)), ("user_id", DatabaseValue::Int64(5))],
        ),
        instance(
            &posts,
            &[("id", DatabaseValue::Int64(2)), ("user_id", DatabaseValue::Int64(9))],
        ),
        instance(
            &posts,
            &[("id", DatabaseValue::Int64(3)), ("user_id", DatabaseValue::Null)],
        ),
    ];
    let mut relation = BelongsTo::new(posts.new_instance(), users).unwrap();

    EagerLoader::load(&mut owners, &mut relation, &pool).await.unwrap();
    assert_eq!(pool.query_count(), 1);

    assert_eq!(
        owners[0]
            .relation("user")
            .and_then(|r| r.as_one())
            .and_then(|m| m.attribute("id")),
        Some(&DatabaseValue::Int64(5))
    );
    assert_eq!(owners[1].relation("user").and_then(|r| r.as_one()), None);
    assert_eq!(owners[2].relation("user").and_then(|r| r.as_one()), None);
}

#[tokio::test]
async fn lazy_load_caches_on_first_access() {
    let posts = descriptor("Post");
    let comments = descriptor("Comment");
    let pool = FakePool::new();
    pool.push_rows(vec![comment_row(10, 1)]);

    let mut owner = post(&posts, 1);
    let relation = HasMany::new(owner.clone(), comments).unwrap();

    let value = owner.load_relation("comments", &relation, &pool).await.unwrap();
    assert_eq!(value.as_many().map(|c| c.len()), Some(1));
    assert_eq!(pool.query_count(), 1);

    // Second access resolves from the side-table
    owner.load_relation("comments", &relation, &pool).await.unwrap();
    assert_eq!(pool.query_count(), 1);
}

#[tokio::test]
async fn missing_foreign_key_short_circuits_without_query() {
    let posts = descriptor("Post");
    let users = descriptor("User");
    let pool = FakePool::new();

    let owner = instance(&posts, &[("id", DatabaseValue::Int64(1))]);
    let relation = BelongsTo::new(owner, users).unwrap();

    assert_eq!(relation.get(&pool).await.unwrap(), None);
    assert_eq!(pool.query_count(), 0);
}

#[tokio::test]
async fn pivot_get_splits_attachment_record() {
    let users = descriptor("User");
    let roles = descriptor("Role");
    let pool = FakePool::new();
    pool.push_rows(vec![pivot_row(2, 1), pivot_row(4, 1)]);

    let owner = instance(&users, &[("id", DatabaseValue::Int64(1))]);
    let relation = BelongsToMany::new(owner, roles).unwrap();

    let attached = relation.get(&pool).await.unwrap();
    assert_eq!(attached.len(), 2);

    let first = attached.first().unwrap();
    assert_eq!(first.attribute("id"), Some(&DatabaseValue::Int64(2)));
    // Pivot columns never land in the attribute bag
    assert!(first.attribute("pivot_user_id").is_none());
    assert_eq!(first.pivot_value("user_id"), Some(&DatabaseValue::Int64(1)));
    assert_eq!(first.pivot_value("role_id"), Some(&DatabaseValue::Int64(2)));
}

#[tokio::test]
async fn sync_detaches_and_attaches_the_difference() {
    let users = descriptor("User");
    let roles = descriptor("Role");
    let pool = FakePool::new();
    // Currently attached: roles 1 and 2
    pool.push_rows(vec![pivot_row(1, 1), pivot_row(2, 1)]);

    let owner = instance(&users, &[("id", DatabaseValue::Int64(1))]);
    let relation = BelongsToMany::new(owner, roles).unwrap();

    let changes = relation
        .sync(&pool, &[DatabaseValue::Int64(2), DatabaseValue::Int64(3)])
        .await
        .unwrap();

    assert_eq!(changes.detached, vec![DatabaseValue::Int64(1)]);
    assert_eq!(changes.attached, vec![DatabaseValue::Int64(3)]);
    assert!(changes.updated.is_empty());

    let queries = pool.queries();
    // One select for the current set, one delete, one insert
    assert_eq!(queries.len(), 3);
    assert_eq!(
        queries[1].sql,
        "DELETE FROM role_user WHERE user_id = ? AND role_id IN (?)"
    );
    assert_eq!(
        queries[1].bindings,
        vec![DatabaseValue::Int64(1), DatabaseValue::Int64(1)]
    );
    assert_eq!(
        queries[2].sql,
        "INSERT INTO role_user (user_id, role_id) VALUES (?, ?)"
    );
    assert_eq!(
        queries[2].bindings,
        vec![DatabaseValue::Int64(1), DatabaseValue::Int64(3)]
    );
}

#[tokio::test]
async fn sync_is_idempotent() {
    let users = descriptor("User");
    let roles = descriptor("Role");
    let pool = FakePool::new();
    pool.push_rows(vec![pivot_row(1, 1), pivot_row(2, 1)]);

    let owner = instance(&users, &[("id", DatabaseValue::Int64(1))]);
    let relation = BelongsToMany::new(owner, roles).unwrap();

    let desired = [DatabaseValue::Int64(2), DatabaseValue::Int64(3)];
    relation.sync(&pool, &desired).await.unwrap();

    // Second sync with the same set over the reconciled state
    pool.push_rows(vec![pivot_row(2, 1), pivot_row(3, 1)]);
    pool.clear_queries();
    let changes = relation.sync(&pool, &desired).await.unwrap();

    assert!(changes.attached.is_empty());
    assert!(changes.detached.is_empty());
    // Only the current-set read, no mutation statements
    assert_eq!(pool.query_count(), 1);
}

#[tokio::test]
async fn sync_deduplicates_repeated_desired_ids() {
    let users = descriptor("User");
    let roles = descriptor("Role");
    let pool = FakePool::new();
    // Nothing currently attached
    pool.push_rows(vec![]);

    let owner = instance(&users, &[("id", DatabaseValue::Int64(1))]);
    let relation = BelongsToMany::new(owner, roles).unwrap();

    let changes = relation
        .sync(&pool, &[DatabaseValue::Int64(3), DatabaseValue::Int64(3)])
        .await
        .unwrap();

    assert_eq!(changes.attached, vec![DatabaseValue::Int64(3)]);

    // One current-set read plus a single insert for the repeated ID
    let queries = pool.queries();
    assert_eq!(queries.len(), 2);
    assert!(queries[1].sql.starts_with("INSERT INTO role_user"));
}

#[tokio::test]
async fn toggle_deduplicates_repeated_ids() {
    let users = descriptor("User");
    let roles = descriptor("Role");
    let pool = FakePool::new();
    pool.push_rows(vec![pivot_row(2, 1)]);

    let owner = instance(&users, &[("id", DatabaseValue::Int64(1))]);
    let relation = BelongsToMany::new(owner, roles).unwrap();

    let changes = relation
        .toggle(&pool, &[DatabaseValue::Int64(2), DatabaseValue::Int64(2)])
        .await
        .unwrap();

    assert_eq!(changes.detached, vec![DatabaseValue::Int64(2)]);
    assert!(changes.attached.is_empty());

    // One current-set read plus a single delete
    assert_eq!(pool.query_count(), 2);
}

#[tokio::test]
async fn toggle_twice_restores_the_original_set() {
    let users = descriptor("User");
    let roles = descriptor("Role");
    let pool = FakePool::new();
    pool.push_rows(vec![pivot_row(1, 1), pivot_row(2, 1)]);

    let owner = instance(&users, &[("id", DatabaseValue::Int64(1))]);
    let relation = BelongsToMany::new(owner, roles).unwrap();

    let ids = [DatabaseValue::Int64(2), DatabaseValue::Int64(3)];
    let first = relation.toggle(&pool, &ids).await.unwrap();
    assert_eq!(first.detached, vec![DatabaseValue::Int64(2)]);
    assert_eq!(first.attached, vec![DatabaseValue::Int64(3)]);

    // State after the first toggle: {1, 3}
    pool.push_rows(vec![pivot_row(1, 1), pivot_row(3, 1)]);
    let second = relation.toggle(&pool, &ids).await.unwrap();
    assert_eq!(second.detached, vec![DatabaseValue::Int64(3)]);
    assert_eq!(second.attached, vec![DatabaseValue::Int64(2)]);
}

#[tokio::test]
async fn detach_without_ids_clears_all_rows_for_the_owner() {
    let users = descriptor("User");
    let roles = descriptor("Role");
    let pool = FakePool::new();
    pool.push_affected(4);

    let owner = instance(&users, &[("id", DatabaseValue::Int64(1))]);
    let relation = BelongsToMany::new(owner, roles).unwrap();

    let detached = relation.detach(&pool, None).await.unwrap();
    assert_eq!(detached, 4);

    let queries = pool.queries();
    assert_eq!(queries[0].sql, "DELETE FROM role_user WHERE user_id = ?");
}

#[tokio::test]
async fn associate_then_save_persists_the_foreign_key() {
    let posts = descriptor("Post");
    let users = descriptor("User");
    let pool = FakePool::new();
    pool.push_rows(vec![FakeRow::new([
        ("id", DatabaseValue::Int64(1)),
        ("user_id", DatabaseValue::Int64(5)),
    ])]);

    let mut owner = posts.new_instance();
    owner.set_attribute("user_id", DatabaseValue::Null).unwrap();
    let author = instance(&users, &[("id", DatabaseValue::Int64(5))]);

    let mut relation = BelongsTo::new(owner, users).unwrap();
    relation.associate(&author).unwrap();

    let mut owner = relation.into_owner();
    owner.save(&pool).await.unwrap();

    assert!(owner.exists());
    assert_eq!(owner.attribute("user_id"), Some(&DatabaseValue::Int64(5)));

    let queries = pool.queries();
    assert!(queries[0].sql.starts_with("INSERT INTO posts"));
    assert!(queries[0].sql.ends_with("RETURNING *"));
}

#[tokio::test]
async fn has_many_create_stamps_the_foreign_key() {
    let posts = descriptor("Post");
    let comments = descriptor("Comment");
    let pool = FakePool::new();
    pool.push_rows(vec![comment_row(10, 1)]);

    let owner = post(&posts, 1);
    let relation = HasMany::new(owner, comments).unwrap();

    let created = relation
        .create(&pool, [("body", DatabaseValue::String("hi".to_string()))])
        .await
        .unwrap();

    assert!(created.exists());
    assert_eq!(created.attribute("post_id"), Some(&DatabaseValue::Int64(1)));

    let queries = pool.queries();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].sql.starts_with("INSERT INTO comments (body, post_id)"));
}

#[tokio::test]
async fn relation_value_accessors_distinguish_variants() {
    let value = RelationValue::Many(Collection::new());
    assert!(value.as_one().is_none());
    assert!(value.as_many().is_some());
}
