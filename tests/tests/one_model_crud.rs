use crumpet::{
    json, record, Db, FieldSpec, FindOptions, ModelHandle, ModelOptions, SortEntry, Value,
};
use pretty_assertions::assert_eq;
use tests::{assert_err, assert_none, assert_ok, assert_some, DbTest};

async fn setup() -> DbTest {
    let mut builder = Db::builder();
    builder
        .define_model("user", ModelOptions::default())
        .unwrap()
        .add_field("id", FieldSpec::integer().primary_key())
        .unwrap()
        .add_field("name", FieldSpec::text().not_null())
        .unwrap()
        .add_field("age", FieldSpec::integer())
        .unwrap()
        .add_field(
            "email",
            FieldSpec::text().validate(|value| value.as_str().is_some_and(|s| s.contains('@'))),
        )
        .unwrap()
        .add_field(
            "tags",
            FieldSpec::text()
                .serialize(|value| match value {
                    Value::Json(json) => Value::String(json.to_string()),
                    other => other,
                })
                .deserialize(|value| match value {
                    Value::String(s) => serde_json::from_str(&s)
                        .map(Value::Json)
                        .unwrap_or(Value::String(s)),
                    other => other,
                }),
        )
        .unwrap();

    DbTest::setup(builder).await
}

async fn seed(users: &ModelHandle) {
    for (name, age) in [("alice", 30), ("Bob", 25), ("carol", 35), ("dave", 25)] {
        users
            .create(record! { "name" => name, "age" => age })
            .await
            .unwrap();
    }
}

fn names(items: &[crumpet::Instance]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.field("name").and_then(Value::as_str).unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn flush_then_find_by_pk_round_trips() {
    let test = setup().await;
    let users = test.db().model("user").unwrap();

    let mut user = users.build(record! {
        "name" => "alice",
        "email" => "alice@example.com",
        "tags" => json!(["a", "b"]),
    });
    assert!(!user.is_created());

    user.flush().await.unwrap();
    assert!(user.is_created());
    assert_eq!(user.row_id(), &Value::I64(1));
    assert_eq!(user.field("id"), Some(&Value::I64(1)));

    let found = assert_some!(users.find_by_pk(1).await.unwrap());
    assert!(found.is_created());
    assert_eq!(found.fields(), user.fields());
    assert_eq!(found.field("tags"), Some(&Value::Json(json!(["a", "b"]))));
}

#[tokio::test]
async fn flush_updates_created_instances() {
    let test = setup().await;
    let users = test.db().model("user").unwrap();

    let mut user = users.create(record! { "name" => "alice", "age" => 1 }).await.unwrap();

    user.set("age", 2).unwrap();
    user.set("name", "alicia").unwrap();
    user.flush_fields(&["age"]).await.unwrap();

    let found = users.find_by_pk_checked(user.row_id().clone()).await.unwrap();
    assert_eq!(found.field("age"), Some(&Value::I64(2)));
    assert_eq!(found.field("name"), Some(&Value::from("alice")));

    user.flush().await.unwrap();
    let found = users.find_by_pk_checked(1).await.unwrap();
    assert_eq!(found.field("name"), Some(&Value::from("alicia")));

    let err = assert_err!(user.flush_fields(&["nope"]).await);
    assert!(err.is_unknown_field());
}

#[tokio::test]
async fn validation_runs_at_flush() {
    let test = setup().await;
    let users = test.db().model("user").unwrap();

    // Building never validates
    let mut user = users.build(record! { "name" => "x", "email" => "nope" });

    let err = assert_err!(user.flush().await);
    assert!(err.is_validation());
    assert!(!user.is_created());
    assert!(test.log().is_empty());
}

#[tokio::test]
async fn remove_instance() {
    let test = setup().await;
    let users = test.db().model("user").unwrap();

    let mut user = users.create(record! { "name" => "alice" }).await.unwrap();
    user.remove().await.unwrap();

    assert!(!user.is_created());
    assert!(user.row_id().is_null());
    assert_none!(users.find_by_pk(1).await.unwrap());

    let err = assert_err!(users.find_by_pk_checked(1).await);
    assert!(err.is_record_not_found());
}

#[tokio::test]
async fn single_element_in_matches_eq() {
    let test = setup().await;
    let users = test.db().model("user").unwrap();
    seed(&users).await;

    let by_in = users.find(json!({"age": {"$in": [25]}})).await.unwrap();
    let by_eq = users.find(json!({"age": {"$eq": 25}})).await.unwrap();
    assert_eq!(names(&by_in.items), names(&by_eq.items));
    assert_eq!(by_in.len(), 2);

    let by_notin = users.find(json!({"age": {"$notin": [25]}})).await.unwrap();
    let by_ne = users.find(json!({"age": {"$ne": 25}})).await.unwrap();
    assert_eq!(names(&by_notin.items), names(&by_ne.items));
    assert_eq!(by_notin.len(), 2);

    let many = users.find(json!({"age": {"$in": [25, 30]}})).await.unwrap();
    assert_eq!(many.len(), 3);

    let err = assert_err!(users.find(json!({"age": {"$in": []}})).await);
    assert!(err.is_invalid_criteria());
}

#[tokio::test]
async fn operators_and_logical_groups() {
    let test = setup().await;
    let users = test.db().model("user").unwrap();
    seed(&users).await;

    let found = users
        .find(json!({"$or": [{"age": {"$gt": 30}}, {"name": {"$like": "a%"}}]}))
        .await
        .unwrap();
    assert_eq!(names(&found.items), ["alice", "carol"]);

    let found = users
        .find(json!({"age": {"$gte": 25, "$lt": 30}, "name": {"$glob": "d*"}}))
        .await
        .unwrap();
    assert_eq!(names(&found.items), ["dave"]);

    let found = users.find(json!({"email": null})).await.unwrap();
    assert_eq!(found.len(), 4);

    // An empty alternative matches every row
    let found = users.find(json!({"$or": [{}, {"id": 99}]})).await.unwrap();
    assert_eq!(found.len(), 4);
    assert_eq!(users.count(json!({"$or": [{"$and": {}}, {"id": 99}]})).await.unwrap(), 4);

    let err = assert_err!(users.find(json!({"age": {"$between": [1, 2]}})).await);
    assert!(err.is_unknown_operator());

    let err = assert_err!(users.find(json!({"nope": 1})).await);
    assert!(err.is_unknown_field());
}

#[tokio::test]
async fn sort_limit_offset_and_count() {
    let test = setup().await;
    let users = test.db().model("user").unwrap();
    seed(&users).await;

    // Case-insensitive by default
    let found = users
        .find(FindOptions::new().sort(SortEntry::asc("name")))
        .await
        .unwrap();
    assert_eq!(names(&found.items), ["alice", "Bob", "carol", "dave"]);

    let found = users
        .find(FindOptions::new().sort(SortEntry::asc("name").case_sensitive()))
        .await
        .unwrap();
    assert_eq!(names(&found.items), ["Bob", "alice", "carol", "dave"]);

    let found = users
        .find(
            FindOptions::new()
                .filter(json!({"age": {"$lte": 30}}))
                .sort(SortEntry::desc("age"))
                .sort(SortEntry::asc("name"))
                .limit(2)
                .offset(1)
                .with_count(),
        )
        .await
        .unwrap();
    assert_eq!(names(&found.items), ["Bob", "dave"]);
    assert_eq!(found.total_count, Some(3));

    // Offset alone
    let found = users
        .find(FindOptions::new().sort(SortEntry::asc("id")).offset(3))
        .await
        .unwrap();
    assert_eq!(names(&found.items), ["dave"]);

    let first = assert_some!(users
        .find_one(FindOptions::new().sort(SortEntry::desc("age")))
        .await
        .unwrap());
    assert_eq!(first.field("name"), Some(&Value::from("carol")));

    let err = assert_err!(users.find_one_checked(json!({"name": "zed"})).await);
    assert!(err.is_record_not_found());
}

#[tokio::test]
async fn model_level_update_remove_and_count() {
    let test = setup().await;
    let users = test.db().model("user").unwrap();
    seed(&users).await;

    assert_eq!(users.count(json!({})).await.unwrap(), 4);
    assert_eq!(users.count(json!({"age": 25})).await.unwrap(), 2);

    let changed = users
        .update(record! { "age" => 26 }, json!({"age": 25}))
        .await
        .unwrap();
    assert_eq!(changed, 2);
    assert_eq!(users.count(json!({"age": 26})).await.unwrap(), 2);

    // Nothing to assign, nothing executed
    test.log().clear();
    assert_eq!(users.update(record! {}, json!({})).await.unwrap(), 0);
    assert!(test.log().is_empty());

    assert_eq!(users.remove(json!({"name": "dave"})).await.unwrap(), 1);
    assert_eq!(users.count(json!({})).await.unwrap(), 3);

    assert_eq!(users.remove_all().await.unwrap(), 3);
    assert_eq!(users.count(json!({})).await.unwrap(), 0);
}

#[tokio::test]
async fn remove_with_empty_criteria_fails_without_delete() {
    let test = setup().await;
    let users = test.db().model("user").unwrap();
    seed(&users).await;
    test.log().clear();

    let err = assert_err!(users.remove(json!({})).await);
    assert!(err.is_empty_criteria());
    assert!(!test.log().has_delete());

    assert_eq!(assert_ok!(users.count(json!({})).await), 4);
}

#[tokio::test]
async fn constraint_violations_come_from_the_driver() {
    let test = setup().await;
    let users = test.db().model("user").unwrap();

    users.create(record! { "id" => 1, "name" => "a" }).await.unwrap();

    let err = assert_err!(users.create(record! { "id" => 1, "name" => "b" }).await);
    assert!(err.is_driver());

    // name is NOT NULL
    let err = assert_err!(users.create(record! {}).await);
    assert!(err.is_driver());
}

async fn setup_with_defaults() -> DbTest {
    let mut builder = Db::builder();
    builder
        .define_model("counter", ModelOptions::default())
        .unwrap()
        .add_field("id", FieldSpec::integer().primary_key())
        .unwrap()
        .add_field("n", FieldSpec::integer().default_value(5))
        .unwrap()
        .add_field("label", FieldSpec::text().generate(|_| Value::from("gen")))
        .unwrap();

    DbTest::setup(builder).await
}

#[tokio::test]
async fn explicit_null_overrides_column_default() {
    let test = setup_with_defaults().await;
    let counters = test.db().model("counter").unwrap();

    let mut counter = counters.build(record! { "id" => 1, "n" => Value::Null });
    counter.flush().await.unwrap();
    assert_eq!(counter.field("n"), Some(&Value::Null));

    let found = counters.find_by_pk_checked(1).await.unwrap();
    assert_eq!(found.field("n"), Some(&Value::Null));
    assert_eq!(found.fields(), counter.fields());
}

#[tokio::test]
async fn unassigned_fields_take_column_default() {
    let test = setup_with_defaults().await;
    let counters = test.db().model("counter").unwrap();

    let mut counter = counters.build(record! { "id" => 1 });
    assert_eq!(counter.field("n"), Some(&Value::Null));

    counter.flush().await.unwrap();
    assert_eq!(counter.field("n"), Some(&Value::I64(5)));

    let found = counters.find_by_pk_checked(1).await.unwrap();
    assert_eq!(found.fields(), counter.fields());

    // Assigning after build counts as an explicit value
    let mut other = counters.build(record! { "id" => 2 });
    other.set("n", Value::Null).unwrap();
    other.flush().await.unwrap();

    let found = counters.find_by_pk_checked(2).await.unwrap();
    assert_eq!(found.field("n"), Some(&Value::Null));
}

#[tokio::test]
async fn explicit_null_skips_generator() {
    let test = setup_with_defaults().await;
    let counters = test.db().model("counter").unwrap();

    let generated = counters.build(record! { "id" => 1 });
    assert_eq!(generated.field("label"), Some(&Value::from("gen")));

    let mut explicit = counters.build(record! { "id" => 2, "label" => Value::Null });
    assert_eq!(explicit.field("label"), Some(&Value::Null));

    explicit.flush().await.unwrap();
    let found = counters.find_by_pk_checked(2).await.unwrap();
    assert_eq!(found.field("label"), Some(&Value::Null));
}
