use crumpet::{
    json, record, Db, FieldSpec, FindOptions, Instance, ModelOptions, RelationOptions, SortEntry,
    Value,
};
use pretty_assertions::assert_eq;
use tests::{assert_err, assert_none, assert_some, DbTest};

async fn setup() -> DbTest {
    let mut builder = Db::builder();
    builder
        .define_model("foo", ModelOptions::default())
        .unwrap()
        .add_field("id", FieldSpec::integer().primary_key())
        .unwrap()
        .add_field("name", FieldSpec::text())
        .unwrap();
    builder
        .define_model("bar", ModelOptions::default())
        .unwrap()
        .add_field("id", FieldSpec::integer().primary_key())
        .unwrap()
        .add_field("label", FieldSpec::text())
        .unwrap();
    builder
        .model_mut("foo")
        .unwrap()
        .one_to_many("bar", "bars", RelationOptions::new().companion_field("foo"))
        .unwrap();

    DbTest::setup(builder).await
}

async fn create(test: &DbTest, model: &str, template: crumpet::Record) -> Instance {
    test.db()
        .model(model)
        .unwrap()
        .create(template)
        .await
        .unwrap()
}

fn ids(items: &[Instance]) -> Vec<i64> {
    items
        .iter()
        .map(|item| item.row_id().as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn link_then_get_and_find() {
    let test = setup().await;

    let foo = create(&test, "foo", record! { "name" => "f" }).await;
    let other = create(&test, "foo", record! { "name" => "g" }).await;
    let mut b1 = create(&test, "bar", record! { "label" => "x" }).await;
    let mut b2 = create(&test, "bar", record! { "label" => "y" }).await;
    create(&test, "bar", record! { "label" => "z" }).await;

    foo.many("bars").unwrap().link(&mut b1).await.unwrap();
    assert_eq!(b1.field("fooid"), Some(&Value::I64(1)));

    b2.single("foo").unwrap().link_by_pk(1).await.unwrap();
    assert_eq!(b2.field("fooid"), Some(&Value::I64(1)));

    let owner = assert_some!(b1.single("foo").unwrap().get().await.unwrap());
    assert_eq!(owner.row_id(), foo.row_id());

    let bars = foo.many("bars").unwrap();
    let found = bars
        .find(FindOptions::new().sort(SortEntry::asc("id")))
        .await
        .unwrap();
    assert_eq!(ids(&found.items), [1, 2]);

    let found = bars.find(json!({"label": "y"})).await.unwrap();
    assert_eq!(ids(&found.items), [2]);
    assert_eq!(bars.count(json!({})).await.unwrap(), 2);

    assert!(other.many("bars").unwrap().find(json!({})).await.unwrap().is_empty());
}

#[tokio::test]
async fn link_by_pk_and_unlink() {
    let test = setup().await;

    let foo = create(&test, "foo", record! { "name" => "f" }).await;
    for label in ["a", "b", "c", "d"] {
        create(&test, "bar", record! { "label" => label }).await;
    }

    let bars = foo.many("bars").unwrap();
    assert_eq!(bars.link_by_pk([1, 2, 3, 4]).await.unwrap(), 4);
    assert_eq!(bars.link_by_pk(Vec::<i64>::new()).await.unwrap(), 0);

    assert_eq!(bars.unlink_by_pk([1]).await.unwrap(), 1);
    assert_eq!(bars.unlink_where(json!({"label": {"$in": ["b", "c"]}})).await.unwrap(), 2);

    let found = bars.find(json!({})).await.unwrap();
    assert_eq!(ids(&found.items), [4]);

    assert_eq!(bars.unlink_all().await.unwrap(), 1);
    assert_eq!(bars.count(json!({})).await.unwrap(), 0);

    // Unlinked rows stay
    assert_eq!(test.db().model("bar").unwrap().count(json!({})).await.unwrap(), 4);
}

#[tokio::test]
async fn unlink_single_side() {
    let test = setup().await;

    create(&test, "foo", record! { "name" => "f" }).await;
    let mut bar = create(&test, "bar", record! { "label" => "x", "fooid" => 1 }).await;

    let mut foo = bar.single("foo").unwrap();
    assert_some!(foo.get().await.unwrap());

    foo.unlink().await.unwrap();
    assert_none!(foo.get().await.unwrap());
    assert_eq!(bar.field("fooid"), Some(&Value::Null));

    let stored = test.db().model("bar").unwrap().find_by_pk_checked(1).await.unwrap();
    assert_eq!(stored.field("fooid"), Some(&Value::Null));
}

#[tokio::test]
async fn search_across_the_relation() {
    let test = setup().await;

    let foo = create(&test, "foo", record! { "name" => "f" }).await;
    create(&test, "foo", record! { "name" => "g" }).await;
    for label in ["a", "b", "c"] {
        create(&test, "bar", record! { "label" => label }).await;
    }
    foo.many("bars").unwrap().link_by_pk([1, 2]).await.unwrap();

    let foos = test.db().model("foo").unwrap();

    // Both bars match; the owner is returned once
    let found = foos
        .find(
            FindOptions::new()
                .filter(json!({"bars$label": {"$in": ["a", "b"]}}))
                .with_count(),
        )
        .await
        .unwrap();
    assert_eq!(ids(&found.items), [1]);
    assert_eq!(found.total_count, Some(1));

    let bars = test.db().model("bar").unwrap();
    let found = bars.find(json!({"foo$name": "f"})).await.unwrap();
    assert_eq!(ids(&found.items), [1, 2]);

    // Update through a join runs as a key subquery
    let changed = bars
        .update(record! { "label" => "owned" }, json!({"foo$name": "f"}))
        .await
        .unwrap();
    assert_eq!(changed, 2);

    let removed = bars.remove(json!({"foo$name": "f"})).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(bars.count(json!({})).await.unwrap(), 1);
}

#[tokio::test]
async fn join_single_relation_in_find() {
    let test = setup().await;

    create(&test, "foo", record! { "name" => "f" }).await;
    create(&test, "bar", record! { "label" => "x", "fooid" => 1 }).await;
    create(&test, "bar", record! { "label" => "y" }).await;

    let found = test
        .db()
        .model("bar")
        .unwrap()
        .find(FindOptions::new().join("foo").sort(SortEntry::asc("id")))
        .await
        .unwrap();

    assert_eq!(found.joined.len(), 2);

    let foo = assert_some!(found.joined[0]["foo"].as_ref());
    assert_eq!(foo.field("name"), Some(&Value::from("f")));
    assert_none!(found.joined[1]["foo"].as_ref());

    let err = assert_err!(
        test.db()
            .model("foo")
            .unwrap()
            .find(FindOptions::new().join("bars"))
            .await
    );
    assert!(err.is_invalid_criteria());
}

#[tokio::test]
async fn accessor_guards() {
    let test = setup().await;

    let foo = create(&test, "foo", record! { "name" => "f" }).await;
    let mut other_foo = create(&test, "foo", record! { "name" => "g" }).await;
    let mut unsaved = test.db().model("bar").unwrap().build(record! { "label" => "x" });

    let bars = foo.many("bars").unwrap();

    let err = assert_err!(bars.link(&mut unsaved).await);
    assert!(err.is_instance_invalid());

    let err = assert_err!(bars.link(&mut other_foo).await);
    assert!(err.is_model_mismatch());

    let unsaved_foo = test.db().model("foo").unwrap().build(record! {});
    let err = assert_err!(unsaved_foo.many("bars").unwrap().link_by_pk([1]).await);
    assert!(err.is_instance_invalid());

    let err = assert_err!(unsaved_foo.many("bars").unwrap().find(json!({})).await);
    assert!(err.is_instance_invalid());
}
