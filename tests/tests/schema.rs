use crumpet::{json, record, Db, FieldSpec, FieldType, ModelOptions, RelationOptions, Value};
use pretty_assertions::assert_eq;
use tests::{assert_err, DbTest};

fn foo_builder() -> crumpet::Builder {
    let mut builder = Db::builder();
    builder
        .define_model("foo", ModelOptions::default())
        .unwrap()
        .add_field("id", FieldSpec::integer().primary_key())
        .unwrap()
        .add_field("name", FieldSpec::text().unique())
        .unwrap();
    builder
}

#[test]
fn create_schema_follows_definition_order() {
    let mut builder = Db::builder();
    builder
        .define_model("person", ModelOptions::default())
        .unwrap()
        .add_field("id", FieldSpec::integer().primary_key())
        .unwrap()
        .add_field("email", FieldSpec::text().unique().collate("NOCASE").not_null())
        .unwrap()
        .add_field("score", FieldSpec::real().default_value(1.5))
        .unwrap()
        .add_field(
            "status",
            FieldSpec::of_type(FieldType::Custom("VARCHAR(8)".into())).default_value("new"),
        )
        .unwrap()
        .add_field("extra", FieldSpec::new())
        .unwrap()
        .add_unique(&["email", "status"])
        .unwrap();
    builder
        .define_model("pet", ModelOptions::default())
        .unwrap()
        .add_field("id", FieldSpec::integer().primary_key())
        .unwrap()
        .many_to_one("person", "owner", RelationOptions::new())
        .unwrap();

    let db = builder.build();

    assert_eq!(
        db.create_schema().unwrap(),
        "CREATE TABLE person(\
         id INTEGER PRIMARY KEY, \
         email TEXT UNIQUE COLLATE NOCASE NOT NULL, \
         score REAL DEFAULT 1.5, \
         status VARCHAR(8) DEFAULT 'new', \
         extra, \
         UNIQUE(email, status)); \
         CREATE TABLE pet(\
         id INTEGER PRIMARY KEY, \
         personid INTEGER, \
         FOREIGN KEY (personid) REFERENCES person(id) ON UPDATE CASCADE ON DELETE CASCADE)"
    );

    // Deterministic
    assert_eq!(db.create_schema().unwrap(), db.create_schema().unwrap());
}

#[test]
fn two_primary_keys_fail_only_at_emission() {
    let mut builder = Db::builder();

    // Declaring both keys is accepted
    builder
        .define_model("foo", ModelOptions::default())
        .unwrap()
        .add_field("a", FieldSpec::integer().primary_key())
        .unwrap()
        .add_field("b", FieldSpec::integer().primary_key())
        .unwrap();

    let db = builder.build();
    let err = assert_err!(db.create_schema());
    assert!(err.is_invalid_schema());
}

#[tokio::test]
async fn schema_is_flushed_once() {
    let test = DbTest::setup(foo_builder()).await;

    let err = assert_err!(test.db().flush_schema().await);
    assert!(err.is_schema_already_flushed());
    assert!(test.log().is_empty());
}

#[tokio::test]
async fn end_to_end() {
    let test = DbTest::setup(foo_builder()).await;
    let db = test.db();

    assert_eq!(
        db.create_schema().unwrap(),
        "CREATE TABLE foo(id INTEGER PRIMARY KEY, name TEXT UNIQUE)"
    );

    let foo = db.model("foo").unwrap();
    let mut instance = foo.build(record! { "id" => 1, "name" => "a" });
    instance.flush().await.unwrap();

    let found = foo.find(json!({"name": "a"})).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found.items[0].field("id"), Some(&Value::I64(1)));
}

#[tokio::test]
async fn connect_by_url() {
    let db = foo_builder().connect("sqlite::memory:").await.unwrap();
    assert!(db.connection_is_set().await);

    db.flush_schema().await.unwrap();
    db.model("foo")
        .unwrap()
        .create(record! { "name" => "a" })
        .await
        .unwrap();

    db.release_connection().await.unwrap();
    assert!(!db.connection_is_set().await);

    let err = assert_err!(db.model("foo").unwrap().count(json!({})).await);
    assert!(err.is_not_connected());
}

#[tokio::test]
async fn bad_connection_urls() {
    let err = assert_err!(foo_builder().connect("mysql://localhost/foo").await);
    assert!(err.is_invalid_connection_url());

    let err = assert_err!(foo_builder().connect("nope").await);
    assert!(err.is_invalid_connection_url());
}
