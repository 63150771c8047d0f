use crumpet::{json, record, Db, FieldSpec, Instance, ModelOptions, RelationOptions, Value};
use pretty_assertions::assert_eq;
use tests::{assert_err, assert_none, assert_some, DbTest};

async fn setup() -> DbTest {
    let mut builder = Db::builder();
    builder
        .define_model("user", ModelOptions::default())
        .unwrap()
        .add_field("id", FieldSpec::integer().primary_key())
        .unwrap();
    builder
        .define_model("profile", ModelOptions::default())
        .unwrap()
        .add_field("id", FieldSpec::integer().primary_key())
        .unwrap()
        .add_field("bio", FieldSpec::text())
        .unwrap()
        .one_to_one("user", "user", RelationOptions::new().companion_field("profile"))
        .unwrap();

    DbTest::setup(builder).await
}

async fn create(test: &DbTest, model: &str) -> Instance {
    test.db()
        .model(model)
        .unwrap()
        .create(record! {})
        .await
        .unwrap()
}

#[tokio::test]
async fn foreign_key_is_unique() {
    let test = setup().await;
    assert_eq!(
        test.db().create_schema().unwrap(),
        "CREATE TABLE user(id INTEGER PRIMARY KEY); \
         CREATE TABLE profile(id INTEGER PRIMARY KEY, bio TEXT, userid INTEGER UNIQUE, \
         FOREIGN KEY (userid) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE)"
    );
}

#[tokio::test]
async fn link_from_the_storing_side() {
    let test = setup().await;

    let user = create(&test, "user").await;
    let mut profile = create(&test, "profile").await;

    let mut user_of_profile = profile.single("user").unwrap();
    assert_none!(user_of_profile.get().await.unwrap());

    let mut target = user.clone();
    user_of_profile.link(&mut target).await.unwrap();

    let linked = assert_some!(user_of_profile.get().await.unwrap());
    assert_eq!(linked.row_id(), user.row_id());

    let mut user = user;
    let found = assert_some!(user.single("profile").unwrap().get().await.unwrap());
    assert_eq!(found.row_id(), profile.row_id());
}

#[tokio::test]
async fn relink_from_the_reverse_side_moves_the_key() {
    let test = setup().await;

    let mut user = create(&test, "user").await;
    let mut first = create(&test, "profile").await;
    let mut second = create(&test, "profile").await;

    user.single("profile").unwrap().link(&mut first).await.unwrap();
    assert_eq!(first.field("userid"), Some(&Value::I64(1)));

    // The unique key is released by the first profile before the second takes it
    user.single("profile").unwrap().link(&mut second).await.unwrap();

    let profiles = test.db().model("profile").unwrap();
    assert_eq!(profiles.count(json!({"userid": 1})).await.unwrap(), 1);

    let linked = assert_some!(user.single("profile").unwrap().get().await.unwrap());
    assert_eq!(linked.row_id(), second.row_id());

    let stale = profiles.find_by_pk_checked(first.row_id().clone()).await.unwrap();
    assert_eq!(stale.field("userid"), Some(&Value::Null));

    user.single("profile").unwrap().unlink().await.unwrap();
    assert_none!(user.single("profile").unwrap().get().await.unwrap());
    assert_eq!(profiles.count(json!({"userid": null})).await.unwrap(), 2);
}

#[tokio::test]
async fn wrong_companion_model() {
    let test = setup().await;

    let mut user = create(&test, "user").await;
    let mut other_user = create(&test, "user").await;

    let err = assert_err!(user.single("profile").unwrap().link(&mut other_user).await);
    assert!(err.is_model_mismatch());
}
