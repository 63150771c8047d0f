use crumpet::{
    json, record, Db, FieldSpec, FindOptions, Instance, ManyToManyOptions, ModelOptions,
    SortEntry, Value,
};
use pretty_assertions::assert_eq;
use tests::{assert_err, DbTest};

async fn setup() -> DbTest {
    let mut builder = Db::builder();
    builder
        .define_model("user", ModelOptions::default())
        .unwrap()
        .add_field("id", FieldSpec::integer().primary_key())
        .unwrap()
        .add_field("name", FieldSpec::text())
        .unwrap();
    builder
        .define_model("team", ModelOptions::default())
        .unwrap()
        .add_field("id", FieldSpec::integer().primary_key())
        .unwrap()
        .add_field("title", FieldSpec::text())
        .unwrap();
    builder
        .define_model("membership", ModelOptions::default())
        .unwrap()
        .add_field("role", FieldSpec::text())
        .unwrap();
    builder
        .model_mut("user")
        .unwrap()
        .many_to_many(
            "team",
            "teams",
            ManyToManyOptions::new().pivot("membership").companion_field("members"),
        )
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
async fn pivot_schema() {
    let test = setup().await;

    assert_eq!(
        test.db().create_schema().unwrap(),
        "CREATE TABLE user(id INTEGER PRIMARY KEY, name TEXT); \
         CREATE TABLE team(id INTEGER PRIMARY KEY, title TEXT); \
         CREATE TABLE membership(role TEXT, userid INTEGER, teamid INTEGER, \
         FOREIGN KEY (userid) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE, \
         FOREIGN KEY (teamid) REFERENCES team(id) ON UPDATE CASCADE ON DELETE CASCADE, \
         UNIQUE(userid, teamid))"
    );
}

#[tokio::test]
async fn find_returns_items_and_pivot_rows() {
    let test = setup().await;

    let user = create(&test, "user", record! { "name" => "alice" }).await;
    for title in ["red", "green", "blue"] {
        create(&test, "team", record! { "title" => title }).await;
    }

    let teams = user.multi("teams").unwrap();
    let linked = teams
        .link_by_pk_using([1, 3], record! { "role" => "admin" })
        .await
        .unwrap();
    assert_eq!(linked, 2);
    assert_eq!(teams.link_by_pk([2]).await.unwrap(), 1);

    let found = teams.find(json!({})).await.unwrap();
    assert_eq!(found.items.len(), 3);
    assert_eq!(found.relation_items.len(), 3);

    for (team, membership) in found.items.iter().zip(&found.relation_items) {
        assert_eq!(membership.field("teamid"), Some(team.row_id()));
        assert_eq!(membership.field("userid"), Some(&Value::I64(1)));
        assert!(membership.is_created());
    }

    let admins = teams
        .find(
            FindOptions::new()
                .filter(json!({"role": "admin"}))
                .sort(SortEntry::desc("teamid"))
                .with_count(),
        )
        .await
        .unwrap();
    assert_eq!(ids(&admins.items), [3, 1]);
    assert_eq!(admins.total_count, Some(2));

    // Reverse side sees the same pairs
    let blue = test
        .db()
        .model("team")
        .unwrap()
        .find_by_pk_checked(3)
        .await
        .unwrap();
    let members = blue.multi("members").unwrap().find(json!({})).await.unwrap();
    assert_eq!(ids(&members.items), [1]);
    assert_eq!(members.items[0].field("name"), Some(&Value::from("alice")));

    // Linking twice violates the pair constraint
    let err = assert_err!(blue.multi("members").unwrap().link(&user).await);
    assert!(err.is_driver());
}

#[tokio::test]
async fn search_owners_by_pivot_field_without_duplicates() {
    let test = setup().await;

    for name in ["alice", "bob", "carol"] {
        create(&test, "user", record! { "name" => name }).await;
    }
    for title in ["red", "green"] {
        create(&test, "team", record! { "title" => title }).await;
    }

    let users = test.db().model("user").unwrap();
    let alice = users.find_by_pk_checked(1).await.unwrap();
    let bob = users.find_by_pk_checked(2).await.unwrap();

    // alice is an admin of both teams
    alice
        .multi("teams")
        .unwrap()
        .link_by_pk_using([1, 2], record! { "role" => "admin" })
        .await
        .unwrap();
    bob.multi("teams")
        .unwrap()
        .link_by_pk_using([1], record! { "role" => "member" })
        .await
        .unwrap();

    let found = users
        .find(FindOptions::new().filter(json!({"teams$role": "admin"})).with_count())
        .await
        .unwrap();
    assert_eq!(ids(&found.items), [1]);
    assert_eq!(found.total_count, Some(1));

    let found = users
        .find(
            FindOptions::new()
                .filter(json!({"teams$title": "red"}))
                .sort(SortEntry::asc("id")),
        )
        .await
        .unwrap();
    assert_eq!(ids(&found.items), [1, 2]);
}

#[tokio::test]
async fn unlink_variants() {
    let test = setup().await;

    let user = create(&test, "user", record! { "name" => "alice" }).await;
    for title in ["red", "green", "blue", "black"] {
        create(&test, "team", record! { "title" => title }).await;
    }

    let teams = user.multi("teams").unwrap();
    teams.link_by_pk([1, 2, 3, 4]).await.unwrap();

    assert_eq!(teams.unlink_by_pk([1]).await.unwrap(), 1);
    let unlinked = teams
        .unlink_where(json!({"title": {"$glob": "bl*"}}))
        .await
        .unwrap();
    assert_eq!(unlinked, 2);
    assert_eq!(ids(&teams.find(json!({})).await.unwrap().items), [2]);

    assert_eq!(teams.unlink_all().await.unwrap(), 1);
    assert!(teams.find(json!({})).await.unwrap().is_empty());

    // Only pivot rows are removed
    assert_eq!(test.db().model("team").unwrap().count(json!({})).await.unwrap(), 4);
}

#[tokio::test]
async fn find_rejects_joins_and_owner_key() {
    let test = setup().await;

    let user = create(&test, "user", record! { "name" => "alice" }).await;
    let teams = user.multi("teams").unwrap();

    let err = assert_err!(teams.find(FindOptions::new().join("members")).await);
    assert!(err.is_invalid_criteria());

    let err = assert_err!(teams.find(json!({"userid": 2})).await);
    assert!(err.is_invalid_criteria());

    let err = assert_err!(teams.find(json!({"$and": {"userid": 2}})).await);
    assert!(err.is_invalid_criteria());

    let err = assert_err!(teams.find(json!({"$or": [{"userid": 2}]})).await);
    assert!(err.is_invalid_criteria());
    assert_eq!(test.log().count("SELECT"), 0);

    let other = create(&test, "user", record! { "name" => "bob" }).await;
    let err = assert_err!(teams.link(&other).await);
    assert!(err.is_model_mismatch());
}
