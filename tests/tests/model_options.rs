use crumpet::{json, record, Db, FieldSpec, FindOptions, ModelOptions, SortEntry, Value};
use pretty_assertions::assert_eq;
use tests::DbTest;

async fn setup() -> DbTest {
    let mut builder = Db::builder();
    builder
        .define_model(
            "note",
            ModelOptions::default()
                .timestamps(true, true)
                .default_sort(SortEntry::asc("title")),
        )
        .unwrap()
        .add_field("title", FieldSpec::text())
        .unwrap()
        .add_field("rank", FieldSpec::integer())
        .unwrap();

    DbTest::setup(builder).await
}

fn titles(result: &crumpet::FindResult) -> Vec<&str> {
    result
        .items
        .iter()
        .map(|item| item.field("title").and_then(Value::as_str).unwrap())
        .collect()
}

fn millis(instance: &crumpet::Instance, field: &str) -> i64 {
    instance.field(field).and_then(Value::as_i64).unwrap()
}

#[tokio::test]
async fn timestamps_are_maintained() {
    let test = setup().await;
    let notes = test.db().model("note").unwrap();

    let mut note = notes.build(record! { "title" => "a" });
    let created_at = millis(&note, "created_at");
    assert!(created_at > 0);

    note.flush().await.unwrap();
    let first_update = millis(&note, "updated_at");
    assert!(first_update >= created_at);

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    note.set("rank", 1).unwrap();
    note.flush_fields(&["rank"]).await.unwrap();

    let stored = notes.find_by_pk_checked(note.row_id().clone()).await.unwrap();
    assert_eq!(millis(&stored, "created_at"), created_at);
    assert!(millis(&stored, "updated_at") > first_update);

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    notes
        .update(record! { "rank" => 2 }, json!({"title": "a"}))
        .await
        .unwrap();

    let restored = notes.find_by_pk_checked(note.row_id().clone()).await.unwrap();
    assert!(millis(&restored, "updated_at") > millis(&stored, "updated_at"));
}

#[tokio::test]
async fn implicit_row_ids() {
    let test = setup().await;
    let notes = test.db().model("note").unwrap();

    let first = notes.create(record! { "title" => "a" }).await.unwrap();
    let second = notes.create(record! { "title" => "b" }).await.unwrap();

    assert_eq!(first.row_id(), &Value::I64(1));
    assert_eq!(second.row_id(), &Value::I64(2));

    let found = notes.find_by_pk_checked(2).await.unwrap();
    assert_eq!(found.field("title"), Some(&Value::from("b")));
    assert!(!found.has("rowid"));
}

#[tokio::test]
async fn default_sort_applies_after_explicit_entries() {
    let test = setup().await;
    let notes = test.db().model("note").unwrap();

    for (title, rank) in [("c", 1), ("a", 2), ("B", 1)] {
        notes
            .create(record! { "title" => title, "rank" => rank })
            .await
            .unwrap();
    }

    let found = notes.find(json!({})).await.unwrap();
    assert_eq!(titles(&found), ["a", "B", "c"]);

    let found = notes
        .find(FindOptions::new().sort(SortEntry::asc("rank")))
        .await
        .unwrap();
    assert_eq!(titles(&found), ["B", "c", "a"]);

    // An explicit entry on the same field replaces the default
    let found = notes
        .find(FindOptions::new().sort(SortEntry::desc("title")))
        .await
        .unwrap();
    assert_eq!(titles(&found), ["c", "B", "a"]);
}
