//! End-to-end execution against an in-memory SQLite database.

use std::sync::Arc;

use dbweave::prelude::*;
use pretty_assertions::assert_eq;

async fn memory_db() -> WeaveDb {
    // A single connection keeps the in-memory database alive between statements.
    let db = WeaveDb::connect_with("sqlite::memory:", 1).await.unwrap();
    db.execute(&BoundStatement::new(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER)",
        vec![],
    ))
    .await
    .unwrap();
    db
}

fn users() -> Arc<TableMapping> {
    Arc::new(
        TableMapping::builder("users")
            .column(ColumnMapping::new("id", "id").primary().value_type(ValueType::BigInt))
            .column(ColumnMapping::new("name", "name").value_type(ValueType::Text))
            .column(ColumnMapping::new("age", "age").value_type(ValueType::BigInt))
            .build()
            .unwrap(),
    )
}

async fn seeded() -> (WeaveDb, LambdaTemplate) {
    let db = memory_db().await;
    let tpl = LambdaTemplate::new(DialectKind::Sqlite.strategy());
    let stmt = tpl
        .insert_mapping(users())
        .apply_map(vec![
            Row::new().with("id", 1).with("name", "ann").with("age", 31),
            Row::new().with("id", 2).with("name", "bob").with("age", 17),
            Row::new().with("id", 3).with("name", "cid").with("age", Value::Null),
        ])
        .build()
        .unwrap();
    assert_eq!(db.execute(&stmt).await.unwrap(), 3);
    (db, tpl)
}

#[tokio::test]
async fn test_insert_and_select() {
    let (db, tpl) = seeded().await;
    let stmt = tpl
        .select_mapping(users())
        .select(&["name"])
        .is_not_null("age")
        .desc(&["name"])
        .build()
        .unwrap();
    let rows = db.fetch_rows(&stmt).await.unwrap();
    let names: Vec<&WireValue> = rows.iter().map(|r| &r[0].1).collect();
    assert_eq!(
        names,
        vec![&WireValue::Text("bob".into()), &WireValue::Text("ann".into())]
    );
}

#[tokio::test]
async fn test_count_and_paging() {
    let (db, tpl) = seeded().await;
    let count = tpl.select("users").gt("id", 1).build_count().unwrap();
    assert_eq!(db.fetch_count(&count).await.unwrap(), 2);

    let page = tpl
        .select("users")
        .order_by(&["id"])
        .page(2, 1)
        .build()
        .unwrap();
    let rows = db.fetch_rows(&page).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], ("id".to_string(), WireValue::Int(3)));
}

#[tokio::test]
async fn test_update_and_delete() {
    let (db, tpl) = seeded().await;
    let update = tpl
        .update_mapping(users())
        .update_to("age", 18)
        .lt("age", 18)
        .build()
        .unwrap();
    assert_eq!(db.execute(&update).await.unwrap(), 1);

    let delete = tpl
        .delete("users")
        .is_null("age")
        .or()
        .like_right("name", "a")
        .build()
        .unwrap();
    assert_eq!(db.execute(&delete).await.unwrap(), 2);

    let remaining = db
        .fetch_entities::<Row>(
            &tpl.select_mapping(users()).build().unwrap(),
            &users(),
            &CodecRegistry::new(),
        )
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].get("name"), Some(&Value::Text("bob".into())));
    assert_eq!(remaining[0].get("age"), Some(&Value::BigInt(18)));
}
