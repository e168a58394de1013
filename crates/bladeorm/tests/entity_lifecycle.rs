//! Instance lifecycle against a recording pool: insert, load, dirty update,
//! identity re-snapshot and delete.

mod common;

use bladeorm::prelude::*;
use common::{client, person, person_row, text};

#[tokio::test]
async fn save_new_instance_inserts_every_value() -> OrmResult<()> {
    let (pool, mut client) = client();
    let person = person(&mut client);

    let mut john = person.create([("name", Value::from("John")), ("age", Value::from(20))])?;
    assert!(!john.is_saved());

    assert_eq!(john.save().await?, SaveOutcome::Inserted);
    assert_eq!(
        pool.last(),
        (
            "INSERT INTO persons (name,age) VALUES ($1,$2)".to_string(),
            vec![text("John"), Value::Int(20)]
        )
    );
    assert!(john.is_saved());
    assert_eq!(john.original_identity(), Some(&text("John")));
    Ok(())
}

#[tokio::test]
async fn fetch_one_loads_saved_instance() -> OrmResult<()> {
    let (pool, mut client) = client();
    let person = person(&mut client);
    pool.queue_rows(vec![person_row("John", 20)]);

    let john = person
        .filter(person.col("name")?.eq("John")?)
        .fetch_one()
        .await?
        .expect("row");

    assert_eq!(
        pool.last(),
        (
            "SELECT * FROM persons WHERE persons.name = $1 LIMIT 1".to_string(),
            vec![text("John")]
        )
    );
    assert!(john.is_saved());
    assert!(!john.is_dirty());
    assert_eq!(john.get("age")?, Some(&Value::Int(20)));
    assert_eq!(john.original_identity(), Some(&text("John")));
    Ok(())
}

#[tokio::test]
async fn save_updates_only_dirty_columns_once() -> OrmResult<()> {
    let (pool, mut client) = client();
    let person = person(&mut client);
    let mut john = person.from_record(person_row("John", 20));

    john.set("age", 21)?;
    assert_eq!(john.dirty_columns(), ["age"]);

    assert_eq!(john.save().await?, SaveOutcome::Updated(1));
    assert_eq!(
        pool.last(),
        (
            "UPDATE persons SET age=$1 WHERE persons.name = $2".to_string(),
            vec![Value::Int(21), text("John")]
        )
    );
    assert!(!john.is_dirty());

    let before = pool.statement_count();
    assert_eq!(john.save().await?, SaveOutcome::Unchanged);
    assert_eq!(pool.statement_count(), before);
    Ok(())
}

#[tokio::test]
async fn changed_identity_is_resnapshotted_after_save() -> OrmResult<()> {
    let (pool, mut client) = client();
    let person = person(&mut client);
    let mut john = person.from_record(person_row("John", 20));

    john.set("name", "Johnny")?;
    john.save().await?;
    assert_eq!(
        pool.last(),
        (
            "UPDATE persons SET name=$1 WHERE persons.name = $2".to_string(),
            vec![text("Johnny"), text("John")]
        )
    );
    assert_eq!(john.original_identity(), Some(&text("Johnny")));

    john.set("age", 30)?;
    john.save().await?;
    assert_eq!(
        pool.last(),
        (
            "UPDATE persons SET age=$1 WHERE persons.name = $2".to_string(),
            vec![Value::Int(30), text("Johnny")]
        )
    );
    Ok(())
}

#[tokio::test]
async fn delete_targets_original_identity() -> OrmResult<()> {
    let (pool, mut client) = client();
    let person = person(&mut client);
    let mut john = person.from_record(person_row("John", 20));

    john.set("name", "Someone else")?;
    assert_eq!(john.delete().await?, 1);
    assert_eq!(
        pool.last(),
        (
            "DELETE FROM persons WHERE persons.name = $1".to_string(),
            vec![text("John")]
        )
    );
    assert!(!john.is_saved());
    assert!(john.original_identity().is_none());

    // A deleted instance can be inserted again.
    assert_eq!(john.save().await?, SaveOutcome::Inserted);
    assert!(pool.last().0.starts_with("INSERT INTO persons"));
    Ok(())
}

#[tokio::test]
async fn delete_unsaved_is_state_error() -> OrmResult<()> {
    let (pool, mut client) = client();
    let person = person(&mut client);
    let mut john = person.create([("name", "John")])?;

    let err = john.delete().await.unwrap_err();
    assert!(err.is_state());
    assert_eq!(pool.statement_count(), 0);
    Ok(())
}

#[tokio::test]
async fn saved_instance_without_identity_cannot_update() -> OrmResult<()> {
    let (pool, mut client) = client();
    let log = client.register(EntityShape::new("Log").column("message", Column::text()))?;
    let mut entry = log.from_record(Record::new().with("message", "hello"));

    entry.set("message", "bye")?;
    assert!(entry.save().await.unwrap_err().is_state());
    assert!(entry.delete().await.unwrap_err().is_state());
    assert_eq!(pool.statement_count(), 0);
    Ok(())
}

#[tokio::test]
async fn writes_to_unsaved_instance_are_not_dirty() -> OrmResult<()> {
    let (_pool, mut client) = client();
    let person = person(&mut client);
    let mut john = person.new_instance();
    john.set("name", "John")?;
    john.set("age", 3)?;
    assert!(!john.is_dirty());
    assert_eq!(john.get("age")?, Some(&Value::Int(3)));
    Ok(())
}

#[tokio::test]
async fn set_rejects_bad_writes() -> OrmResult<()> {
    let (_pool, mut client) = client();
    let person = client.register(
        EntityShape::new("Person")
            .column("name", Column::text().primary_key())
            .column(
                "age",
                Column::integer().with_check(|v| v.as_i64().is_none_or(|n| n >= 0)),
            ),
    )?;
    let mut john = person.from_record(common::person_row("John", 20));

    assert!(john.set("email", "x").unwrap_err().is_unknown_column());
    assert!(john.get("email").unwrap_err().is_unknown_column());
    assert!(john.set("age", "twenty").unwrap_err().is_type_mismatch());
    assert!(john.set("age", -1).unwrap_err().is_validation());
    assert!(!john.is_dirty());
    assert_eq!(john.get("age")?, Some(&Value::Int(20)));
    Ok(())
}

#[tokio::test]
async fn defaults_fill_new_instances() -> OrmResult<()> {
    let (pool, mut client) = client();
    let user = client.register(
        EntityShape::new("User")
            .column("name", Column::text().primary_key())
            .column("active", Column::boolean().with_default(true)),
    )?;

    let mut alice = user.create([("name", "alice")])?;
    assert_eq!(alice.get("active")?, Some(&Value::Bool(true)));
    alice.save().await?;
    assert_eq!(
        pool.last(),
        (
            "INSERT INTO users (name,active) VALUES ($1,$2)".to_string(),
            vec![text("alice"), Value::Bool(true)]
        )
    );
    Ok(())
}

#[tokio::test]
async fn generated_identity_is_returned() -> OrmResult<()> {
    let (pool, mut client) = client();
    let pet = client.register(
        EntityShape::new("Pet")
            .column("id", Column::serial())
            .column("name", Column::text()),
    )?;
    pool.queue_rows(vec![Record::new().with("id", 7).with("name", "Rex")]);

    let mut rex = pet.create([("name", "Rex")])?;
    rex.save().await?;

    assert_eq!(
        pool.last(),
        (
            "INSERT INTO pets (name) VALUES ($1) RETURNING *".to_string(),
            vec![text("Rex")]
        )
    );
    assert_eq!(rex.get("id")?, Some(&Value::Int(7)));
    assert_eq!(rex.original_identity(), Some(&Value::Int(7)));

    rex.set("name", "Max")?;
    rex.save().await?;
    assert_eq!(
        pool.last(),
        (
            "UPDATE pets SET name=$1 WHERE pets.id = $2".to_string(),
            vec![text("Max"), Value::Int(7)]
        )
    );
    Ok(())
}

#[tokio::test]
async fn empty_instance_inserts_default_values() -> OrmResult<()> {
    let (pool, mut client) = client();
    let counter = client.register(EntityShape::new("Counter").column("id", Column::serial()))?;
    pool.queue_rows(vec![Record::new().with("id", 1)]);

    let mut c = counter.new_instance();
    c.save().await?;
    assert_eq!(
        pool.last(),
        (
            "INSERT INTO counters DEFAULT VALUES RETURNING *".to_string(),
            vec![]
        )
    );
    assert_eq!(c.get("id")?, Some(&Value::Int(1)));
    Ok(())
}

#[tokio::test]
async fn json_and_display() -> OrmResult<()> {
    let (_pool, mut client) = client();
    let person = person(&mut client);
    let john = person.from_record(person_row("John", 20));

    assert_eq!(
        john.to_json(),
        serde_json::json!({"name": "John", "age": 20})
    );
    assert_eq!(john.to_string(), "<Person {name: \"John\", age: 20}>");
    Ok(())
}

#[tokio::test]
async fn failed_statement_propagates_and_releases_connection() -> OrmResult<()> {
    let (pool, mut client) = client();
    let person = person(&mut client);
    let mut john = person.create([("name", Value::from("John")), ("age", Value::from(20))])?;

    pool.fail_next("connection reset");
    let err = john.save().await.unwrap_err();
    assert!(matches!(err, OrmError::Other(ref m) if m == "connection reset"));
    assert!(!john.is_saved());
    assert_eq!(pool.acquired(), 1);
    assert_eq!(pool.released(), 1);

    john.save().await?;
    assert!(john.is_saved());
    assert_eq!(pool.acquired(), pool.released());
    Ok(())
}

#[tokio::test]
async fn create_tables_and_close() -> OrmResult<()> {
    let (pool, mut client) = client();
    person(&mut client);
    client.register(EntityShape::new("Pet").column("id", Column::serial()))?;

    client.create_tables().await?;
    let statements: Vec<String> = pool.statements().into_iter().map(|(sql, _)| sql).collect();
    assert_eq!(
        statements,
        [
            "CREATE TABLE IF NOT EXISTS persons (name TEXT PRIMARY KEY, age INTEGER)",
            "CREATE TABLE IF NOT EXISTS pets (id SERIAL)",
        ]
    );
    assert_eq!(pool.acquired(), 1);
    assert_eq!(client.entities().len(), 2);

    client.close();
    assert!(pool.is_closed());
    Ok(())
}
