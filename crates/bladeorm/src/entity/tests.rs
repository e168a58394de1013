use super::*;
use crate::column::Column;
use crate::value::Value;

fn person_shape() -> EntityShape {
    EntityShape::new("Person")
        .column("name", Column::text().primary_key())
        .column("age", Column::integer())
}

#[test]
fn table_name_is_lowercase_plural() {
    let schema = EntitySchema::from_shape(person_shape()).unwrap();
    assert_eq!(schema.name(), "Person");
    assert_eq!(schema.table(), "persons");

    let schema = EntitySchema::from_shape(person_shape().table("people")).unwrap();
    assert_eq!(schema.table(), "people");
}

#[test]
fn columns_are_bound_to_table() {
    let schema = EntitySchema::from_shape(person_shape()).unwrap();
    let names: Vec<&str> = schema.columns().map(|(n, _)| n).collect();
    assert_eq!(names, ["name", "age"]);

    let age = schema.column("age").unwrap();
    assert_eq!(age.table(), Some("persons"));
    assert_eq!(age.gt(10).unwrap().to_sql().0, "persons.age > $1");
}

#[test]
fn prototype_reuse_across_entities() {
    let proto = Column::text().not_null();
    let a = EntitySchema::from_shape(EntityShape::new("Cat").column("name", proto.clone()));
    let b = EntitySchema::from_shape(EntityShape::new("Dog").column("name", proto.clone()));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.column("name").unwrap().table(), Some("cats"));
    assert_eq!(b.column("name").unwrap().table(), Some("dogs"));
    assert!(!proto.is_bound());
}

#[test]
fn identity_is_detected() {
    let schema = EntitySchema::from_shape(person_shape()).unwrap();
    assert_eq!(schema.identity_name(), Some("name"));

    let schema = EntitySchema::from_shape(
        EntityShape::new("Log").column("message", Column::text()),
    )
    .unwrap();
    assert!(schema.identity().is_none());
}

#[test]
fn two_identity_columns_fail() {
    let err = EntitySchema::from_shape(
        EntityShape::new("Pet")
            .column("id", Column::serial())
            .column("code", Column::text().identity()),
    )
    .unwrap_err();
    assert!(err.is_definition());
}

#[test]
fn explicit_identity_overrides_detection() {
    let schema = EntitySchema::from_shape(
        EntityShape::new("Pet")
            .column("id", Column::serial())
            .column("code", Column::text().identity())
            .identity("code"),
    )
    .unwrap();
    assert_eq!(schema.identity_name(), Some("code"));

    let err = EntitySchema::from_shape(person_shape().identity("missing")).unwrap_err();
    assert!(err.is_unknown_column());
}

#[test]
fn invalid_identifiers_fail() {
    let err = EntitySchema::from_shape(
        EntityShape::new("Person").column("first name", Column::text()),
    )
    .unwrap_err();
    assert!(err.is_definition());

    let err = EntitySchema::from_shape(person_shape().table("persons; DROP TABLE x")).unwrap_err();
    assert!(err.is_definition());
}

#[test]
fn duplicate_columns_fail() {
    let err = EntitySchema::from_shape(
        EntityShape::new("Person")
            .column("name", Column::text())
            .column("name", Column::varchar()),
    )
    .unwrap_err();
    assert!(err.is_definition());
}

#[test]
fn create_table_ddl() {
    let schema = EntitySchema::from_shape(
        EntityShape::new("User")
            .column("id", Column::serial())
            .column("name", Column::varchar().sized(20).not_null())
            .column("tags", Column::text().as_array())
            .column("active", Column::boolean().with_default(true)),
    )
    .unwrap();
    assert_eq!(
        schema.create_table_sql(),
        "CREATE TABLE IF NOT EXISTS users (id SERIAL, name VARCHAR(20) NOT NULL, tags TEXT[], active BOOLEAN DEFAULT TRUE)"
    );
}

#[test]
fn default_must_match_column_type() {
    let err = EntitySchema::from_shape(
        EntityShape::new("Counter")
            .column("name", Column::text().primary_key())
            .column("n", Column::integer().with_default("oops")),
    )
    .unwrap_err();
    assert!(err.is_definition());

    let err = EntitySchema::from_shape(
        EntityShape::new("Counter").column("tags", Column::text().as_array().with_default("a")),
    )
    .unwrap_err();
    assert!(err.is_definition());

    let schema = EntitySchema::from_shape(
        EntityShape::new("Counter")
            .column("n", Column::integer().with_default(0))
            .column("ratio", Column::float().with_default(1))
            .column("note", Column::text().with_default(Value::Null)),
    )
    .unwrap();
    assert_eq!(
        schema.create_table_sql(),
        "CREATE TABLE IF NOT EXISTS counters (n INTEGER DEFAULT 0, ratio DOUBLE PRECISION DEFAULT 1, note TEXT DEFAULT NULL)"
    );
}

#[test]
fn default_must_pass_column_check() {
    let non_negative = Column::integer().with_check(|v| v.as_i64().is_none_or(|n| n >= 0));

    let err = EntitySchema::from_shape(
        EntityShape::new("Counter").column("m", non_negative.with_default(-5)),
    )
    .unwrap_err();
    assert!(err.is_validation());

    let shape = EntityShape::new("Counter").column("m", non_negative.with_default(5));
    let schema = EntitySchema::from_shape(shape).unwrap();
    assert_eq!(schema.column("m").unwrap().default_value(), Some(&Value::Int(5)));
}
