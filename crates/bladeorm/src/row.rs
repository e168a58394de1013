//! Result rows: decoded [`Record`]s and read-only [`RowProjection`]s.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use tokio_postgres::Row;
use tokio_postgres::types::Type;

/// One result row as an ordered name → value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, replacing any existing field of the same name in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder-style [`Record::push`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.fields.get(index).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decode a `tokio-postgres` row by inspecting each column's type.
    pub fn from_pg_row(row: &Row) -> OrmResult<Self> {
        let mut record = Record::new();
        for (idx, column) in row.columns().iter().enumerate() {
            let value = decode_column(row, idx, column.type_())
                .map_err(|message| OrmError::decode(column.name(), message))?;
            record.fields.push((column.name().to_string(), value));
        }
        Ok(record)
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.push(name, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

fn decode_column(row: &Row, idx: usize, ty: &Type) -> Result<Value, String> {
    macro_rules! get {
        ($t:ty) => {
            row.try_get::<_, Option<$t>>(idx)
                .map(Value::from)
                .map_err(|e| e.to_string())
        };
    }

    match *ty {
        Type::BOOL => get!(bool),
        Type::INT2 => get!(i16),
        Type::INT4 => get!(i32),
        Type::INT8 => get!(i64),
        Type::OID => get!(u32),
        Type::FLOAT4 => get!(f32),
        Type::FLOAT8 => get!(f64),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => get!(String),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(idx)
            .map(|v| v.map_or(Value::Null, Value::Bytes))
            .map_err(|e| e.to_string()),
        Type::UUID => get!(uuid::Uuid),
        Type::TIMESTAMP => get!(NaiveDateTime),
        Type::TIMESTAMPTZ => get!(DateTime<Utc>),
        Type::JSON | Type::JSONB => get!(serde_json::Value),
        Type::BOOL_ARRAY => get!(Vec<Option<bool>>),
        Type::INT2_ARRAY => get!(Vec<Option<i16>>),
        Type::INT4_ARRAY => get!(Vec<Option<i32>>),
        Type::INT8_ARRAY => get!(Vec<Option<i64>>),
        Type::FLOAT4_ARRAY => get!(Vec<Option<f32>>),
        Type::FLOAT8_ARRAY => get!(Vec<Option<f64>>),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY | Type::BPCHAR_ARRAY => {
            get!(Vec<Option<String>>)
        }
        Type::UUID_ARRAY => get!(Vec<Option<uuid::Uuid>>),
        Type::TIMESTAMP_ARRAY => get!(Vec<Option<NaiveDateTime>>),
        Type::TIMESTAMPTZ_ARRAY => get!(Vec<Option<DateTime<Utc>>>),
        Type::JSON_ARRAY | Type::JSONB_ARRAY => get!(Vec<Option<serde_json::Value>>),
        _ => Err(format!("unsupported column type {ty}")),
    }
}

/// Immutable view over the explicitly selected columns of one result row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowProjection {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl RowProjection {
    pub(crate) fn from_record(record: Record) -> Self {
        let (columns, values) = record.into_iter().unzip();
        Self { columns, values }
    }

    /// Value of a projected column by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i))
    }

    /// Value at `index` in projection order.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in projection order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Projections are read-only: writing a projected column is an
    /// immutability error, writing anything else an unknown column.
    pub fn set(&mut self, name: &str, _value: impl Into<Value>) -> OrmResult<()> {
        if self.columns.iter().any(|c| c == name) {
            Err(OrmError::Immutable(format!(
                "cannot assign to projected column '{name}'"
            )))
        } else {
            Err(OrmError::unknown_column("row projection", name))
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(c, v)| (c.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl<'a> IntoIterator for &'a RowProjection {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for RowProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, (c, v)) in self.columns.iter().zip(&self.values).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{c}={v}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> RowProjection {
        RowProjection::from_record(Record::new().with("name", "John").with("age", 20))
    }

    #[test]
    fn record_push_replaces_in_place() {
        let mut record = Record::new().with("a", 1).with("b", 2);
        record.push("a", 3);
        assert_eq!(record.columns().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(record.get("a"), Some(&Value::Int(3)));
        assert_eq!(record.get_index(1), Some(&Value::Int(2)));
    }

    #[test]
    fn projection_reads_by_name_and_position() {
        let row = projection();
        assert_eq!(row.get("name"), Some(&Value::from("John")));
        assert_eq!(row.get_index(1), Some(&Value::Int(20)));
        assert_eq!(row.get("missing"), None);
        let values: Vec<&Value> = row.iter().collect();
        assert_eq!(values, [&Value::from("John"), &Value::Int(20)]);
    }

    #[test]
    fn projection_is_read_only() {
        let mut row = projection();
        assert!(row.set("age", 21).unwrap_err().is_immutable());
        assert!(row.set("email", "x").unwrap_err().is_unknown_column());
        assert_eq!(row.get("age"), Some(&Value::Int(20)));
    }

    #[test]
    fn projection_json_and_display() {
        let row = projection();
        assert_eq!(row.to_json(), serde_json::json!({"name": "John", "age": 20}));
        assert_eq!(row.to_string(), "(name=\"John\", age=20)");
    }
}
