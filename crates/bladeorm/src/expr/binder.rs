//! Positional parameter accumulation for one statement render pass.

use crate::value::Value;
use tokio_postgres::types::ToSql;

/// Collects bound values in call order and hands out `$n` placeholders.
///
/// One binder belongs to one statement: the WHERE clause, SET list and
/// LIMIT/OFFSET all render through the same binder so numbering stays
/// contiguous.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterBinder {
    values: Vec<Value>,
}

impl ParameterBinder {
    /// Create a new empty binder.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value and return its placeholder (`$1`, `$2`, ...).
    pub fn add(&mut self, value: impl Into<Value>) -> String {
        self.values.push(value.into());
        format!("${}", self.values.len())
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no value has been bound yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bound values in placeholder order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the binder, returning the bound values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Get all values as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        param_refs(&self.values)
    }
}

/// Borrow a value slice as tokio-postgres parameters.
pub(crate) fn param_refs(values: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_one_indexed() {
        let mut binder = ParameterBinder::new();
        assert_eq!(binder.add("a"), "$1");
        assert_eq!(binder.add(2i32), "$2");
        assert_eq!(binder.len(), 2);
        assert_eq!(binder.values(), &[Value::from("a"), Value::Int(2)]);
    }

    #[test]
    fn refs_follow_value_order() {
        let mut binder = ParameterBinder::new();
        binder.add(1i64);
        binder.add(true);
        assert_eq!(binder.as_refs().len(), 2);
    }
}
