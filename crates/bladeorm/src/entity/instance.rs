use super::Entity;
use crate::client::ConnectionPool;
use crate::error::{OrmError, OrmResult};
use crate::expr::Expr;
use crate::row::Record;
use crate::value::Value;
use std::fmt;

/// What [`Instance::save`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The instance was new and has been inserted.
    Inserted,
    /// Dirty columns were written; carries the affected row count.
    Updated(u64),
    /// Nothing changed since the last load or save; no statement was issued.
    Unchanged,
}

/// One row of an entity, with per-column dirty tracking.
///
/// Unsaved instances insert every set value on [`save`](Instance::save).
/// Saved instances (loaded from a row, or after a save) only write the
/// columns changed through [`set`](Instance::set), targeting the row by the
/// identity value captured at load/save time.
pub struct Instance<P: ConnectionPool> {
    entity: Entity<P>,
    values: Vec<Option<Value>>,
    dirty: Vec<bool>,
    saved: bool,
    original_identity: Option<Value>,
}

impl<P: ConnectionPool> Instance<P> {
    pub(crate) fn unsaved(entity: Entity<P>) -> Self {
        let values: Vec<Option<Value>> = entity
            .schema()
            .columns()
            .map(|(_, c)| c.default_value().cloned())
            .collect();
        let dirty = vec![false; values.len()];
        Self {
            entity,
            values,
            dirty,
            saved: false,
            original_identity: None,
        }
    }

    pub(crate) fn loaded(entity: Entity<P>, record: Record) -> Self {
        let len = entity.schema().len();
        let mut instance = Self {
            entity,
            values: vec![None; len],
            dirty: vec![false; len],
            saved: true,
            original_identity: None,
        };
        instance.merge_record(record);
        instance.mark_persisted();
        instance
    }

    pub fn entity(&self) -> &Entity<P> {
        &self.entity
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    fn index(&self, name: &str) -> OrmResult<usize> {
        self.entity
            .schema()
            .index_of(name)
            .ok_or_else(|| OrmError::unknown_column(self.entity.name(), name))
    }

    /// Current value of a column; `None` if it was never set.
    pub fn get(&self, name: &str) -> OrmResult<Option<&Value>> {
        let idx = self.index(name)?;
        Ok(self.values[idx].as_ref())
    }

    /// Assign a column after checking its type and running its check.
    ///
    /// On a saved instance the column becomes dirty.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> OrmResult<()> {
        let idx = self.index(name)?;
        let value = value.into();
        let (_, column) = self.entity.schema().column_at(idx);
        let ty = column.column_type();
        if !ty.accepts(&value) {
            return Err(OrmError::type_mismatch(ty.to_string(), value.type_name()));
        }
        column.validate(&value)?;

        self.values[idx] = Some(value);
        if self.saved {
            self.dirty[idx] = true;
        }
        Ok(())
    }

    /// Builder-style [`Instance::set`].
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> OrmResult<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.iter().any(|d| *d)
    }

    /// Names of the columns changed since the last load or save.
    pub fn dirty_columns(&self) -> Vec<&str> {
        self.entity
            .schema()
            .columns()
            .zip(&self.dirty)
            .filter(|(_, d)| **d)
            .map(|((n, _), _)| n)
            .collect()
    }

    /// Identity value captured at load or last save.
    pub fn original_identity(&self) -> Option<&Value> {
        self.original_identity.as_ref()
    }

    /// Set values in column order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entity
            .schema()
            .columns()
            .zip(&self.values)
            .filter_map(|((n, _), v)| v.as_ref().map(|v| (n, v)))
    }

    /// Set values as a record, in column order.
    pub fn to_record(&self) -> Record {
        self.values().map(|(n, v)| (n, v.clone())).collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .values()
            .map(|(n, v)| (n.to_string(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Persist the instance: INSERT when unsaved, UPDATE of dirty columns
    /// when saved, nothing when saved and clean.
    pub async fn save(&mut self) -> OrmResult<SaveOutcome> {
        if !self.saved {
            let executor = self.entity.all();
            executor.insert(self).await?;
            return Ok(SaveOutcome::Inserted);
        }

        let filter = self.identity_filter("save")?;
        if !self.is_dirty() {
            return Ok(SaveOutcome::Unchanged);
        }

        let schema = self.entity.schema();
        let assignments: Vec<(String, Value)> = (0..self.values.len())
            .filter(|&i| self.dirty[i])
            .map(|i| {
                let value = self.values[i].clone().unwrap_or(Value::Null);
                (schema.column_at(i).0.to_string(), value)
            })
            .collect();

        let affected = self.entity.filter(filter).update(assignments).await?;
        self.mark_persisted();
        Ok(SaveOutcome::Updated(affected))
    }

    /// Delete the row this instance was loaded from.
    ///
    /// Targets the captured identity value, not any pending change to the
    /// identity column. Afterwards the instance is unsaved again.
    pub async fn delete(&mut self) -> OrmResult<u64> {
        if !self.saved {
            return Err(OrmError::state(format!(
                "{} instance is not saved",
                self.entity.name()
            )));
        }
        let filter = self.identity_filter("delete")?;

        let affected = self.entity.filter(filter).delete().await?;
        self.saved = false;
        self.dirty.fill(false);
        self.original_identity = None;
        Ok(affected)
    }

    /// `identity = <original identity>`
    fn identity_filter(&self, action: &str) -> OrmResult<Expr> {
        let identity = self.entity.identity().ok_or_else(|| {
            OrmError::state(format!(
                "cannot {action} {}: entity has no identity column",
                self.entity.name()
            ))
        })?;
        let original = match &self.original_identity {
            Some(v) if !v.is_null() => v.clone(),
            _ => {
                return Err(OrmError::state(format!(
                    "cannot {action} {}: identity value is missing",
                    self.entity.name()
                )));
            }
        };
        identity.eq(original)
    }

    /// Overwrite values from a row (e.g. `RETURNING *` after an insert).
    pub(crate) fn merge_record(&mut self, record: Record) {
        for (name, value) in record {
            if let Some(idx) = self.entity.schema().index_of(&name) {
                self.values[idx] = Some(value);
            }
        }
    }

    /// Transition to saved: clear dirty flags and re-capture the identity.
    pub(crate) fn mark_persisted(&mut self) {
        self.saved = true;
        self.dirty.fill(false);
        self.original_identity = self
            .entity
            .schema()
            .identity_index()
            .and_then(|i| self.values[i].clone());
    }
}

impl<P: ConnectionPool> fmt::Display for Instance<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {{", self.entity.name())?;
        for (i, (name, value)) in self.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}>")
    }
}

impl<P: ConnectionPool> fmt::Debug for Instance<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("entity", &self.entity.name())
            .field("values", &self.values)
            .field("dirty", &self.dirty_columns())
            .field("saved", &self.saved)
            .finish()
    }
}
