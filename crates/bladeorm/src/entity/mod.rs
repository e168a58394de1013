//! Entities: registered schemas and the dirty-tracking instances built from them.
//!
//! ```ignore
//! let person = client.register(
//!     EntityShape::new("Person")
//!         .column("name", Column::text().primary_key())
//!         .column("age", Column::integer()),
//! )?;
//!
//! let mut john = person.create([("name", Value::from("John")), ("age", Value::from(20))])?;
//! john.save().await?; // INSERT INTO persons (name,age) VALUES ($1,$2)
//!
//! let found = person.filter(person.col("name")?.eq("John")?).fetch_one().await?;
//! let mut john = found.ok_or_else(|| OrmError::Other("not found".into()))?;
//! john.set("age", 21)?;
//! john.save().await?; // UPDATE persons SET age=$1 WHERE persons.name = $2
//! ```

mod instance;
mod schema;

#[cfg(test)]
mod tests;

pub use instance::{Instance, SaveOutcome};
pub use schema::{EntitySchema, EntityShape};

use crate::client::{ClientInner, ConnectionPool};
use crate::column::Column;
use crate::error::{OrmError, OrmResult};
use crate::executor::QueryExecutor;
use crate::expr::{Expr, IntoOperand};
use crate::row::{Record, RowProjection};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Handle to a registered entity.
///
/// Cheap to clone. Statements without a filter can run on the entity
/// itself (`person.fetch()`); see [`Entity::filter`] for the rest.
pub struct Entity<P: ConnectionPool> {
    schema: Arc<EntitySchema>,
    client: Arc<ClientInner<P>>,
}

impl<P: ConnectionPool> Clone for Entity<P> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            client: Arc::clone(&self.client),
        }
    }
}

impl<P: ConnectionPool> fmt::Debug for Entity<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.schema.name())
            .field("table", &self.schema.table())
            .finish()
    }
}

impl<P: ConnectionPool> Entity<P> {
    pub(crate) fn new(schema: Arc<EntitySchema>, client: Arc<ClientInner<P>>) -> Self {
        Self { schema, client }
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn table(&self) -> &str {
        self.schema.table()
    }

    pub(crate) fn client(&self) -> &ClientInner<P> {
        &self.client
    }

    /// Whether both handles come from the same registration.
    pub(crate) fn same_entity(&self, other: &Entity<P>) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema)
    }

    /// Bound column by name, for building expressions.
    pub fn col(&self, name: &str) -> OrmResult<&Column> {
        self.schema
            .column(name)
            .ok_or_else(|| OrmError::unknown_column(self.schema.name(), name))
    }

    /// Identity column, if the entity has one.
    pub fn identity(&self) -> Option<&Column> {
        self.schema.identity()
    }

    /// Unsaved instance holding only declared defaults.
    pub fn new_instance(&self) -> Instance<P> {
        Instance::unsaved(self.clone())
    }

    /// Unsaved instance from constructor values (on top of declared defaults).
    pub fn create<N, V>(&self, values: impl IntoIterator<Item = (N, V)>) -> OrmResult<Instance<P>>
    where
        N: AsRef<str>,
        V: Into<Value>,
    {
        let mut instance = self.new_instance();
        for (name, value) in values {
            instance.set(name.as_ref(), value)?;
        }
        Ok(instance)
    }

    /// Saved instance from a fetched row.
    ///
    /// Record fields that are not columns of this entity are ignored.
    pub fn from_record(&self, record: Record) -> Instance<P> {
        Instance::loaded(self.clone(), record)
    }

    /// Executor scoped to rows matching `filter`.
    pub fn filter(&self, filter: Expr) -> QueryExecutor<P> {
        QueryExecutor::new(self.clone()).filter(filter)
    }

    /// Executor over every row of the table.
    pub fn all(&self) -> QueryExecutor<P> {
        QueryExecutor::new(self.clone())
    }

    pub fn create_table_sql(&self) -> String {
        self.schema.create_table_sql()
    }

    // ===== Unfiltered shortcuts =====

    /// Every row as a saved instance; same as `self.all().fetch()`.
    pub async fn fetch(&self) -> OrmResult<Vec<Instance<P>>> {
        self.all().fetch().await
    }

    pub async fn fetch_columns(&self, columns: &[&str]) -> OrmResult<Vec<RowProjection>> {
        self.all().fetch_columns(columns).await
    }

    /// Some row of the table, or `None` when it is empty.
    pub async fn fetch_one(&self) -> OrmResult<Option<Instance<P>>> {
        self.all().fetch_one().await
    }

    pub async fn fetch_one_columns(&self, columns: &[&str]) -> OrmResult<Option<RowProjection>> {
        self.all().fetch_one_columns(columns).await
    }

    /// Update every row of the table.
    pub async fn update<N, V>(
        &self,
        assignments: impl IntoIterator<Item = (N, V)>,
    ) -> OrmResult<u64>
    where
        N: AsRef<str>,
        V: IntoOperand,
    {
        self.all().update(assignments).await
    }

    /// Delete every row of the table.
    pub async fn delete(&self) -> OrmResult<u64> {
        self.all().delete().await
    }
}
