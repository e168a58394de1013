//! Statement rendering and execution for one entity.
//!
//! Every statement renders through a single [`ParameterBinder`]: SET or
//! projection literals first, then the WHERE clause, then LIMIT/OFFSET, so
//! placeholders are numbered contiguously in text order.

use crate::client::{ConnectionPool, StatementKind};
use crate::entity::{Entity, Instance};
use crate::error::{OrmError, OrmResult};
use crate::expr::{Expr, IntoOperand, ParameterBinder};
use crate::row::RowProjection;
use std::fmt;

/// Renders and runs SELECT/UPDATE/DELETE/INSERT for an entity, optionally
/// restricted by a filter expression.
pub struct QueryExecutor<P: ConnectionPool> {
    entity: Entity<P>,
    filter: Option<Expr>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl<P: ConnectionPool> Clone for QueryExecutor<P> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            filter: self.filter.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

impl<P: ConnectionPool> fmt::Debug for QueryExecutor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("entity", &self.entity.name())
            .field("filter", &self.filter)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<P: ConnectionPool> QueryExecutor<P> {
    pub fn new(entity: Entity<P>) -> Self {
        Self {
            entity,
            filter: None,
            limit: None,
            offset: None,
        }
    }

    /// Restrict to rows matching `filter`; ANDed with any existing filter.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.conjoin(filter),
            None => filter,
        });
        self
    }

    /// `LIMIT n` for [`fetch`](Self::fetch) and
    /// [`fetch_columns`](Self::fetch_columns). Zero means no limit; any other
    /// value makes single-row, UPDATE and DELETE statements fail.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `OFFSET n` for [`fetch`](Self::fetch) and
    /// [`fetch_columns`](Self::fetch_columns). Zero means no offset; same
    /// restrictions as [`limit`](Self::limit).
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn entity(&self) -> &Entity<P> {
        &self.entity
    }

    pub fn filter_expr(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }

    // ===== SQL rendering =====

    fn select_head(&self, columns: &[&str], binder: &mut ParameterBinder) -> OrmResult<String> {
        if columns.is_empty() {
            return Ok("SELECT *".to_string());
        }
        let mut rendered = Vec::with_capacity(columns.len());
        for name in columns {
            rendered.push(self.entity.col(name)?.to_expr()?.build(binder));
        }
        Ok(format!("SELECT {}", rendered.join(",")))
    }

    fn reject_paging(&self, statement: &str) -> OrmResult<()> {
        let paged = |n: Option<i64>| n.is_some_and(|n| n != 0);
        if paged(self.limit) || paged(self.offset) {
            return Err(OrmError::validation(format!(
                "LIMIT/OFFSET cannot be applied to {statement} on {}",
                self.entity.table()
            )));
        }
        Ok(())
    }

    fn push_where(&self, parts: &mut Vec<String>, binder: &mut ParameterBinder) {
        if let Some(filter) = &self.filter {
            parts.push(format!("WHERE {}", filter.build(binder)));
        }
    }

    /// `SELECT <cols|*> FROM t [WHERE ...] [LIMIT $n] [OFFSET $n]`
    pub fn fetch_sql(&self, columns: &[&str]) -> OrmResult<(String, ParameterBinder)> {
        let mut binder = ParameterBinder::new();
        let mut parts = vec![
            self.select_head(columns, &mut binder)?,
            format!("FROM {}", self.entity.table()),
        ];
        self.push_where(&mut parts, &mut binder);
        if let Some(limit) = self.limit.filter(|n| *n != 0) {
            parts.push(format!("LIMIT {}", binder.add(limit)));
        }
        if let Some(offset) = self.offset.filter(|n| *n != 0) {
            parts.push(format!("OFFSET {}", binder.add(offset)));
        }
        Ok((parts.join(" "), binder))
    }

    /// `SELECT <cols|*> FROM t [WHERE ...] LIMIT 1`
    pub fn fetch_one_sql(&self, columns: &[&str]) -> OrmResult<(String, ParameterBinder)> {
        self.reject_paging("a single-row SELECT")?;
        let mut binder = ParameterBinder::new();
        let mut parts = vec![
            self.select_head(columns, &mut binder)?,
            format!("FROM {}", self.entity.table()),
        ];
        self.push_where(&mut parts, &mut binder);
        parts.push("LIMIT 1".to_string());
        Ok((parts.join(" "), binder))
    }

    /// `UPDATE t SET col=<expr|$n>,... [WHERE ...]`
    ///
    /// Literal values are checked against the column type and its check;
    /// expression values are rendered as-is.
    pub fn update_sql<N, V>(
        &self,
        assignments: impl IntoIterator<Item = (N, V)>,
    ) -> OrmResult<(String, ParameterBinder)>
    where
        N: AsRef<str>,
        V: IntoOperand,
    {
        self.reject_paging("UPDATE")?;
        let mut binder = ParameterBinder::new();
        let mut sets = Vec::new();
        for (name, value) in assignments {
            let name = name.as_ref();
            let column = self.entity.col(name)?;
            let operand = value.into_operand()?;
            if let Expr::Literal(v) = &operand {
                let ty = column.column_type();
                if !ty.accepts(v) {
                    return Err(OrmError::type_mismatch(ty.to_string(), v.type_name()));
                }
                column.validate(v)?;
            }
            sets.push(format!("{name}={}", operand.build(&mut binder)));
        }
        if sets.is_empty() {
            return Err(OrmError::validation(format!(
                "UPDATE on {} requires at least one assignment",
                self.entity.table()
            )));
        }

        let mut parts = vec![
            format!("UPDATE {}", self.entity.table()),
            format!("SET {}", sets.join(",")),
        ];
        self.push_where(&mut parts, &mut binder);
        Ok((parts.join(" "), binder))
    }

    /// `DELETE FROM t [WHERE ...]`
    pub fn delete_sql(&self) -> OrmResult<(String, ParameterBinder)> {
        self.reject_paging("DELETE")?;
        let mut binder = ParameterBinder::new();
        let mut parts = vec![format!("DELETE FROM {}", self.entity.table())];
        self.push_where(&mut parts, &mut binder);
        Ok((parts.join(" "), binder))
    }

    /// `INSERT INTO t (cols) VALUES ($n...) [RETURNING *]`
    ///
    /// Every set value is inserted, not just dirty ones. `RETURNING *` is
    /// added when the identity column has no value (e.g. `SERIAL`).
    ///
    /// The instance must belong to this executor's entity.
    pub fn insert_sql(&self, instance: &Instance<P>) -> OrmResult<(String, ParameterBinder)> {
        if !self.entity.same_entity(instance.entity()) {
            return Err(OrmError::state(format!(
                "cannot insert a {} instance into {}",
                instance.entity().name(),
                self.entity.table()
            )));
        }
        let mut binder = ParameterBinder::new();
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();
        for (name, value) in instance.values() {
            columns.push(name);
            placeholders.push(binder.add(value.clone()));
        }

        let mut sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", self.entity.table())
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.entity.table(),
                columns.join(","),
                placeholders.join(",")
            )
        };
        if self.returns_generated(instance) {
            sql.push_str(" RETURNING *");
        }
        Ok((sql, binder))
    }

    fn returns_generated(&self, instance: &Instance<P>) -> bool {
        self.entity
            .schema()
            .identity_name()
            .is_some_and(|name| matches!(instance.get(name), Ok(None)))
    }

    // ===== Execution =====

    /// Fetch matching rows as saved instances.
    pub async fn fetch(&self) -> OrmResult<Vec<Instance<P>>> {
        let (sql, binder) = self.fetch_sql(&[])?;
        let records = self
            .entity
            .client()
            .fetch(self.entity.name(), &sql, binder.values())
            .await?;
        Ok(records
            .into_iter()
            .map(|r| self.entity.from_record(r))
            .collect())
    }

    /// Fetch only the named columns of matching rows.
    pub async fn fetch_columns(&self, columns: &[&str]) -> OrmResult<Vec<RowProjection>> {
        let (sql, binder) = self.fetch_sql(columns)?;
        let records = self
            .entity
            .client()
            .fetch(self.entity.name(), &sql, binder.values())
            .await?;
        Ok(records.into_iter().map(RowProjection::from_record).collect())
    }

    /// First matching row as a saved instance, or `None`.
    pub async fn fetch_one(&self) -> OrmResult<Option<Instance<P>>> {
        let (sql, binder) = self.fetch_one_sql(&[])?;
        let record = self
            .entity
            .client()
            .fetch_one(self.entity.name(), StatementKind::Select, &sql, binder.values())
            .await?;
        Ok(record.map(|r| self.entity.from_record(r)))
    }

    /// Named columns of the first matching row, or `None`.
    pub async fn fetch_one_columns(&self, columns: &[&str]) -> OrmResult<Option<RowProjection>> {
        let (sql, binder) = self.fetch_one_sql(columns)?;
        let record = self
            .entity
            .client()
            .fetch_one(self.entity.name(), StatementKind::Select, &sql, binder.values())
            .await?;
        Ok(record.map(RowProjection::from_record))
    }

    /// Update matching rows; returns the affected row count.
    pub async fn update<N, V>(
        &self,
        assignments: impl IntoIterator<Item = (N, V)>,
    ) -> OrmResult<u64>
    where
        N: AsRef<str>,
        V: IntoOperand,
    {
        let (sql, binder) = self.update_sql(assignments)?;
        self.entity
            .client()
            .execute(self.entity.name(), StatementKind::Update, &sql, binder.values())
            .await
    }

    /// Delete matching rows; returns the affected row count.
    pub async fn delete(&self) -> OrmResult<u64> {
        let (sql, binder) = self.delete_sql()?;
        self.entity
            .client()
            .execute(self.entity.name(), StatementKind::Delete, &sql, binder.values())
            .await
    }

    /// Insert `instance` and mark it saved.
    ///
    /// Generated values returned by `RETURNING *` are merged back.
    pub async fn insert(&self, instance: &mut Instance<P>) -> OrmResult<()> {
        let (sql, binder) = self.insert_sql(instance)?;
        let client = self.entity.client();
        if self.returns_generated(instance) {
            let row = client
                .fetch_one(self.entity.name(), StatementKind::Insert, &sql, binder.values())
                .await?;
            if let Some(record) = row {
                instance.merge_record(record);
            }
        } else {
            client
                .execute(self.entity.name(), StatementKind::Insert, &sql, binder.values())
                .await?;
        }
        instance.mark_persisted();
        Ok(())
    }
}
