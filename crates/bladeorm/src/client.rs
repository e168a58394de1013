//! Connection collaborator traits and the [`Client`] that owns the pool.
//!
//! The entity layer never talks to `tokio-postgres` directly: it acquires a
//! [`Connection`] from a [`ConnectionPool`], runs one statement and drops the
//! connection. Implementations are provided for `tokio_postgres::Client` and,
//! with the `pool` feature, for `deadpool-postgres`.

use crate::config::ClientConfig;
use crate::entity::{Entity, EntitySchema, EntityShape};
use crate::error::OrmResult;
use crate::expr::param_refs;
use crate::row::Record;
use crate::value::Value;
use std::future::Future;
use std::sync::Arc;

/// A single acquired database connection.
///
/// Released when dropped.
pub trait Connection: Send + Sync {
    /// Execute a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = OrmResult<u64>> + Send;

    /// Execute a query and return all rows.
    fn fetch(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Vec<Record>>> + Send;

    /// Execute a query and return the first row, if any.
    ///
    /// Extra rows are ignored rather than treated as an error.
    fn fetch_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Option<Record>>> + Send {
        async move { Ok(self.fetch(sql, params).await?.into_iter().next()) }
    }
}

/// Source of pooled connections.
pub trait ConnectionPool: Send + Sync {
    type Connection: Connection;

    /// Acquire a connection; it returns to the pool when dropped.
    fn acquire(&self) -> impl Future<Output = OrmResult<Self::Connection>> + Send;

    /// Stop handing out connections.
    fn close(&self);
}

impl Connection for tokio_postgres::Client {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        Ok(tokio_postgres::Client::execute(self, sql, &param_refs(params)).await?)
    }

    async fn fetch(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Record>> {
        let rows = tokio_postgres::Client::query(self, sql, &param_refs(params)).await?;
        rows.iter().map(Record::from_pg_row).collect()
    }
}

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Client {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        let client: &tokio_postgres::Client = self;
        Connection::execute(client, sql, params).await
    }

    async fn fetch(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Record>> {
        let client: &tokio_postgres::Client = self;
        Connection::fetch(client, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl ConnectionPool for deadpool_postgres::Pool {
    type Connection = deadpool_postgres::Client;

    async fn acquire(&self) -> OrmResult<deadpool_postgres::Client> {
        Ok(self.get().await?)
    }

    fn close(&self) {
        deadpool_postgres::Pool::close(self)
    }
}

/// Kind of statement being executed, reported in SQL log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::CreateTable => "create_table",
        }
    }
}

/// Shared state behind every [`Entity`] registered on a [`Client`].
pub(crate) struct ClientInner<P> {
    pub(crate) pool: P,
    pub(crate) config: ClientConfig,
}

impl<P: ConnectionPool> ClientInner<P> {
    pub(crate) async fn execute(
        &self,
        entity: &str,
        kind: StatementKind,
        sql: &str,
        params: &[Value],
    ) -> OrmResult<u64> {
        self.log_statement(entity, kind, sql, params.len());
        let conn = self.pool.acquire().await?;
        conn.execute(sql, params).await
    }

    pub(crate) async fn fetch(
        &self,
        entity: &str,
        sql: &str,
        params: &[Value],
    ) -> OrmResult<Vec<Record>> {
        self.log_statement(entity, StatementKind::Select, sql, params.len());
        let conn = self.pool.acquire().await?;
        conn.fetch(sql, params).await
    }

    pub(crate) async fn fetch_one(
        &self,
        entity: &str,
        kind: StatementKind,
        sql: &str,
        params: &[Value],
    ) -> OrmResult<Option<Record>> {
        self.log_statement(entity, kind, sql, params.len());
        let conn = self.pool.acquire().await?;
        conn.fetch_one(sql, params).await
    }

    #[cfg(feature = "tracing")]
    fn log_statement(&self, entity: &str, kind: StatementKind, sql: &str, param_count: usize) {
        if !self.config.log_statements {
            return;
        }
        let max = self.config.max_sql_log_length;
        let sql = if sql.len() > max {
            format!("{}...", truncate_sql_bytes(sql, max))
        } else {
            sql.to_string()
        };
        tracing::debug!(
            target: "bladeorm.sql",
            entity,
            statement = kind.as_str(),
            param_count,
            sql = %sql,
        );
    }

    #[cfg(not(feature = "tracing"))]
    fn log_statement(&self, _entity: &str, _kind: StatementKind, _sql: &str, _param_count: usize) {}
}

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Owns the connection pool and the registered entities.
///
/// ```ignore
/// let mut client = Client::connect(&database_url, ClientConfig::default())?;
/// let person = client.register(
///     EntityShape::new("Person")
///         .column("name", Column::text().primary_key())
///         .column("age", Column::integer()),
/// )?;
/// client.create_tables().await?;
/// ```
pub struct Client<P: ConnectionPool> {
    inner: Arc<ClientInner<P>>,
    entities: Vec<Arc<EntitySchema>>,
}

impl<P: ConnectionPool> Client<P> {
    /// Wrap an existing pool.
    pub fn new(pool: P, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner { pool, config }),
            entities: Vec::new(),
        }
    }

    pub fn pool(&self) -> &P {
        &self.inner.pool
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Schemas of every registered entity, in registration order.
    pub fn entities(&self) -> &[Arc<EntitySchema>] {
        &self.entities
    }

    /// Bind `shape` into an entity and record it for [`Client::create_tables`].
    pub fn register(&mut self, shape: EntityShape) -> OrmResult<Entity<P>> {
        let schema = Arc::new(EntitySchema::from_shape(shape)?);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "bladeorm",
            entity = schema.name(),
            table = schema.table(),
            columns = schema.len(),
            identity = schema.identity_name().unwrap_or("-"),
            "registered entity"
        );

        self.entities.push(Arc::clone(&schema));
        Ok(Entity::new(schema, Arc::clone(&self.inner)))
    }

    /// Issue `CREATE TABLE IF NOT EXISTS` for every registered entity on one connection.
    pub async fn create_tables(&self) -> OrmResult<()> {
        let conn = self.inner.pool.acquire().await?;
        for schema in &self.entities {
            let sql = schema.create_table_sql();
            self.inner
                .log_statement(schema.name(), StatementKind::CreateTable, &sql, 0);
            conn.execute(&sql, &[]).await?;
        }

        #[cfg(feature = "tracing")]
        tracing::info!(target: "bladeorm", tables = self.entities.len(), "created tables");

        Ok(())
    }

    /// Close the underlying pool.
    pub fn close(&self) {
        self.inner.pool.close();
    }
}

#[cfg(feature = "pool")]
impl Client<deadpool_postgres::Pool> {
    /// Build a `deadpool-postgres` pool for `database_url` and wrap it.
    pub fn connect(database_url: &str, config: ClientConfig) -> OrmResult<Self> {
        let pool = crate::pool::create_pool_with_config(database_url, &config)?;
        Ok(Self::new(pool, config))
    }
}
