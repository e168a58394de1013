//! # bladeorm
//!
//! Typed SQL expressions and dirty-tracking entities on top of pooled Postgres.
//!
//! ## Features
//!
//! - **Typed columns**: columns carry a native type; comparing a column with a
//!   value of the wrong type fails before any SQL is produced
//! - **Parameterized SQL**: literals always travel as `$n` parameters, never
//!   inlined into the statement text
//! - **Dirty tracking**: saving a loaded instance only writes the columns that
//!   changed, targeted by the identity value it was loaded with
//! - **Pluggable pool**: anything implementing [`ConnectionPool`] works;
//!   `deadpool-postgres` is supported out of the box
//!
//! ## Example
//!
//! ```ignore
//! use bladeorm::prelude::*;
//!
//! let mut client = Client::connect(&database_url, ClientConfig::default())?;
//! let person = client.register(
//!     EntityShape::new("Person")
//!         .column("name", Column::text().primary_key())
//!         .column("age", Column::integer()),
//! )?;
//! client.create_tables().await?;
//!
//! // INSERT INTO persons (name,age) VALUES ($1,$2)
//! person.create([("name", Value::from("John")), ("age", Value::from(20))])?.save().await?;
//!
//! // UPDATE persons SET age=persons.age * $1 WHERE persons.age > $2
//! let age = person.col("age")?;
//! person.filter(age.gt(10)?).update([("age", age.mul(2)?)]).await?;
//! ```
//!
//! ## Cargo features
//!
//! - `pool` (default): `deadpool-postgres` integration and [`Client::connect`]
//! - `validate` (default): built-in column checks in [`validate`]
//! - `tracing` (default): executed SQL as `tracing` events on target `bladeorm.sql`

pub mod client;
pub mod column;
pub mod config;
pub mod entity;
pub mod error;
pub mod executor;
pub mod expr;
pub mod ident;
pub mod prelude;
pub mod row;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "validate")]
pub mod validate;

pub use client::{Client, Connection, ConnectionPool, StatementKind};
pub use column::{Column, ColumnType, NativeType};
pub use config::ClientConfig;
pub use entity::{Entity, EntitySchema, EntityShape, Instance, SaveOutcome};
pub use error::{OrmError, OrmResult};
pub use executor::QueryExecutor;
pub use expr::{BinaryOp, ColumnRef, Expr, IntoOperand, ParameterBinder, UnaryOp};
pub use ident::is_valid_identifier;
pub use row::{Record, RowProjection};
pub use value::Value;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config, create_pool_with_tls};
