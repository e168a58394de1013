//! Convenient imports for typical `bladeorm` usage.
//!
//! ```ignore
//! use bladeorm::prelude::*;
//! ```

pub use crate::{
    Client, ClientConfig, Column, Connection, ConnectionPool, Entity, EntityShape, Expr, Instance,
    IntoOperand, OrmError, OrmResult, QueryExecutor, Record, RowProjection, SaveOutcome, Value,
};

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_with_config};

#[cfg(feature = "validate")]
pub use crate::validate;
