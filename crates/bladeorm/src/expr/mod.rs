//! Typed SQL expression trees.
//!
//! Expressions are built from bound [`Column`]s and literal values with the
//! combinator methods on [`Expr`] and [`Column`], then rendered to
//! parameterized SQL against a [`ParameterBinder`]:
//!
//! ```ignore
//! let filter = person.col("age")?.gt(10)?.and(person.col("name")?.like("J%")?)?;
//! let (sql, params) = filter.to_sql();
//! assert_eq!(sql, "(persons.age > $1 AND persons.name LIKE $2)");
//! assert_eq!(params.len(), 2);
//! ```

mod binder;
mod node;
mod op;


pub use binder::ParameterBinder;
pub(crate) use binder::param_refs;
pub use node::{ColumnRef, Expr};
pub use op::{BinaryOp, UnaryOp};

use crate::column::Column;
use crate::error::OrmResult;
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Anything usable as the right-hand side of a combinator.
///
/// Plain values become bound literals; columns must already be bound to a
/// table, otherwise conversion fails with a binding error.
pub trait IntoOperand {
    fn into_operand(self) -> OrmResult<Expr>;
}

impl IntoOperand for Expr {
    fn into_operand(self) -> OrmResult<Expr> {
        Ok(self)
    }
}

impl IntoOperand for &Expr {
    fn into_operand(self) -> OrmResult<Expr> {
        Ok(self.clone())
    }
}

impl IntoOperand for Column {
    fn into_operand(self) -> OrmResult<Expr> {
        self.to_expr()
    }
}

impl IntoOperand for &Column {
    fn into_operand(self) -> OrmResult<Expr> {
        self.to_expr()
    }
}

macro_rules! literal_operand {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoOperand for $ty {
                fn into_operand(self) -> OrmResult<Expr> {
                    Ok(Expr::Literal(Value::from(self)))
                }
            }
        )*
    };
}

literal_operand!(
    Value,
    bool,
    i16,
    i32,
    i64,
    u16,
    u32,
    f32,
    f64,
    String,
    &str,
    &String,
    uuid::Uuid,
    NaiveDateTime,
    DateTime<Utc>,
    serde_json::Value,
);

impl<T: Into<Value>> IntoOperand for Vec<T> {
    fn into_operand(self) -> OrmResult<Expr> {
        Ok(Expr::Literal(Value::from(self)))
    }
}

impl<T: Into<Value>> IntoOperand for Option<T> {
    fn into_operand(self) -> OrmResult<Expr> {
        Ok(Expr::Literal(Value::from(self)))
    }
}
