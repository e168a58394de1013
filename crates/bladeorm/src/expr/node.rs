use super::IntoOperand;
use super::binder::ParameterBinder;
use super::op::{BinaryOp, UnaryOp};
use crate::column::ColumnType;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::fmt;

/// A bound column as it appears inside an expression: `table.column`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    table: String,
    name: String,
    ty: ColumnType,
}

impl ColumnRef {
    pub(crate) fn new(table: impl Into<String>, name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            ty,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.ty
    }

    /// `table.column`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }

    /// Check `self <op> rhs` against the declared type.
    ///
    /// Only literal right operands are inspected; columns and nested
    /// expressions always pass.
    fn check_operand(&self, op: BinaryOp, rhs: &Expr) -> OrmResult<()> {
        if op.is_arithmetic() && !self.ty.is_numeric() {
            return Err(OrmError::type_mismatch(
                format!("{} column {}", self.ty, self.qualified_name()),
                format!("arithmetic operator '{}'", op.symbol()),
            ));
        }

        let Expr::Literal(value) = rhs else {
            return Ok(());
        };

        let accepted = if op == BinaryOp::In {
            let element = self.ty.element();
            match value {
                Value::Array(items) => items.iter().all(|v| element.accepts(v)),
                _ => false,
            }
        } else if op.is_arithmetic() {
            value.is_null() || value.is_numeric()
        } else {
            self.ty.accepts(value)
        };

        if accepted {
            Ok(())
        } else {
            let expected = if op == BinaryOp::In {
                format!("{}[]", self.ty.element())
            } else {
                self.ty.to_string()
            };
            Err(OrmError::type_mismatch(expected, describe(value)))
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let inner = items
                .iter()
                .find(|v| !v.is_null())
                .map_or("null", Value::type_name);
            format!("{inner}[]")
        }
        other => other.type_name().to_string(),
    }
}

/// Immutable SQL expression tree.
///
/// Every combinator returns a new node; operands are never modified.
/// Rendering appends literals to the binder strictly left to right.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to a bound column.
    Column(ColumnRef),
    /// Value bound as a positional parameter.
    Literal(Value),
    /// Infix operator application.
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Prefix operator application.
    Unary { op: UnaryOp, operand: Box<Expr> },
}

macro_rules! binary_combinators {
    ($($(#[$doc:meta])* $name:ident => $op:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(self, rhs: impl IntoOperand) -> OrmResult<Expr> {
                self.binary(BinaryOp::$op, rhs)
            }
        )*
    };
}

impl Expr {
    /// Create a literal operand.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Build `self <op> rhs`, type-checking literals when `self` is a column.
    pub fn binary(self, op: BinaryOp, rhs: impl IntoOperand) -> OrmResult<Expr> {
        let right = rhs.into_operand()?;
        if let Expr::Column(column) = &self {
            column.check_operand(op, &right)?;
        }
        Ok(Expr::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        })
    }

    binary_combinators! {
        /// `self = rhs`
        eq => Eq,
        /// `self != rhs`
        ne => Ne,
        /// `self < rhs`
        lt => Lt,
        /// `self <= rhs`
        le => Le,
        /// `self > rhs`
        gt => Gt,
        /// `self >= rhs`
        ge => Ge,
        /// `self LIKE rhs`
        like => Like,
        /// `self ILIKE rhs`
        ilike => ILike,
        /// `self SIMILAR TO rhs`
        similar_to => SimilarTo,
        /// `self IN (rhs...)`: `self` is the needle, `rhs` the haystack.
        is_in => In,
        /// `self + rhs`
        add => Add,
        /// `self - rhs`
        sub => Sub,
        /// `self * rhs`
        mul => Mul,
        /// `self / rhs`
        div => Div,
        /// `self % rhs`
        rem => Rem,
        /// `self ^ rhs`
        pow => Pow,
    }

    binary_combinators! {
        /// `(self AND rhs)`
        and => And,
        /// `(self OR rhs)`
        or => Or,
    }

    /// `(self AND rhs)` for two already-built conditions.
    pub(crate) fn conjoin(self, rhs: Expr) -> Expr {
        Expr::Binary {
            left: Box::new(self),
            op: BinaryOp::And,
            right: Box::new(rhs),
        }
    }

    /// `NOT self`
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    /// `- self`
    pub fn neg(self) -> OrmResult<Expr> {
        if let Expr::Column(column) = &self {
            if !column.ty.is_numeric() {
                return Err(OrmError::type_mismatch(
                    format!("{} column {}", column.ty, column.qualified_name()),
                    "unary '-'",
                ));
            }
        }
        Ok(Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(self),
        })
    }

    /// Render with a fresh binder (top-level use).
    pub fn to_sql(&self) -> (String, ParameterBinder) {
        let mut binder = ParameterBinder::new();
        let sql = self.build(&mut binder);
        (sql, binder)
    }

    /// Render into a shared binder (nested use).
    pub fn build(&self, binder: &mut ParameterBinder) -> String {
        match self {
            Expr::Column(column) => column.qualified_name(),
            Expr::Literal(value) => binder.add(value.clone()),
            Expr::Binary {
                left,
                op: BinaryOp::In,
                right,
            } => build_in(left, right, binder),
            Expr::Binary { left, op, right } => {
                let l = left.build_operand(binder, *op, false);
                let r = right.build_operand(binder, *op, true);
                if op.is_boolean() {
                    format!("({l} {} {r})", op.symbol())
                } else {
                    format!("{l} {} {r}", op.symbol())
                }
            }
            Expr::Unary { op, operand } => {
                let inner = operand.build(binder);
                let wrap = match operand.as_ref() {
                    Expr::Binary { op: inner_op, .. } => {
                        !inner_op.is_boolean() && inner_op.precedence() < op.precedence()
                    }
                    _ => false,
                };
                if wrap {
                    format!("{} ({inner})", op.symbol())
                } else {
                    format!("{} {inner}", op.symbol())
                }
            }
        }
    }

    /// Render as an operand of `parent`, adding parentheses only when this
    /// node binds looser than its parent.
    fn build_operand(&self, binder: &mut ParameterBinder, parent: BinaryOp, right: bool) -> String {
        let sql = self.build(binder);
        let outer = parent.precedence();
        let wrap = match self {
            Expr::Binary { op, .. } if !op.is_boolean() => {
                let inner = op.precedence();
                inner < outer || (inner == outer && (right || op.is_comparison()))
            }
            Expr::Unary { op, .. } => op.precedence() < outer,
            _ => false,
        };
        if wrap { format!("({sql})") } else { sql }
    }
}

fn build_in(left: &Expr, right: &Expr, binder: &mut ParameterBinder) -> String {
    if let Expr::Literal(Value::Array(items)) = right {
        if items.is_empty() {
            return "1=0".to_string();
        }
        let needle = left.build_operand(binder, BinaryOp::In, false);
        let placeholders: Vec<String> = items.iter().map(|v| binder.add(v.clone())).collect();
        return format!("{needle} IN ({})", placeholders.join(", "));
    }
    let needle = left.build_operand(binder, BinaryOp::In, false);
    let haystack = right.build(binder);
    format!("{needle} IN ({haystack})")
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::not(self)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql().0)
    }
}
