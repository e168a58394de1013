//! Typed column declarations.
//!
//! A [`Column`] starts life as an unbound prototype (`Column::integer()`),
//! is refined with modifiers, and is bound to `table.column` when its entity
//! is registered. Modifiers and binding never mutate the receiver, so one
//! prototype can be reused across entities.

use crate::error::{OrmError, OrmResult};
use crate::expr::{ColumnRef, Expr, IntoOperand};
use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Native value category a column accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Text,
    Integer,
    Float,
    Bool,
    Bytes,
    Uuid,
    Timestamp,
    TimestampTz,
    Json,
}

impl NativeType {
    pub fn is_numeric(self) -> bool {
        matches!(self, NativeType::Integer | NativeType::Float)
    }

    /// Whether `value` may be stored in (or compared with) a column of this type.
    ///
    /// NULL is always accepted. Integers and floats are interchangeable.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (NativeType::Integer | NativeType::Float, v) => v.is_numeric(),
            (NativeType::Text, Value::Text(_)) => true,
            (NativeType::Bool, Value::Bool(_)) => true,
            (NativeType::Bytes, Value::Bytes(_)) => true,
            (NativeType::Uuid, Value::Uuid(_)) => true,
            (NativeType::Timestamp, Value::Timestamp(_)) => true,
            (NativeType::TimestampTz, Value::TimestampTz(_)) => true,
            (NativeType::Json, Value::Json(_)) => true,
            _ => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NativeType::Text => "text",
            NativeType::Integer => "integer",
            NativeType::Float => "float",
            NativeType::Bool => "bool",
            NativeType::Bytes => "bytes",
            NativeType::Uuid => "uuid",
            NativeType::Timestamp => "timestamp",
            NativeType::TimestampTz => "timestamptz",
            NativeType::Json => "json",
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared value type of a column: a native type, optionally as an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnType {
    pub native: NativeType,
    pub array: bool,
}

impl ColumnType {
    pub fn scalar(native: NativeType) -> Self {
        Self {
            native,
            array: false,
        }
    }

    /// Element type (the scalar form of an array type).
    pub fn element(&self) -> ColumnType {
        Self::scalar(self.native)
    }

    pub fn is_numeric(&self) -> bool {
        !self.array && self.native.is_numeric()
    }

    pub fn accepts(&self, value: &Value) -> bool {
        if !self.array {
            return self.native.accepts(value);
        }
        match value {
            Value::Null => true,
            Value::Array(items) => items.iter().all(|v| self.native.accepts(v)),
            _ => false,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.array {
            write!(f, "{}[]", self.native)
        } else {
            write!(f, "{}", self.native)
        }
    }
}

type Check = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Binding {
    table: String,
    name: String,
}

/// A typed column declaration.
///
/// Equality and hashing compare the declaration (native type, SQL type,
/// identity flag and binding); they have nothing to do with the SQL `=`
/// combinator, which is [`Column::eq`].
#[derive(Clone)]
pub struct Column {
    native: NativeType,
    base_type: String,
    size: Option<u32>,
    array: bool,
    array_len: Option<u32>,
    unique: bool,
    not_null: bool,
    default: Option<Value>,
    identity: bool,
    primary_key: bool,
    check: Option<Check>,
    binding: Option<Binding>,
}

macro_rules! shorthand {
    ($($(#[$doc:meta])* $name:ident => ($native:ident, $sql:literal $(, $identity:literal)?)),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name() -> Self {
                #[allow(unused_mut)]
                let mut column = Self::declare(NativeType::$native, $sql);
                $(column.identity = $identity;)?
                column
            }
        )*
    };
}

macro_rules! column_combinators {
    ($($name:ident),* $(,)?) => {
        $(
            #[doc = concat!("Shorthand for `self.to_expr()?.", stringify!($name), "(rhs)`.")]
            pub fn $name(&self, rhs: impl IntoOperand) -> OrmResult<Expr> {
                self.to_expr()?.$name(rhs)
            }
        )*
    };
}

impl Column {
    /// Declare an unbound column with a native type and base SQL type.
    pub fn declare(native: NativeType, sql_type: impl Into<String>) -> Self {
        Self {
            native,
            base_type: sql_type.into(),
            size: None,
            array: false,
            array_len: None,
            unique: false,
            not_null: false,
            default: None,
            identity: false,
            primary_key: false,
            check: None,
            binding: None,
        }
    }

    shorthand! {
        /// `TEXT`
        text => (Text, "TEXT"),
        /// `VARCHAR`; usually combined with [`Column::sized`].
        varchar => (Text, "VARCHAR"),
        /// `INTEGER`
        integer => (Integer, "INTEGER"),
        /// `BIGINT`
        bigint => (Integer, "BIGINT"),
        /// `SMALLINT`
        smallint => (Integer, "SMALLINT"),
        /// `DOUBLE PRECISION`
        float => (Float, "DOUBLE PRECISION"),
        /// `REAL`
        real => (Float, "REAL"),
        /// `BOOLEAN`
        boolean => (Bool, "BOOLEAN"),
        /// `SERIAL`, flagged as the identity column.
        serial => (Integer, "SERIAL", true),
        /// `BIGSERIAL`, flagged as the identity column.
        bigserial => (Integer, "BIGSERIAL", true),
        bytea => (Bytes, "BYTEA"),
        uuid => (Uuid, "UUID"),
        timestamp => (Timestamp, "TIMESTAMP"),
        timestamptz => (TimestampTz, "TIMESTAMPTZ"),
        json => (Json, "JSON"),
        jsonb => (Json, "JSONB"),
    }

    // ===== Modifiers =====

    fn modified(&self, f: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        next.binding = None;
        f(&mut next);
        next
    }

    /// Fixed size: `VARCHAR(32)`.
    #[must_use]
    pub fn sized(&self, size: u32) -> Self {
        self.modified(|c| c.size = Some(size))
    }

    /// Array of the base type: `INTEGER[]`.
    #[must_use]
    pub fn as_array(&self) -> Self {
        self.modified(|c| {
            c.array = true;
            c.array_len = None;
        })
    }

    /// Fixed-length array of the base type: `INTEGER[5]`.
    #[must_use]
    pub fn as_array_sized(&self, len: u32) -> Self {
        self.modified(|c| {
            c.array = true;
            c.array_len = Some(len);
        })
    }

    #[must_use]
    pub fn unique(&self) -> Self {
        self.modified(|c| c.unique = true)
    }

    #[must_use]
    pub fn not_null(&self) -> Self {
        self.modified(|c| c.not_null = true)
    }

    /// Default value, emitted as `DEFAULT <literal>` and pre-filled into new instances.
    #[must_use]
    pub fn with_default(&self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.modified(|c| c.default = Some(value))
    }

    /// Attach a value check run on every assignment.
    #[must_use]
    pub fn with_check(&self, check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.modified(|c| c.check = Some(Arc::new(check)))
    }

    /// Rewrite the base SQL type, e.g. `|t| format!("{t} COLLATE \"C\"")`.
    #[must_use]
    pub fn customize(&self, f: impl FnOnce(&str) -> String) -> Self {
        let base = f(&self.base_type);
        self.modified(|c| c.base_type = base)
    }

    /// Flag as the identity column without adding a key constraint.
    #[must_use]
    pub fn identity(&self) -> Self {
        self.modified(|c| c.identity = true)
    }

    /// `PRIMARY KEY`; implies identity.
    #[must_use]
    pub fn primary_key(&self) -> Self {
        self.modified(|c| {
            c.identity = true;
            c.primary_key = true;
        })
    }

    /// Bound copy of this column, optionally overriding the default value.
    pub fn bind(
        &self,
        table: impl Into<String>,
        name: impl Into<String>,
        default: Option<Value>,
    ) -> Self {
        let mut bound = self.clone();
        bound.binding = Some(Binding {
            table: table.into(),
            name: name.into(),
        });
        if default.is_some() {
            bound.default = default;
        }
        bound
    }

    // ===== Accessors =====

    pub fn native_type(&self) -> NativeType {
        self.native
    }

    pub fn column_type(&self) -> ColumnType {
        ColumnType {
            native: self.native,
            array: self.array,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Column name, once bound.
    pub fn name(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.name.as_str())
    }

    /// Table name, once bound.
    pub fn table(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.table.as_str())
    }

    /// Full DDL type string.
    ///
    /// Composition order: base, size, array suffix, `UNIQUE`, `NOT NULL`,
    /// `DEFAULT`, `PRIMARY KEY`.
    pub fn sql_type(&self) -> String {
        let mut out = self.base_type.clone();
        if let Some(size) = self.size {
            out.push_str(&format!("({size})"));
        }
        match (self.array, self.array_len) {
            (true, Some(len)) => out.push_str(&format!("[{len}]")),
            (true, None) => out.push_str("[]"),
            _ => {}
        }
        if self.unique {
            out.push_str(" UNIQUE");
        }
        if self.not_null {
            out.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            out.push_str(" DEFAULT ");
            out.push_str(&default.to_sql_literal());
        }
        if self.primary_key {
            out.push_str(" PRIMARY KEY");
        }
        out
    }

    /// Run the attached check, if any.
    pub fn validate(&self, value: &Value) -> OrmResult<()> {
        match &self.check {
            Some(check) if !check(value) => Err(OrmError::validation(format!(
                "value {value} rejected for column {}",
                self.name().unwrap_or("<unbound>")
            ))),
            _ => Ok(()),
        }
    }

    /// Expression node for this column; fails if the column is unbound.
    pub fn to_expr(&self) -> OrmResult<Expr> {
        let binding = self.binding.as_ref().ok_or_else(|| {
            OrmError::binding(format!(
                "{} column used in an expression before it was bound to a table",
                self.base_type
            ))
        })?;
        Ok(Expr::Column(ColumnRef::new(
            binding.table.clone(),
            binding.name.clone(),
            self.column_type(),
        )))
    }

    // ===== Combinators =====

    column_combinators!(
        eq, ne, lt, le, gt, ge, like, ilike, similar_to, is_in, add, sub, mul, div, rem, pow,
    );

    /// `(self AND rhs)`
    pub fn and(&self, rhs: impl IntoOperand) -> OrmResult<Expr> {
        self.boolean_expr("AND")?.and(rhs)
    }

    /// `(self OR rhs)`
    pub fn or(&self, rhs: impl IntoOperand) -> OrmResult<Expr> {
        self.boolean_expr("OR")?.or(rhs)
    }

    /// `NOT self`
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> OrmResult<Expr> {
        Ok(self.boolean_expr("NOT")?.not())
    }

    /// `- self`
    pub fn neg(&self) -> OrmResult<Expr> {
        self.to_expr()?.neg()
    }

    fn boolean_expr(&self, op: &str) -> OrmResult<Expr> {
        let expr = self.to_expr()?;
        if self.column_type() != ColumnType::scalar(NativeType::Bool) {
            return Err(OrmError::type_mismatch(
                format!("{} column {}", self.column_type(), self.name().unwrap_or("?")),
                format!("logical operator '{op}'"),
            ));
        }
        Ok(expr)
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("native", &self.native)
            .field("sql_type", &self.sql_type())
            .field("identity", &self.identity)
            .field("table", &self.table())
            .field("name", &self.name())
            .field("has_check", &self.check.is_some())
            .finish()
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.native == other.native
            && self.identity == other.identity
            && self.binding == other.binding
            && self.sql_type() == other.sql_type()
    }
}

impl Eq for Column {}

impl Hash for Column {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.native.hash(state);
        self.sql_type().hash(state);
        self.identity.hash(state);
        self.binding.hash(state);
    }
}
