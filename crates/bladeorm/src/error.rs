//! Error types for bladeorm

use thiserror::Error;

/// Result type alias for bladeorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for schema definition, expression building and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Invalid entity declaration (identity columns, identifiers, duplicates)
    #[error("Definition error: {0}")]
    Definition(String),

    /// Column used in an expression before it was bound to a table
    #[error("Binding error: {0}")]
    Binding(String),

    /// Operand type incompatible with the column's declared type
    #[error("Type mismatch: cannot compare {expected} with {found}")]
    TypeMismatch { expected: String, found: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation not allowed in the instance's current state
    #[error("State error: {0}")]
    State(String),

    /// Column name not declared on the entity
    #[error("Unknown column '{column}' on {entity}")]
    UnknownColumn { entity: String, column: String },

    /// Write to a read-only projection
    #[error("Immutable: {0}")]
    Immutable(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a definition error
    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition(message.into())
    }

    /// Create a binding error
    pub fn binding(message: impl Into<String>) -> Self {
        Self::Binding(message.into())
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State(message.into())
    }

    /// Create an unknown column error
    pub fn unknown_column(entity: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            entity: entity.into(),
            column: column.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a definition error
    pub fn is_definition(&self) -> bool {
        matches!(self, Self::Definition(_))
    }

    /// Check if this is a binding error
    pub fn is_binding(&self) -> bool {
        matches!(self, Self::Binding(_))
    }

    /// Check if this is a type mismatch error
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a state error
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }

    /// Check if this is an unknown column error
    pub fn is_unknown_column(&self) -> bool {
        matches!(self, Self::UnknownColumn { .. })
    }

    /// Check if this is an immutability error
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Immutable(_))
    }
}
