use crate::column::Column;
use crate::error::{OrmError, OrmResult};
use crate::ident::check_identifier;

/// Declaration of an entity before registration: a name, optional table
/// name and the column prototypes, in order.
#[derive(Debug, Clone)]
pub struct EntityShape {
    name: String,
    table: Option<String>,
    columns: Vec<(String, Column)>,
    identity: Option<String>,
}

impl EntityShape {
    /// Start a shape. The table name defaults to the lowercased name plus `s`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            columns: Vec::new(),
            identity: None,
        }
    }

    /// Override the table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add a column from a prototype.
    pub fn column(mut self, name: impl Into<String>, prototype: Column) -> Self {
        self.columns.push((name.into(), prototype));
        self
    }

    /// Name the identity column explicitly instead of detecting it.
    pub fn identity(mut self, name: impl Into<String>) -> Self {
        self.identity = Some(name.into());
        self
    }
}

/// A registered entity: bound columns, table name and identity column.
#[derive(Debug)]
pub struct EntitySchema {
    name: String,
    table: String,
    columns: Vec<(String, Column)>,
    identity: Option<usize>,
}

impl EntitySchema {
    /// Bind every column of `shape` to its table and resolve the identity column.
    pub fn from_shape(shape: EntityShape) -> OrmResult<Self> {
        let EntityShape {
            name,
            table,
            columns,
            identity,
        } = shape;

        let table = table.unwrap_or_else(|| format!("{}s", name.to_lowercase()));
        check_identifier("table", &table)?;

        let mut bound: Vec<(String, Column)> = Vec::with_capacity(columns.len());
        for (column_name, prototype) in columns {
            check_identifier("column", &column_name)?;
            if bound.iter().any(|(n, _)| *n == column_name) {
                return Err(OrmError::definition(format!(
                    "{name} declares column '{column_name}' more than once"
                )));
            }
            let column = prototype.bind(table.as_str(), column_name.as_str(), None);
            if let Some(default) = column.default_value() {
                let ty = column.column_type();
                if !ty.accepts(default) {
                    return Err(OrmError::definition(format!(
                        "default {default} of {name}.{column_name} is not a {ty} value"
                    )));
                }
                column.validate(default)?;
            }
            bound.push((column_name, column));
        }

        let identity = match identity {
            Some(explicit) => Some(
                bound
                    .iter()
                    .position(|(n, _)| *n == explicit)
                    .ok_or_else(|| OrmError::unknown_column(&name, &explicit))?,
            ),
            None => {
                let mut flagged = bound
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, c))| c.is_identity())
                    .map(|(i, _)| i);
                let first = flagged.next();
                if flagged.next().is_some() {
                    return Err(OrmError::definition(format!(
                        "{name} has more than one identity column"
                    )));
                }
                first
            }
        };

        Ok(Self {
            name,
            table,
            columns: bound,
            identity,
        })
    }

    /// Entity name (as declared, e.g. `Person`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index_of(name).map(|i| &self.columns[i].1)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    pub(crate) fn column_at(&self, index: usize) -> (&str, &Column) {
        let (name, column) = &self.columns[index];
        (name, column)
    }

    pub fn identity(&self) -> Option<&Column> {
        self.identity.map(|i| &self.columns[i].1)
    }

    pub fn identity_name(&self) -> Option<&str> {
        self.identity.map(|i| self.columns[i].0.as_str())
    }

    pub(crate) fn identity_index(&self) -> Option<usize> {
        self.identity
    }

    /// `CREATE TABLE IF NOT EXISTS t (col type, ...)`
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|(n, c)| format!("{n} {}", c.sql_type()))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table,
            columns.join(", ")
        )
    }
}
