//! Table declarations.

use indexmap::IndexMap;

use super::{Column, SchemaError, SchemaResult};
use crate::config::ColumnSpec;

/// A declared table: an ordered list of columns with at most one primary key
/// and at most one join-by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    primary_key: Option<usize>,
    join_by: Option<usize>,
}

impl Table {
    /// Create a table, checking the single primary key / join-by rules.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> SchemaResult<Self> {
        let name = name.into();
        let mut primary_key: Option<usize> = None;
        let mut join_by: Option<usize> = None;

        for (idx, column) in columns.iter().enumerate() {
            if columns[..idx].iter().any(|c| c.matches(column.name())) {
                return Err(SchemaError::DuplicateColumn {
                    table: name,
                    column: column.name().to_string(),
                });
            }

            if column.is_primary_key() {
                if let Some(first) = primary_key {
                    return Err(SchemaError::DuplicatePrimaryKey {
                        table: name,
                        first: columns[first].name().to_string(),
                        second: column.name().to_string(),
                    });
                }
                primary_key = Some(idx);
            }

            if column.is_join_by() {
                if let Some(first) = join_by {
                    return Err(SchemaError::DuplicateJoinBy {
                        table: name,
                        first: columns[first].name().to_string(),
                        second: column.name().to_string(),
                    });
                }
                join_by = Some(idx);
            }
        }

        Ok(Self {
            name,
            columns,
            primary_key,
            join_by,
        })
    }

    /// Build a table from its YAML column map.
    pub fn from_spec(
        name: impl Into<String>,
        columns: &IndexMap<String, ColumnSpec>,
    ) -> SchemaResult<Self> {
        let columns = columns
            .iter()
            .map(|(column, spec)| Column::from_spec(column.clone(), spec))
            .collect();
        Self::new(name, columns)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by its quoted or unquoted name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.matches(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn primary_key(&self) -> Option<&Column> {
        self.primary_key.map(|idx| &self.columns[idx])
    }

    pub fn join_by_key(&self) -> Option<&Column> {
        self.join_by.map(|idx| &self.columns[idx])
    }

    /// Can this table join `other` directly? True when either table's join-by
    /// key is a column of the other.
    pub fn can_join(&self, other: &Table) -> bool {
        self.join_key(other).is_some()
    }

    /// The column used to join `child` onto this table.
    ///
    /// The child's join-by key is used when this table has it, otherwise this
    /// table's own join-by key when the child has it.
    pub fn join_key<'a>(&'a self, child: &'a Table) -> Option<&'a str> {
        if let Some(key) = child.join_by_key() {
            if self.has_column(key.name()) {
                return Some(key.name());
            }
        }
        match self.join_by_key() {
            Some(key) if child.has_column(key.name()) => Some(key.name()),
            _ => None,
        }
    }

    /// `table.column` for one of this table's columns.
    pub fn column_path(&self, column: &Column) -> String {
        format!("{}.{}", self.name, column.name())
    }

    /// Column paths for a projection of this table.
    ///
    /// Db-specific columns are dropped unless `include_db_specific` is set.
    /// When nothing is dropped the projection is returned as `table.*`.
    pub fn column_paths(&self, include_db_specific: bool) -> Vec<String> {
        let kept: Vec<&Column> = self
            .columns
            .iter()
            .filter(|c| include_db_specific || !c.is_db_specific())
            .collect();

        if kept.len() == self.columns.len() {
            return vec![format!("{}.*", self.name)];
        }

        kept.into_iter().map(|c| self.column_path(c)).collect()
    }

    /// Comma-separated column definitions for `CREATE TABLE`.
    pub fn definitions(&self) -> String {
        self.columns
            .iter()
            .map(Column::definition)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
