//! The loaded schema: every table, the database path and the relationship graph.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use indexmap::IndexMap;

use super::{Column, SchemaError, SchemaResult, Table};
use crate::config::{expand_env_vars, SchemaDocument, DEFAULT_TIMEZONE};
use crate::graph::RelationshipGraph;
use crate::sql::quote::{split_path, unquote};

/// In-memory relational schema. Built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Schema {
    database: PathBuf,
    timezone: Tz,
    tables: Vec<Table>,
    graph: RelationshipGraph,
}

impl Schema {
    /// Create a schema from already-built tables.
    pub fn new(database: impl Into<PathBuf>, tables: Vec<Table>) -> SchemaResult<Self> {
        for (idx, table) in tables.iter().enumerate() {
            if tables[..idx].iter().any(|t| t.name() == table.name()) {
                return Err(SchemaError::DuplicateTable(table.name().to_string()));
            }
        }

        let graph = RelationshipGraph::build(&tables);
        let timezone = parse_timezone(DEFAULT_TIMEZONE)?;

        Ok(Self {
            database: database.into(),
            timezone,
            tables,
            graph,
        })
    }

    /// Build a schema from a parsed YAML document.
    pub fn from_document(doc: &SchemaDocument) -> SchemaResult<Self> {
        let database = expand_env_vars(&doc.sql.file)?;
        if database.trim().is_empty() {
            return Err(SchemaError::Config("sql.file must not be empty".into()));
        }

        let tables = doc
            .database
            .tables
            .iter()
            .map(|(name, columns)| Table::from_spec(name.clone(), columns))
            .collect::<SchemaResult<Vec<_>>>()?;

        let mut schema = Self::new(database, tables)?;
        schema.timezone = parse_timezone(doc.timezone())?;

        log::info!(
            "Loaded schema with {} tables ({} relationships)",
            schema.tables.len(),
            schema.graph.relationship_count()
        );
        Ok(schema)
    }

    /// Parse and build a schema from YAML text.
    pub fn from_yaml_str(source: &str) -> SchemaResult<Self> {
        Self::from_document(&SchemaDocument::from_yaml_str(source)?)
    }

    /// Read, parse and build a schema from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        Self::from_document(&SchemaDocument::from_yaml_file(path)?)
    }

    /// Replace the timezone used for audit timestamps.
    pub fn with_timezone(mut self, timezone: &str) -> SchemaResult<Self> {
        self.timezone = parse_timezone(timezone)?;
        Ok(self)
    }

    /// Path of the SQLite database file.
    pub fn database(&self) -> &Path {
        &self.database
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Tables in declaration order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Table names in declaration order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(Table::name).collect()
    }

    pub fn relationship_graph(&self) -> &RelationshipGraph {
        &self.graph
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn table(&self, name: &str) -> SchemaResult<&Table> {
        self.get_table(name)
            .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.get_table(name).is_some()
    }

    /// Declaration index of a table.
    pub fn table_index(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.name() == name)
    }

    /// Does any table own this column? Accepts bare names and column paths.
    pub fn has_column(&self, name: &str) -> bool {
        self.resolve_column(name).is_ok()
    }

    /// Resolve a bare column name or a `table.column` path to its owner.
    ///
    /// A bare name resolves to the first table, in declaration order, that
    /// declares it.
    pub fn resolve_column(&self, name: &str) -> SchemaResult<(&Table, &Column)> {
        let unknown = || SchemaError::UnknownColumn(name.to_string());

        if let (Some(table), column) = split_path(name) {
            if let Some(table) = self.get_table(&unquote(table)) {
                let column = table.column(column).ok_or_else(unknown)?;
                return Ok((table, column));
            }
        }

        self.tables
            .iter()
            .find_map(|table| table.column(name).map(|column| (table, column)))
            .ok_or_else(unknown)
    }

    /// Fully qualified `table.column` path for a column.
    pub fn column_path(&self, name: &str) -> SchemaResult<String> {
        let (table, column) = self.resolve_column(name)?;
        Ok(table.column_path(column))
    }

    /// Rewrite the keys of a column map into column paths.
    pub fn column_path_map<V: Clone>(
        &self,
        values: &IndexMap<String, V>,
    ) -> SchemaResult<IndexMap<String, V>> {
        values
            .iter()
            .map(|(column, value)| Ok((self.column_path(column)?, value.clone())))
            .collect()
    }

    /// Keep only the entries of a column map that belong to `table`.
    pub fn table_column_map<V: Clone>(
        &self,
        values: &IndexMap<String, V>,
        table: &str,
    ) -> SchemaResult<IndexMap<String, V>> {
        let table = self.table(table)?;
        Ok(values
            .iter()
            .filter(|(column, _)| table.has_column(column))
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect())
    }

    /// Tables owning any of the given columns, in declaration order.
    pub fn tables_for_columns<S: AsRef<str>>(&self, columns: &[S]) -> SchemaResult<Vec<&str>> {
        for column in columns {
            if !self.has_column(column.as_ref()) {
                return Err(SchemaError::UnknownColumn(column.as_ref().to_string()));
            }
        }

        Ok(self
            .tables
            .iter()
            .filter(|table| {
                columns.iter().any(|column| match split_path(column.as_ref()) {
                    (Some(owner), name) if self.contains_table(&unquote(owner)) => {
                        unquote(owner) == table.name() && table.has_column(name)
                    }
                    _ => table.has_column(column.as_ref()),
                })
            })
            .map(Table::name)
            .collect())
    }
}

fn parse_timezone(name: &str) -> SchemaResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| SchemaError::UnknownTimezone(name.to_string()))
}
