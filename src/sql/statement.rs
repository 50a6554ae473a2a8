//! Statement builders and the schema-aware compiler that turns them into
//! parameterized SQLite statements.
//!
//! # Examples
//!
//! ```ignore
//! use kocher::sql::{Compiler, Insert, Select, SelectionBuilder, Update};
//!
//! let compiler = Compiler::new(&schema);
//!
//! let insert = Insert::into("Table1").columns(["Unique ID"]).values(["ID-1"]);
//! let stmt = compiler.compile_insert(&insert)?;
//!
//! let select = Select::columns(["Table1.Unique ID", "Table2.Species"])
//!     .from(["Table1", "Table2"])
//!     .filter(SelectionBuilder::new().like("Species", ["Canis"]).build());
//! let stmt = compiler.compile_select(&select)?;
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::clock::{Clock, SystemClock};
use super::join::inner_join;
use super::quote::{placeholders, quote_ident, quote_path, split_path, unquote};
use super::selection::SelectionExpression;
use super::{CompileError, CompileResult};
use crate::model::{Column, Schema, SchemaError, Table};
use crate::planner::{resolve_join, JoinPlan};

/// Name of the audit column stamped on every insert and update.
pub fn last_modified_column(table: &str) -> String {
    format!("Last Modified ({})", table)
}

/// Name of the audit column stamped on every insert.
pub fn entry_created_column(table: &str) -> String {
    format!("Entry Created ({})", table)
}

/// Compiled SQL text plus its positional parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

// ============================================================================
// INSERT
// ============================================================================

/// INSERT of a single row.
#[derive(Debug, Clone)]
#[must_use = "statements have no effect until compiled"]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

impl Insert {
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn columns(mut self, cols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = cols.into_iter().map(Into::into).collect();
        self
    }

    pub fn values(mut self, vals: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.values = vals.into_iter().map(Into::into).collect();
        self
    }

    /// Set columns and values together from ordered pairs.
    pub fn row(mut self, pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        let (columns, values) = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .unzip();
        self.columns = columns;
        self.values = values;
        self
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// UPDATE of the rows matching a selection.
///
/// With a join key and a join plan the selection is evaluated over the joined
/// tables and the rows to update are picked through a correlated subquery.
#[derive(Debug, Clone)]
#[must_use = "statements have no effect until compiled"]
pub struct Update {
    pub table: String,
    pub assignments: Vec<(String, String)>,
    pub selection: SelectionExpression,
    pub join_key: Option<String>,
    pub join_plan: Option<JoinPlan>,
}

impl Update {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            assignments: Vec::new(),
            selection: SelectionExpression::empty(),
            join_key: None,
            join_plan: None,
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.assignments.push((column.into(), value.into()));
        self
    }

    pub fn filter(mut self, selection: SelectionExpression) -> Self {
        self.selection = selection;
        self
    }

    /// Column of the updated table matched against the joined rows.
    pub fn join_key(mut self, key: impl Into<String>) -> Self {
        self.join_key = Some(key.into());
        self
    }

    pub fn join_plan(mut self, plan: JoinPlan) -> Self {
        self.join_plan = Some(plan);
        self
    }
}

// ============================================================================
// SELECT
// ============================================================================

/// SELECT over one table or a join of several.
///
/// Without an explicit plan the join is resolved from `tables`; when `tables`
/// is empty it is taken from the owners of the projected and filtered columns.
#[derive(Debug, Clone)]
#[must_use = "statements have no effect until compiled"]
pub struct Select {
    pub columns: Vec<String>,
    pub tables: Vec<String>,
    pub selection: SelectionExpression,
    pub join_plan: Option<JoinPlan>,
}

impl Select {
    pub fn columns(cols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            columns: cols.into_iter().map(Into::into).collect(),
            tables: Vec::new(),
            selection: SelectionExpression::empty(),
            join_plan: None,
        }
    }

    pub fn from(mut self, tables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, selection: SelectionExpression) -> Self {
        self.selection = selection;
        self
    }

    pub fn join_plan(mut self, plan: JoinPlan) -> Self {
        self.join_plan = Some(plan);
        self
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Compiles statements against a schema.
///
/// Holds no mutable state; the clock is read once per statement.
#[derive(Clone)]
pub struct Compiler<'s> {
    schema: &'s Schema,
    clock: Arc<dyn Clock>,
}

impl<'s> Compiler<'s> {
    /// A compiler stamping wall-clock time in the schema's timezone.
    pub fn new(schema: &'s Schema) -> Self {
        Self::with_clock(schema, SystemClock::new(schema.timezone()))
    }

    pub fn with_clock(schema: &'s Schema, clock: impl Clock + 'static) -> Self {
        Self {
            schema,
            clock: Arc::new(clock),
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// `CREATE TABLE IF NOT EXISTS` for one table.
    pub fn compile_create_table(&self, table: &Table) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(table.name()),
            table.definitions()
        )
    }

    /// `CREATE TABLE IF NOT EXISTS` for every table, in declaration order.
    pub fn compile_create_tables(&self) -> Vec<String> {
        self.schema
            .tables()
            .iter()
            .map(|table| self.compile_create_table(table))
            .collect()
    }

    pub fn compile_insert(&self, insert: &Insert) -> CompileResult<Statement> {
        let table = self.schema.table(&insert.table)?;
        if insert.columns.is_empty() {
            return Err(CompileError::EmptySet(format!("insert into {}", table.name())));
        }
        if insert.columns.len() != insert.values.len() {
            return Err(CompileError::ValueCountMismatch {
                columns: insert.columns.len(),
                values: insert.values.len(),
            });
        }

        let mut assignments: IndexMap<String, String> = IndexMap::new();
        for (column, value) in insert.columns.iter().zip(&insert.values) {
            let column = table_column(table, column)?;
            assignments.insert(column.name().to_string(), value.clone());
        }

        let last_modified = audit_column(table, last_modified_column)?;
        let entry_created = audit_column(table, entry_created_column)?;
        let timestamp = self.clock.timestamp();
        assignments.insert(last_modified, timestamp.clone());
        assignments.insert(entry_created, timestamp);

        let columns: Vec<String> = assignments.keys().map(|c| quote_ident(c)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table.name()),
            columns.join(", "),
            placeholders(assignments.len())
        );
        let params = assignments.values().map(|v| quote_ident(v)).collect();

        log::info!("Created insert statement for {}", table.name());
        Ok(self.finish(sql, params))
    }

    pub fn compile_update(&self, update: &Update) -> CompileResult<Statement> {
        let table = self.schema.table(&update.table)?;
        if update.assignments.is_empty() {
            return Err(CompileError::EmptySet(format!("update {}", table.name())));
        }
        for column in update.selection.columns() {
            self.schema.resolve_column(column)?;
        }

        let mut assignments: IndexMap<String, String> = IndexMap::new();
        for (column, value) in &update.assignments {
            let column = table_column(table, column)?;
            assignments.insert(column.name().to_string(), value.clone());
        }
        let last_modified = audit_column(table, last_modified_column)?;
        assignments.insert(last_modified, self.clock.timestamp());

        let set: Vec<String> = assignments
            .keys()
            .map(|c| format!("{} = ?", quote_ident(c)))
            .collect();
        let mut params: Vec<String> = assignments.values().map(|v| quote_ident(v)).collect();

        let predicate = update.selection.compile_where();
        let condition = match (&update.join_key, &update.join_plan) {
            (None, None) => predicate.sql.clone(),
            (Some(key), Some(plan)) if !plan.is_single() => {
                if !plan.table_names().contains(&table.name()) {
                    return Err(CompileError::InvalidJoinSpec(format!(
                        "{} is not part of the join",
                        table.name()
                    )));
                }
                let key = quote_ident(table_column(table, key)?.name());
                format!(
                    "{key} IN (SELECT {table}.{key} FROM {from}{filter})",
                    table = quote_ident(table.name()),
                    from = inner_join(plan),
                    filter = predicate.suffix(),
                )
            }
            (Some(_), _) => {
                return Err(CompileError::InvalidJoinSpec(
                    "join key given without joined tables".into(),
                ))
            }
            (None, Some(_)) => {
                return Err(CompileError::InvalidJoinSpec(
                    "joined tables given without a join key".into(),
                ))
            }
        };
        params.extend(predicate.params);

        let mut sql = format!("UPDATE {} SET {}", quote_ident(table.name()), set.join(", "));
        if !condition.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&condition);
        }

        log::info!("Created update statement for {}", table.name());
        Ok(self.finish(sql, params))
    }

    pub fn compile_select(&self, select: &Select) -> CompileResult<Statement> {
        if select.columns.is_empty() {
            return Err(CompileError::EmptySet("select".into()));
        }
        for column in &select.columns {
            self.check_projection(column)?;
        }
        for column in select.selection.columns() {
            self.schema.resolve_column(column)?;
        }

        let from = match &select.join_plan {
            Some(plan) => {
                for table in plan.table_names() {
                    self.schema.table(table)?;
                }
                inner_join(plan)
            }
            None if select.tables.is_empty() => {
                let tables = self.referenced_tables(&select.columns, &select.selection)?;
                inner_join(&resolve_join(self.schema, &tables)?)
            }
            None => inner_join(&resolve_join(self.schema, &select.tables)?),
        };

        let columns: Vec<String> = select.columns.iter().map(|c| quote_path(c)).collect();
        let predicate = select.selection.compile_where();
        let sql = format!(
            "SELECT {} FROM {}{}",
            columns.join(", "),
            from,
            predicate.suffix()
        );

        log::info!("Created selection statement for database call");
        Ok(self.finish(sql, predicate.params))
    }

    /// Tables owning the given columns and the selection's columns.
    ///
    /// Bare names go to their first owner; `table.*` names its table.
    pub fn referenced_tables<S: AsRef<str>>(
        &self,
        columns: &[S],
        selection: &SelectionExpression,
    ) -> CompileResult<Vec<&'s str>> {
        let mut indices: Vec<usize> = Vec::new();
        let names = columns
            .iter()
            .map(|c: &S| c.as_ref())
            .chain(selection.columns());

        for column in names {
            let table = match split_path(column) {
                (Some(table), "*") => self.schema.table(&unquote(table))?,
                (None, "*") => continue,
                _ => self.schema.resolve_column(column)?.0,
            };
            if let Some(idx) = self.schema.table_index(table.name()) {
                indices.push(idx);
            }
        }

        indices.sort_unstable();
        indices.dedup();
        let tables = self.schema.tables();
        Ok(indices.into_iter().map(|idx| tables[idx].name()).collect())
    }

    fn check_projection(&self, column: &str) -> CompileResult<()> {
        match split_path(column) {
            (None, "*") => Ok(()),
            (Some(table), "*") => self.schema.table(&unquote(table)).map(|_| ()).map_err(Into::into),
            _ => self.schema.resolve_column(column).map(|_| ()).map_err(Into::into),
        }
    }

    fn finish(&self, sql: String, params: Vec<String>) -> Statement {
        log::debug!("{} ({} params)", sql, params.len());
        Statement::new(sql, params)
    }
}

impl fmt::Debug for Compiler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("database", &self.schema.database())
            .finish_non_exhaustive()
    }
}

/// Declared name of one of `table`'s audit columns. Tables written through the
/// compiler must declare them.
fn audit_column(table: &Table, name: fn(&str) -> String) -> Result<String, SchemaError> {
    table_column(table, &name(table.name())).map(|column| column.name().to_string())
}

/// Resolve a column of `table` given as a bare name or a path on that table.
fn table_column<'t>(table: &'t Table, column: &str) -> Result<&'t Column, SchemaError> {
    let bare = match split_path(column) {
        (Some(owner), name) if unquote(owner) == table.name() => name,
        _ => column,
    };
    table
        .column(bare)
        .ok_or_else(|| SchemaError::UnknownColumn(format!("{}.{}", table.name(), unquote(bare))))
}
