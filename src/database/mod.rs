//! SQLite execution of compiled statements.
//!
//! [`Database`] owns one `rusqlite` connection. Statements are compiled with a
//! [`Compiler`] and run with positional parameters. Unique-constraint failures
//! are translated into a message naming the offending value and column; every
//! other engine error is passed through untouched.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use thiserror::Error;

use crate::sql::quote::{split_path, unquote};
use crate::sql::{CompileError, Compiler, Insert, Select, Statement, Update};

/// Prefix SQLite puts on unique-constraint failures.
const UNIQUE_FAILED: &str = "UNIQUE constraint failed: ";

/// Errors raised while talking to the database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{value} already exists. {column} does not support duplicate entries")]
    DuplicateEntry { value: String, column: String },

    #[error(transparent)]
    Engine(#[from] rusqlite::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// One result row: column name to value, in projection order.
///
/// A name the result carries more than once is keyed by its column path
/// (`Table1.Site`, `Table2.Site`) when the projection names every column,
/// otherwise its repeats are keyed `Site (2)`, `Site (3)` and so on.
pub type Row = IndexMap<String, Value>;

/// A connection to the lab database.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open the database file, creating it if missing.
    pub fn create(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        log::info!("Opened database {}", path.display());
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an existing database file.
    pub fn open(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatabaseError::NotFound(path.to_path_buf()));
        }
        Self::create(path)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> DatabaseResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Path of the backing file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create every table of the compiler's schema.
    pub fn create_tables(&self, compiler: &Compiler<'_>) -> DatabaseResult<()> {
        for sql in compiler.compile_create_tables() {
            log::debug!("{}", sql);
            self.conn.execute(&sql, [])?;
        }
        log::info!(
            "Created {} tables",
            compiler.schema().tables().len()
        );
        Ok(())
    }

    /// Insert one row. Returns the number of rows written.
    pub fn insert(&self, compiler: &Compiler<'_>, insert: &Insert) -> DatabaseResult<usize> {
        let statement = compiler.compile_insert(insert)?;
        let pairs: Vec<(&str, &str)> = insert
            .columns
            .iter()
            .zip(&insert.values)
            .map(|(c, v)| (c.as_str(), v.as_str()))
            .collect();

        let written = self
            .execute(&statement)
            .map_err(|err| translate_engine_error(err, &pairs))?;
        log::info!("Inserted values into {}", insert.table);
        Ok(written)
    }

    /// Update matching rows. Returns the number of rows changed.
    pub fn update(&self, compiler: &Compiler<'_>, update: &Update) -> DatabaseResult<usize> {
        let statement = compiler.compile_update(update)?;
        let pairs: Vec<(&str, &str)> = update
            .assignments
            .iter()
            .map(|(c, v)| (c.as_str(), v.as_str()))
            .collect();

        let changed = self
            .execute(&statement)
            .map_err(|err| translate_engine_error(err, &pairs))?;
        log::info!("Updated {} rows of {}", changed, update.table);
        Ok(changed)
    }

    /// Run a selection and collect every row.
    pub fn retrieve(&self, compiler: &Compiler<'_>, select: &Select) -> DatabaseResult<Vec<Row>> {
        let statement = compiler.compile_select(select)?;
        let rows = self.collect_rows(&statement, projection_paths(compiler, select).as_deref())?;
        log::info!("Retrieved {} rows", rows.len());
        Ok(rows)
    }

    /// Execute a compiled statement.
    pub fn execute(&self, statement: &Statement) -> rusqlite::Result<usize> {
        log::debug!("{} ({} params)", statement.sql, statement.params.len());
        self.conn
            .execute(&statement.sql, params_from_iter(statement.params.iter()))
    }

    /// Run a compiled query and collect its rows.
    pub fn query(&self, statement: &Statement) -> DatabaseResult<Vec<Row>> {
        self.collect_rows(statement, None)
    }

    fn collect_rows(
        &self,
        statement: &Statement,
        paths: Option<&[String]>,
    ) -> DatabaseResult<Vec<Row>> {
        log::debug!("{} ({} params)", statement.sql, statement.params.len());
        let mut stmt = self.conn.prepare(&statement.sql)?;
        let names = row_keys(&stmt.column_names(), paths);

        let rows = stmt
            .query_map(params_from_iter(statement.params.iter()), |row| {
                names
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| Ok((name.clone(), row.get::<_, Value>(idx)?)))
                    .collect::<rusqlite::Result<Row>>()
            })?
            .collect::<rusqlite::Result<Vec<Row>>>()?;
        Ok(rows)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

/// Column paths of a projection without wildcards, one per result column.
fn projection_paths(compiler: &Compiler<'_>, select: &Select) -> Option<Vec<String>> {
    if select.columns.iter().any(|c| split_path(c).1 == "*") {
        return None;
    }
    select
        .columns
        .iter()
        .map(|c| compiler.schema().column_path(c))
        .collect::<Result<Vec<_>, _>>()
        .ok()
}

/// Distinct row keys for the engine's result column names.
fn row_keys(names: &[&str], paths: Option<&[String]>) -> Vec<String> {
    let paths = paths.filter(|p| p.len() == names.len());
    names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let repeats = names.iter().filter(|n| *n == name).count();
            if repeats == 1 {
                return name.to_string();
            }
            match paths {
                Some(paths) => paths[idx].clone(),
                None => match names[..idx].iter().filter(|n| *n == name).count() {
                    0 => name.to_string(),
                    seen => format!("{} ({})", name, seen + 1),
                },
            }
        })
        .collect()
}

/// Translate an engine error raised while writing `pairs`.
///
/// `UNIQUE constraint failed: T.col` becomes [`DatabaseError::DuplicateEntry`]
/// naming the value written to `col`; anything else is returned as is.
pub fn translate_engine_error(err: rusqlite::Error, pairs: &[(&str, &str)]) -> DatabaseError {
    let message = match &err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.clone(),
        _ => return DatabaseError::Engine(err),
    };

    let Some(path) = message.strip_prefix(UNIQUE_FAILED) else {
        return DatabaseError::Engine(err);
    };
    let path = path.split(", ").next().unwrap_or(path);
    let (_, failed) = split_path(path);
    let failed = unquote(failed);

    let value = pairs.iter().find_map(|(column, value)| {
        let (_, name) = split_path(column);
        (unquote(name) == failed).then(|| value.to_string())
    });

    match value {
        Some(value) => {
            log::warn!("Duplicate entry rejected for {}", path);
            DatabaseError::DuplicateEntry {
                value,
                column: path.to_string(),
            }
        }
        None => DatabaseError::Engine(err),
    }
}

/// Plain-text rendering of a stored value.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
