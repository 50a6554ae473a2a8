//! SQL generation for the SQLite lab database.
//!
//! - [`quote`] - identifier and literal quoting
//! - [`selection`] - WHERE predicates from a [`SelectionExpression`]
//! - [`join`] - FROM clauses from a resolved join plan
//! - [`statement`] - CREATE TABLE, INSERT, UPDATE and SELECT compilation
//! - [`clock`] - audit timestamps
//!
//! Every identifier and every literal value goes through the same quoting
//! rule, and every value is passed as a positional `?` parameter.

pub mod clock;
pub mod join;
pub mod quote;
pub mod selection;
pub mod statement;


use thiserror::Error;

use crate::model::SchemaError;
use crate::planner::JoinError;

pub use clock::{Clock, FixedClock, SystemClock, TIMESTAMP_FORMAT};
pub use join::inner_join;
pub use quote::{quote_ident, quote_path, unquote};
pub use selection::{Operator, SelectionBuilder, SelectionExpression, WhereClause};
pub use statement::{
    entry_created_column, last_modified_column, Compiler, Insert, Select, Statement, Update,
};

/// Errors raised while compiling a statement.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Join(#[from] JoinError),

    #[error("Error updating database, unable to create FROM statement: {0}")]
    InvalidJoinSpec(String),

    #[error("Column and value counts differ: {columns} columns, {values} values")]
    ValueCountMismatch { columns: usize, values: usize },

    #[error("Nothing to {0}: no columns given")]
    EmptySet(String),
}

pub type CompileResult<T> = Result<T, CompileError>;
