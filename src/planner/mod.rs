//! Join planning: which tables to join, in which shape, on which keys.
//!
//! Resolution runs in two phases:
//! 1. Join set: the smallest set of tables that connects every requested table,
//!    built from the simple paths between each requested pair.
//! 2. Join shape: a primary table joined directly to its neighbours, with
//!    tables it cannot reach directly nested one level down under a link table.

mod join_resolver;
mod plan;

pub use join_resolver::{resolve_join, JoinResolver};
pub use plan::{Join, JoinKey, JoinPlan, JoinTarget};

use thiserror::Error;

use crate::model::SchemaError;

/// Errors that can occur while resolving a join.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("Table ({0}) not found")]
    UnknownTable(String),

    #[error("No tables given to join")]
    NoTables,

    #[error("No join path connects tables: {}", .tables.join(", "))]
    Impossible { tables: Vec<String> },

    #[error(
        "Ambiguous join for tables {}: {} equally small table sets ({})",
        .tables.join(", "),
        .candidates.len(),
        format_candidates(.candidates)
    )]
    Ambiguous {
        tables: Vec<String>,
        candidates: Vec<Vec<String>>,
    },

    #[error("Tables {} cannot be joined within one level of nesting", .tables.join(", "))]
    TooDeep { tables: Vec<String> },

    #[error("Malformed join plan: {0}")]
    MalformedPlan(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl JoinError {
    /// Does this error mean no valid join exists for the requested tables?
    pub fn is_impossible(&self) -> bool {
        matches!(self, JoinError::Impossible { .. } | JoinError::TooDeep { .. })
    }
}

pub type JoinResult<T> = Result<T, JoinError>;

fn format_candidates(candidates: &[Vec<String>]) -> String {
    candidates
        .iter()
        .map(|c| format!("[{}]", c.join(", ")))
        .collect::<Vec<_>>()
        .join(" / ")
}
