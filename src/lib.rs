//! # Kocher
//!
//! Schema-graph query compiler for the kocher lab-sample database.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              YAML schema document (config)               │
//! │        (sql.file, tables, columns, key flags)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model]
//! ┌─────────────────────────────────────────────────────────┐
//! │          Schema (Table, Column, join-by keys)            │
//! │          + RelationshipGraph (graph)                     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │        JoinPlan (primary table, direct/nested joins)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Parameterized SQLite statement + params           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [database]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  rusqlite connection                     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything above the database layer is pure: a loaded [`Schema`] is
//! read-only and can be shared between threads without locking.
//!
//! [`Schema`]: model::Schema

pub mod config;
pub mod database;
pub mod graph;
pub mod model;
pub mod planner;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::database::{Database, DatabaseError, DatabaseResult, Row};
    pub use crate::graph::RelationshipGraph;
    pub use crate::model::{Column, Schema, SchemaError, SchemaResult, Table};
    pub use crate::planner::{resolve_join, JoinError, JoinKey, JoinPlan, JoinTarget};
    pub use crate::sql::{
        Clock, CompileError, CompileResult, Compiler, FixedClock, Insert, Operator, Select,
        SelectionBuilder, SelectionExpression, Statement, SystemClock, Update,
    };
}
