//! Schema model: tables and columns loaded from the YAML schema document.
//!
//! - [`Column`]: name, SQL type and flags (primary key, join-by, db-specific)
//! - [`Table`]: ordered columns with at most one primary key and one join-by key
//! - [`Schema`]: ordered tables, database path, audit timezone and the derived
//!   [`RelationshipGraph`](crate::graph::RelationshipGraph)

mod column;
mod error;
mod schema;
mod table;

pub use column::Column;
pub use error::{SchemaError, SchemaResult};
pub use schema::Schema;
pub use table::Table;
