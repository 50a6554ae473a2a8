//! Schema configuration for kocher.
//!
//! The schema is declared in a YAML document that names the SQLite file and
//! every table with its columns, in declaration order:
//!
//! ```yaml
//! sql:
//!   file: ${KOCHER_DATA}/kocherDB.sqlite
//!   timezone: US/Eastern
//! database:
//!   tables:
//!     Collection:
//!       "Unique ID": { type: text, primary_key: true, join_by: true }
//!       Species: { type: text, not_null: true }
//!       "Last Modified (Collection)": { type: text, db_specific: true }
//!       "Entry Created (Collection)": { type: text, db_specific: true }
//! ```

mod document;
mod env;

pub use document::{ColumnSpec, DatabaseSection, SchemaDocument, SqlSection, DEFAULT_TIMEZONE};
pub use env::expand_env_vars;
