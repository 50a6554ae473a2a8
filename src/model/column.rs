//! Column declarations.

use crate::config::ColumnSpec;
use crate::sql::quote::{quote_ident, unquote};

/// A single declared column. Immutable once the schema is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    sql_type: String,
    primary_key: bool,
    not_null: bool,
    db_specific: bool,
    join_by: bool,
}

impl Column {
    /// Create a plain column with no flags set.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            primary_key: false,
            not_null: false,
            db_specific: false,
            join_by: false,
        }
    }

    /// Build a column from its YAML declaration.
    pub fn from_spec(name: impl Into<String>, spec: &ColumnSpec) -> Self {
        Self {
            name: name.into(),
            sql_type: spec.sql_type.clone(),
            primary_key: spec.primary_key,
            not_null: spec.not_null,
            db_specific: spec.db_specific,
            join_by: spec.join_by,
        }
    }

    pub fn with_primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn with_not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn with_db_specific(mut self) -> Self {
        self.db_specific = true;
        self
    }

    pub fn with_join_by(mut self) -> Self {
        self.join_by = true;
        self
    }

    /// Name as declared (may carry its own double quotes).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name with any double quotes removed.
    pub fn unquoted_name(&self) -> String {
        unquote(&self.name)
    }

    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_not_null(&self) -> bool {
        self.not_null
    }

    pub fn is_db_specific(&self) -> bool {
        self.db_specific
    }

    pub fn is_join_by(&self) -> bool {
        self.join_by
    }

    /// Does `name` refer to this column, quoted or not?
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || unquote(&self.name) == unquote(name)
    }

    /// Column definition used inside `CREATE TABLE`.
    ///
    /// `PRIMARY KEY` wins over `NOT NULL` when both are set.
    pub fn definition(&self) -> String {
        let mut def = format!("{} {}", quote_ident(&self.name), self.sql_type);
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        } else if self.not_null {
            def.push_str(" NOT NULL");
        }
        def
    }
}
