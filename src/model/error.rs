//! Errors raised while loading or querying the schema model.

use std::path::PathBuf;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while building or looking up the schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Only a single primary key may be assigned: {table} declares {first} and {second}")]
    DuplicatePrimaryKey {
        table: String,
        first: String,
        second: String,
    },

    #[error("Only a single join by column may be assigned: {table} declares {first} and {second}")]
    DuplicateJoinBy {
        table: String,
        first: String,
        second: String,
    },

    #[error("Duplicate table name: {0}")]
    DuplicateTable(String),

    #[error("Duplicate column {column} in table {table}")]
    DuplicateColumn { table: String, column: String },

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Table ({0}) not found")]
    UnknownTable(String),

    #[error("Column ({0}) not found")]
    UnknownColumn(String),
}

impl SchemaError {
    /// Is this a malformed-document error (as opposed to a failed lookup)?
    pub fn is_config_error(&self) -> bool {
        !matches!(
            self,
            SchemaError::UnknownTable(_) | SchemaError::UnknownColumn(_)
        )
    }
}
