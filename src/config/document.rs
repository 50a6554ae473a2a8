//! Typed view of the YAML schema document.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use crate::model::SchemaError;

/// Timezone used for audit timestamps when `sql.timezone` is absent.
pub const DEFAULT_TIMEZONE: &str = "US/Eastern";

/// Root of the schema document.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDocument {
    pub sql: SqlSection,
    pub database: DatabaseSection,
}

/// The `sql` section: where the database lives and how audit times are stamped.
#[derive(Debug, Clone, Deserialize)]
pub struct SqlSection {
    /// SQLite file path (supports `${ENV_VAR}` expansion).
    pub file: String,

    /// IANA timezone name for `Entry Created` / `Last Modified` values.
    #[serde(default)]
    pub timezone: Option<String>,
}

/// The `database` section. Tables and columns keep declaration order.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    pub tables: IndexMap<String, IndexMap<String, ColumnSpec>>,
}

/// A single column declaration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    #[serde(rename = "type")]
    pub sql_type: String,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub primary_key: bool,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub not_null: bool,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub db_specific: bool,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub join_by: bool,
}

impl SchemaDocument {
    /// Parse a schema document from YAML text.
    pub fn from_yaml_str(source: &str) -> Result<Self, SchemaError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Read and parse a schema document from a file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SchemaError::FileNotFound(path.to_path_buf()));
        }
        let source = fs::read_to_string(path)?;
        Self::from_yaml_str(&source)
    }

    /// The timezone name for audit timestamps.
    pub fn timezone(&self) -> &str {
        self.sql.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE)
    }
}

/// Accept YAML 1.2 booleans as well as the capitalised `True`/`False` and
/// `yes`/`no` spellings found in older lab configs.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" => Ok(true),
            "false" | "no" | "n" | "off" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean flag, found '{}'",
                other
            ))),
        },
    }
}
