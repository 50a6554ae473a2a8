//! Row selection: which rows a SELECT or UPDATE touches.
//!
//! A [`SelectionExpression`] maps an [`Operator`] to column/value-list pairs.
//! It is built once with a [`SelectionBuilder`] and never mutated afterwards.
//!
//! ```text
//! IN       "Unique ID" IN (?, ?)
//! NOT IN   Species NOT IN (?)
//! LIKE     (Site LIKE ? OR Site LIKE ?)
//! ```

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use super::quote::{placeholders, quote_ident, quote_path};
use crate::model::{Schema, SchemaResult};

/// Comparison applied between a column and its value list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    In,
    NotIn,
    Like,
    NotLike,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
        }
    }

    /// `LIKE` and `NOT LIKE` wrap each value in wildcards.
    pub fn is_pattern(&self) -> bool {
        matches!(self, Operator::Like | Operator::NotLike)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(Operator::In),
            "NOT IN" => Ok(Operator::NotIn),
            "LIKE" => Ok(Operator::Like),
            "NOT LIKE" => Ok(Operator::NotLike),
            other => Err(format!("unknown selection operator: {}", other)),
        }
    }
}

/// A compiled WHERE predicate. `sql` has no `WHERE` keyword and is empty for
/// an empty selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    pub sql: String,
    pub params: Vec<String>,
}

impl WhereClause {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// ` WHERE <predicate>`, or nothing for an empty predicate.
    pub fn suffix(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.sql)
        }
    }
}

/// Immutable operator → column → values mapping, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionExpression {
    clauses: IndexMap<Operator, IndexMap<String, Vec<String>>>,
}

impl SelectionExpression {
    /// The empty selection: matches every row.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> SelectionBuilder {
        SelectionBuilder::new()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `(operator, column, values)` triples in compile order.
    pub fn clauses(&self) -> impl Iterator<Item = (Operator, &str, &[String])> {
        self.clauses.iter().flat_map(|(op, columns)| {
            columns
                .iter()
                .map(move |(column, values)| (*op, column.as_str(), values.as_slice()))
        })
    }

    /// Every column referenced, first occurrence order.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for (_, column, _) in self.clauses() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }

    /// Compile into a predicate with positional parameters.
    ///
    /// Parameters appear in exactly the order of their placeholders.
    pub fn compile_where(&self) -> WhereClause {
        let mut predicates = Vec::new();
        let mut params = Vec::new();

        for (op, column, values) in self.clauses() {
            let column = quote_path(column);
            if op.is_pattern() {
                let likes: Vec<String> = values
                    .iter()
                    .map(|_| format!("{} {} ?", column, op))
                    .collect();
                params.extend(values.iter().map(|v| quote_ident(&format!("%{}%", v))));
                if likes.len() > 1 {
                    predicates.push(format!("({})", likes.join(" OR ")));
                } else {
                    predicates.extend(likes);
                }
            } else {
                predicates.push(format!("{} {} ({})", column, op, placeholders(values.len())));
                params.extend(values.iter().map(|v| quote_ident(v)));
            }
        }

        WhereClause {
            sql: predicates.join(" AND "),
            params,
        }
    }

    /// Rewrite bare column names into `table.column` paths.
    pub fn qualify(&self, schema: &Schema) -> SchemaResult<Self> {
        let mut clauses: IndexMap<Operator, IndexMap<String, Vec<String>>> = IndexMap::new();
        for (op, columns) in &self.clauses {
            let qualified = schema.column_path_map(columns)?;
            let entry = clauses.entry(*op).or_default();
            for (column, values) in qualified {
                entry.entry(column).or_default().extend(values);
            }
        }
        Ok(Self { clauses })
    }

    /// Tables owning the referenced columns, in declaration order.
    pub fn tables<'s>(&self, schema: &'s Schema) -> SchemaResult<Vec<&'s str>> {
        schema.tables_for_columns(&self.columns())
    }
}

/// Accumulates selection clauses. Adding a column twice under the same
/// operator extends its value list.
#[derive(Debug, Clone, Default)]
pub struct SelectionBuilder {
    clauses: IndexMap<Operator, IndexMap<String, Vec<String>>>,
}

impl SelectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add values for a column under `op`. An empty value list is ignored.
    #[must_use]
    pub fn add<I, V>(mut self, op: Operator, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return self;
        }
        self.clauses
            .entry(op)
            .or_default()
            .entry(column.into())
            .or_default()
            .extend(values);
        self
    }

    #[must_use]
    pub fn is_in<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.add(Operator::In, column, values)
    }

    #[must_use]
    pub fn not_in<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.add(Operator::NotIn, column, values)
    }

    #[must_use]
    pub fn like<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.add(Operator::Like, column, values)
    }

    #[must_use]
    pub fn not_like<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.add(Operator::NotLike, column, values)
    }

    pub fn build(self) -> SelectionExpression {
        SelectionExpression {
            clauses: self.clauses,
        }
    }
}
