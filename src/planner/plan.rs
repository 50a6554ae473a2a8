//! The resolved join plan.

use super::{JoinError, JoinResult};

/// One join onto the primary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Join {
    /// `primary INNER JOIN table ON primary.key = table.key`
    Direct { table: String, key: String },

    /// A sub-join aliased to its link table:
    /// `primary INNER JOIN (link INNER JOIN t ON link.k2 = t.k2) link ON primary.key = link.key`
    ///
    /// `tables` holds each secondary table with the key joining it to `link`.
    Nested {
        link: String,
        key: String,
        tables: Vec<(String, String)>,
    },
}

impl Join {
    /// The table joined onto the primary (the link table for nested joins).
    pub fn table(&self) -> &str {
        match self {
            Join::Direct { table, .. } => table,
            Join::Nested { link, .. } => link,
        }
    }

    /// The key joining this entry onto the primary.
    pub fn key(&self) -> &str {
        match self {
            Join::Direct { key, .. } | Join::Nested { key, .. } => key,
        }
    }
}

/// Entry of the table list view of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinTarget {
    Table(String),
    /// `{link: [link, secondary...]}`
    Nested { link: String, tables: Vec<String> },
}

/// Entry of the join-key list view of a plan, parallel to the table list
/// without its first (primary) entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinKey {
    Column(String),
    /// `{link_key: [secondary_key...]}`
    Nested { key: String, keys: Vec<String> },
}

impl JoinTarget {
    pub fn table(name: impl Into<String>) -> Self {
        JoinTarget::Table(name.into())
    }

    pub fn nested(link: impl Into<String>, tables: &[&str]) -> Self {
        JoinTarget::Nested {
            link: link.into(),
            tables: tables.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl JoinKey {
    pub fn column(name: impl Into<String>) -> Self {
        JoinKey::Column(name.into())
    }

    pub fn nested(key: impl Into<String>, keys: &[&str]) -> Self {
        JoinKey::Nested {
            key: key.into(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// A primary table plus the ordered joins hanging off it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlan {
    primary: String,
    joins: Vec<Join>,
}

impl JoinPlan {
    pub fn new(primary: impl Into<String>, joins: Vec<Join>) -> Self {
        Self {
            primary: primary.into(),
            joins,
        }
    }

    /// Plan for a single table: nothing to join.
    pub fn single(table: impl Into<String>) -> Self {
        Self::new(table, Vec::new())
    }

    /// Rebuild a plan from its parallel table and key lists.
    ///
    /// The first table is the primary; every following table lines up with
    /// the key at the same position minus one, and nested entries must nest
    /// on both sides.
    pub fn from_lists(tables: Vec<JoinTarget>, keys: Vec<JoinKey>) -> JoinResult<Self> {
        let mut tables = tables.into_iter();
        let primary = match tables.next() {
            Some(JoinTarget::Table(name)) => name,
            Some(JoinTarget::Nested { link, .. }) => {
                return Err(JoinError::MalformedPlan(format!(
                    "primary table cannot be nested ({})",
                    link
                )))
            }
            None => return Err(JoinError::MalformedPlan("empty table list".into())),
        };

        let tables: Vec<JoinTarget> = tables.collect();
        if tables.len() != keys.len() {
            return Err(JoinError::MalformedPlan(format!(
                "{} joined tables but {} join keys",
                tables.len(),
                keys.len()
            )));
        }

        let joins = tables
            .into_iter()
            .zip(keys)
            .map(|pair| match pair {
                (JoinTarget::Table(table), JoinKey::Column(key)) => Ok(Join::Direct { table, key }),
                (JoinTarget::Nested { link, tables }, JoinKey::Nested { key, keys }) => {
                    if tables.first() != Some(&link) || tables.len() != keys.len() + 1 {
                        return Err(JoinError::MalformedPlan(format!(
                            "nested join under {} does not line up with its keys",
                            link
                        )));
                    }
                    Ok(Join::Nested {
                        link,
                        key,
                        tables: tables.into_iter().skip(1).zip(keys).collect(),
                    })
                }
                (target, key) => Err(JoinError::MalformedPlan(format!(
                    "table entry {:?} does not match key entry {:?}",
                    target, key
                ))),
            })
            .collect::<JoinResult<Vec<_>>>()?;

        Ok(Self { primary, joins })
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// True when the plan covers a single table.
    pub fn is_single(&self) -> bool {
        self.joins.is_empty()
    }

    /// Table list view: the primary first, nested entries as `{link: [link, ...]}`.
    pub fn tables(&self) -> Vec<JoinTarget> {
        let mut tables = vec![JoinTarget::Table(self.primary.clone())];
        tables.extend(self.joins.iter().map(|join| match join {
            Join::Direct { table, .. } => JoinTarget::Table(table.clone()),
            Join::Nested { link, tables, .. } => JoinTarget::Nested {
                link: link.clone(),
                tables: std::iter::once(link.clone())
                    .chain(tables.iter().map(|(t, _)| t.clone()))
                    .collect(),
            },
        }));
        tables
    }

    /// Join-key list view, parallel to `tables()` minus the primary.
    pub fn keys(&self) -> Vec<JoinKey> {
        self.joins
            .iter()
            .map(|join| match join {
                Join::Direct { key, .. } => JoinKey::Column(key.clone()),
                Join::Nested { key, tables, .. } => JoinKey::Nested {
                    key: key.clone(),
                    keys: tables.iter().map(|(_, k)| k.clone()).collect(),
                },
            })
            .collect()
    }

    /// Every table in the plan, primary first.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names = vec![self.primary.as_str()];
        for join in &self.joins {
            match join {
                Join::Direct { table, .. } => names.push(table),
                Join::Nested { link, tables, .. } => {
                    names.push(link);
                    names.extend(tables.iter().map(|(t, _)| t.as_str()));
                }
            }
        }
        names
    }
}
