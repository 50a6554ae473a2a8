//! Join path resolution over the relationship graph.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use super::{Join, JoinError, JoinPlan, JoinResult};
use crate::model::Schema;

/// Table indices in schema declaration order.
type TableSet = BTreeSet<usize>;

/// Resolves the join plan connecting a set of requested tables.
pub struct JoinResolver<'a> {
    schema: &'a Schema,
}

/// Resolve the join plan for `tables` against `schema`.
pub fn resolve_join<S: AsRef<str>>(schema: &Schema, tables: &[S]) -> JoinResult<JoinPlan> {
    JoinResolver::new(schema).resolve(tables)
}

impl<'a> JoinResolver<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Resolve a join plan. Input order and duplicates do not matter.
    ///
    /// A single table resolves to a plan with no joins.
    pub fn resolve<S: AsRef<str>>(&self, tables: &[S]) -> JoinResult<JoinPlan> {
        let mut requested = Vec::with_capacity(tables.len());
        for table in tables {
            let table = table.as_ref();
            let idx = self
                .schema
                .table_index(table)
                .ok_or_else(|| JoinError::UnknownTable(table.to_string()))?;
            requested.push(idx);
        }
        requested.sort_unstable();
        requested.dedup();

        match requested.len() {
            0 => Err(JoinError::NoTables),
            1 => Ok(JoinPlan::single(self.name(requested[0]))),
            _ => {
                let join_set = self.join_set(&requested)?;
                let plan = self.shape(&requested, &join_set)?;
                log::debug!(
                    "Resolved join for [{}] through [{}]",
                    self.names(&requested).join(", "),
                    plan.table_names().join(", ")
                );
                Ok(plan)
            }
        }
    }

    /// Smallest table set that is a union of one simple path per requested pair.
    ///
    /// Candidate unions that strictly contain another candidate are dominated
    /// and dropped as they are built. More than one minimal survivor is an
    /// ambiguity.
    fn join_set(&self, requested: &[usize]) -> JoinResult<TableSet> {
        let graph = self.schema.relationship_graph();
        let mut candidates: Vec<TableSet> = vec![requested.iter().copied().collect()];

        for (i, &from) in requested.iter().enumerate() {
            for &to in &requested[i + 1..] {
                let mut path_sets: Vec<TableSet> = Vec::new();
                for path in graph.simple_paths(self.name(from), self.name(to))? {
                    let set = self.index_set(&path)?;
                    if !path_sets.contains(&set) {
                        path_sets.push(set);
                    }
                }

                if path_sets.is_empty() {
                    return Err(JoinError::Impossible {
                        tables: self.names(requested),
                    });
                }

                let mut next: Vec<TableSet> = Vec::new();
                for candidate in &candidates {
                    for path in &path_sets {
                        let union: TableSet = candidate.union(path).copied().collect();
                        if !next.contains(&union) {
                            next.push(union);
                        }
                    }
                }
                candidates = drop_dominated(next);
            }
        }

        let min_len = candidates
            .iter()
            .map(BTreeSet::len)
            .min()
            .ok_or_else(|| JoinError::Impossible {
                tables: self.names(requested),
            })?;
        let mut minimal: Vec<TableSet> = candidates
            .into_iter()
            .filter(|c| c.len() == min_len)
            .collect();

        if minimal.len() > 1 {
            minimal.sort();
            return Err(JoinError::Ambiguous {
                tables: self.names(requested),
                candidates: minimal
                    .iter()
                    .map(|set| set.iter().map(|&t| self.name(t).to_string()).collect())
                    .collect(),
            });
        }

        Ok(minimal.remove(0))
    }

    /// Arrange the join set around a primary table.
    fn shape(&self, requested: &[usize], join_set: &TableSet) -> JoinResult<JoinPlan> {
        let graph = self.schema.relationship_graph();

        let joinable: BTreeMap<usize, TableSet> = join_set
            .iter()
            .map(|&t| {
                let linked = join_set
                    .iter()
                    .copied()
                    .filter(|&u| u != t && graph.joins_directly(self.name(t), self.name(u)))
                    .collect();
                (t, linked)
            })
            .collect();

        // The primary must reach every other table directly or through one link.
        let mut primaries: Vec<usize> = join_set
            .iter()
            .copied()
            .filter(|&p| {
                join_set.iter().all(|t| {
                    *t == p
                        || joinable[&p].contains(t)
                        || joinable[&p].iter().any(|l| joinable[l].contains(t))
                })
            })
            .collect();
        primaries.sort_by_key(|&p| (!requested.contains(&p), Reverse(joinable[&p].len()), p));

        let primary = *primaries.first().ok_or_else(|| JoinError::TooDeep {
            tables: self.names(requested),
        })?;

        let direct = &joinable[&primary];
        let mut nested: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

        for &secondary in join_set {
            if secondary == primary || direct.contains(&secondary) {
                continue;
            }

            let links: Vec<usize> = direct
                .iter()
                .copied()
                .filter(|l| joinable[l].contains(&secondary))
                .collect();

            // A link whose joinable set is strictly covered by another link's is redundant.
            let links: Vec<usize> = links
                .iter()
                .copied()
                .filter(|l| {
                    !links.iter().any(|o| {
                        o != l
                            && joinable[l].is_subset(&joinable[o])
                            && joinable[l] != joinable[o]
                    })
                })
                .collect();

            let link = links
                .iter()
                .copied()
                .find(|l| nested.contains_key(l))
                .or_else(|| links.first().copied())
                .ok_or_else(|| JoinError::TooDeep {
                    tables: self.names(requested),
                })?;
            nested.entry(link).or_default().push(secondary);
        }

        let primary_table = &self.schema.tables()[primary];
        let mut joins = Vec::with_capacity(direct.len());

        for &child in direct {
            let child_table = &self.schema.tables()[child];
            let key = self.key_between(primary, child)?;

            let join = match nested.get(&child) {
                Some(secondaries) => Join::Nested {
                    link: child_table.name().to_string(),
                    key,
                    tables: secondaries
                        .iter()
                        .map(|&s| {
                            self.key_between(child, s)
                                .map(|k| (self.name(s).to_string(), k))
                        })
                        .collect::<JoinResult<Vec<_>>>()?,
                },
                None => Join::Direct {
                    table: child_table.name().to_string(),
                    key,
                },
            };
            joins.push(join);
        }

        Ok(JoinPlan::new(primary_table.name(), joins))
    }

    fn key_between(&self, parent: usize, child: usize) -> JoinResult<String> {
        let tables = self.schema.tables();
        tables[parent]
            .join_key(&tables[child])
            .map(str::to_string)
            .ok_or_else(|| JoinError::Impossible {
                tables: vec![self.name(parent).to_string(), self.name(child).to_string()],
            })
    }

    fn index_set(&self, path: &[String]) -> JoinResult<TableSet> {
        path.iter()
            .map(|t| {
                self.schema
                    .table_index(t)
                    .ok_or_else(|| JoinError::UnknownTable(t.clone()))
            })
            .collect()
    }

    fn name(&self, idx: usize) -> &'a str {
        self.schema.tables()[idx].name()
    }

    fn names(&self, indices: &[usize]) -> Vec<String> {
        indices.iter().map(|&t| self.name(t).to_string()).collect()
    }
}

/// Keep only candidates that do not strictly contain another candidate.
fn drop_dominated(candidates: Vec<TableSet>) -> Vec<TableSet> {
    candidates
        .iter()
        .filter(|c| {
            !candidates
                .iter()
                .any(|other| other.len() < c.len() && other.is_subset(c))
        })
        .cloned()
        .collect()
}
