//! Relationship graph over table names.
//!
//! Nodes are tables; an undirected edge links two tables when either table's
//! join-by key is a column of the other. Tables without a join-by key that no
//! other table can reach stay isolated.

use std::collections::HashMap;

use petgraph::algo::all_simple_paths;
use petgraph::graph::{NodeIndex, UnGraph};

use crate::model::{SchemaError, SchemaResult, Table};

/// Undirected join graph derived from the schema. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    graph: UnGraph<String, ()>,
    node_indices: HashMap<String, NodeIndex>,
}

impl RelationshipGraph {
    /// Build the graph from tables in declaration order.
    ///
    /// Every unordered pair of tables is checked once.
    pub fn build(tables: &[Table]) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut node_indices = HashMap::new();

        for table in tables {
            let idx = graph.add_node(table.name().to_string());
            node_indices.insert(table.name().to_string(), idx);
        }

        for (i, left) in tables.iter().enumerate() {
            for right in &tables[i + 1..] {
                if left.can_join(right) {
                    graph.add_edge(node_indices[left.name()], node_indices[right.name()], ());
                }
            }
        }

        Self {
            graph,
            node_indices,
        }
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn relationship_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.node_indices.contains_key(table)
    }

    /// Can these two tables be joined without an intermediate table?
    pub fn joins_directly(&self, a: &str, b: &str) -> bool {
        match (self.node_indices.get(a), self.node_indices.get(b)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Tables directly joinable to `table`, in declaration order.
    pub fn neighbors(&self, table: &str) -> SchemaResult<Vec<&str>> {
        let idx = self.index(table)?;
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        neighbors.sort();
        neighbors.dedup();
        Ok(neighbors
            .into_iter()
            .map(|n| self.graph[n].as_str())
            .collect())
    }

    /// Every simple path (no repeated table) between two tables.
    ///
    /// Paths are ordered by length, then by the declaration order of the tables
    /// they visit. No cap is applied on the number of paths.
    pub fn simple_paths(&self, from: &str, to: &str) -> SchemaResult<Vec<Vec<String>>> {
        let from_idx = self.index(from)?;
        let to_idx = self.index(to)?;

        if from_idx == to_idx {
            return Ok(vec![vec![from.to_string()]]);
        }

        let mut paths: Vec<Vec<NodeIndex>> =
            all_simple_paths::<Vec<NodeIndex>, _>(&self.graph, from_idx, to_idx, 0, None)
                .collect();
        paths.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        Ok(paths
            .into_iter()
            .map(|path| path.into_iter().map(|n| self.graph[n].clone()).collect())
            .collect())
    }

    fn index(&self, table: &str) -> SchemaResult<NodeIndex> {
        self.node_indices
            .get(table)
            .copied()
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))
    }
}
