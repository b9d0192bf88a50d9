//! In-memory co-occurrence graph.
//!
//! Nodes are unique by identifier and carry an immutable [`Role`].  Edges are
//! undirected and unweighted; adjacency lists keep the order in which edges
//! were first seen, which the recommender relies on for tie-breaking.
//!
//! A graph is only ever produced by [`GraphBuilder::build`] and has no
//! mutating methods, so an `Arc<CooccurrenceGraph>` can be read from any
//! number of request tasks without locking.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// What a node stands for in the reference population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A reported condition or habit token.
    Input,
    /// A recommendable category.
    Output,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Input => "input",
            Role::Output => "output",
        };
        write!(f, "{s}")
    }
}

/// Read-only bipartite co-occurrence graph.
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceGraph {
    roles: HashMap<String, Role>,
    adjacency: HashMap<String, Vec<String>>,
    edge_count: usize,
}

impl CooccurrenceGraph {
    /// `true` iff `id` is a node of this graph.
    pub fn has_node(&self, id: &str) -> bool {
        self.roles.contains_key(id)
    }

    /// Nodes adjacent to `id`, in first-seen edge order.
    ///
    /// Unknown identifiers yield [`GraphError::NotFound`]; check
    /// [`has_node`](Self::has_node) first when a miss is expected.
    pub fn neighbors(&self, id: &str) -> Result<&[String], GraphError> {
        self.adjacency
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))
    }

    /// Role of `id`, or `None` when the node does not exist.
    pub fn role_of(&self, id: &str) -> Option<Role> {
        self.roles.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.roles.len()
    }

    /// Number of distinct undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Identifiers carrying `role`, sorted for stable output.
    pub fn nodes_with_role(&self, role: Role) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .roles
            .iter()
            .filter(|(_, r)| **r == role)
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

// ── GraphBuilder ──────────────────────────────────────────────────────────────

/// Incremental constructor enforcing the graph invariants:
/// roles never change, every edge endpoint is a known node, and adjacency
/// stays symmetric with duplicate edges collapsed.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: CooccurrenceGraph,
    seen_edges: HashSet<(String, String)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a node.  Re-declaring with the same role is a no-op.
    pub fn add_node(&mut self, id: impl Into<String>, role: Role) -> Result<&mut Self, GraphError> {
        let id = id.into();
        match self.graph.roles.get(&id) {
            Some(existing) if *existing != role => return Err(GraphError::DuplicateNode { id }),
            Some(_) => {}
            None => {
                self.graph.adjacency.insert(id.clone(), Vec::new());
                self.graph.roles.insert(id, role);
            }
        }
        Ok(self)
    }

    /// Connect two declared nodes.  Repeated edges, in either orientation,
    /// are ignored.
    pub fn add_edge(&mut self, a: &str, b: &str) -> Result<&mut Self, GraphError> {
        if !self.graph.has_node(a) || !self.graph.has_node(b) {
            return Err(GraphError::DanglingEdge { from: a.to_string(), to: b.to_string() });
        }

        let key = if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        };
        if !self.seen_edges.insert(key) {
            return Ok(self);
        }

        if let Some(adj) = self.graph.adjacency.get_mut(a) {
            adj.push(b.to_string());
        }
        if a != b {
            if let Some(adj) = self.graph.adjacency.get_mut(b) {
                adj.push(a.to_string());
            }
        }
        self.graph.edge_count += 1;
        Ok(self)
    }

    pub fn build(self) -> CooccurrenceGraph {
        self.graph
    }
}
