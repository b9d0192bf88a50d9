//! Graph artifact loader.
//!
//! The reference graph ships as a JSON document:
//!
//! ```text
//! {
//!   "nodes": [ { "id": "Diabetes", "role": "input" },
//!              { "id": "LowSugarDiet", "role": "output" } ],
//!   "edges": [ ["Diabetes", "LowSugarDiet"] ]
//! }
//! ```
//!
//! Loading runs once at startup; any error here is fatal to the process.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::artifact;
use crate::error::GraphError;

use super::store::{CooccurrenceGraph, GraphBuilder, Role};

#[derive(Deserialize)]
struct GraphArtifact {
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    edges: Vec<(String, String)>,
}

#[derive(Deserialize)]
struct NodeRecord {
    id: String,
    role: Role,
}

/// A graph loaded from disk plus the fingerprint of the artifact it came from.
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub graph: CooccurrenceGraph,
    pub fingerprint: String,
}

/// Read and build the graph artifact at `path`.
pub fn load(path: &Path) -> Result<LoadedGraph, GraphError> {
    let source = artifact::read(path)
        .map_err(|e| GraphError::Artifact(format!("cannot read {}: {e}", path.display())))?;
    let graph = from_json(&source.text)?;

    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        fingerprint = %source.fingerprint,
        "co-occurrence graph loaded"
    );

    Ok(LoadedGraph { graph, fingerprint: source.fingerprint })
}

/// Build a graph from artifact text.
pub fn from_json(text: &str) -> Result<CooccurrenceGraph, GraphError> {
    let parsed: GraphArtifact = serde_json::from_str(text)
        .map_err(|e| GraphError::Artifact(format!("parse error: {e}")))?;

    let mut builder = GraphBuilder::new();
    for node in parsed.nodes {
        builder.add_node(node.id, node.role)?;
    }
    for (a, b) in &parsed.edges {
        builder.add_edge(a, b)?;
    }
    Ok(builder.build())
}
