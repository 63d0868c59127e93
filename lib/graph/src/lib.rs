//! Directed graph model for the relay overlay: named nodes with a
//! geographic location, edges carrying `latency` (ms) and `cost`.
//!
//! Pairs a `petgraph` graph with a name→index side table, since every
//! caller here addresses nodes by string id rather than by `NodeIndex`.

use std::collections::{HashMap, HashSet};

use petgraph::{
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
    Directed,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub location: (f64, f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub latency: f64,
    pub cost: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown node: {0}")]
    UnknownNode(String),
}

type Inner = DiGraph<Node, Edge, u32>;

/// A directed graph of relay nodes, indexed by string id.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    graph: Inner,
    index_of: HashMap<String, NodeIndex>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::default(),
            index_of: HashMap::new(),
        }
    }

    /// Idempotent: returns the existing index if `id` is already present.
    pub fn add_node(&mut self, id: impl Into<String>, location: (f64, f64)) -> NodeIndex {
        let id = id.into();
        if let Some(&index) = self.index_of.get(&id) {
            return index;
        }
        let index = self.graph.add_node(Node { id: id.clone(), location });
        self.index_of.insert(id, index);
        index
    }

    pub fn add_edge(
        &mut self,
        u: &str,
        v: &str,
        latency: f64,
        cost: f64,
    ) -> Result<EdgeIndex, GraphError> {
        let u_index = self.index(u)?;
        let v_index = self.index(v)?;
        Ok(self.graph.update_edge(u_index, v_index, Edge { latency, cost }))
    }

    pub fn get_edge(&self, u: &str, v: &str) -> Option<Edge> {
        let u_index = *self.index_of.get(u)?;
        let v_index = *self.index_of.get(v)?;
        self.graph
            .find_edge(u_index, v_index)
            .map(|edge_index| self.graph[edge_index])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index_of.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &Edge)> {
        self.graph.edge_references().map(|edge_ref| {
            (
                self.graph[edge_ref.source()].id.as_str(),
                self.graph[edge_ref.target()].id.as_str(),
                edge_ref.weight(),
            )
        })
    }

    pub fn in_edges(&self, v: &str) -> Vec<(&str, &Edge)> {
        let Some(&v_index) = self.index_of.get(v) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(v_index, petgraph::Direction::Incoming)
            .map(|edge_ref| (self.graph[edge_ref.source()].id.as_str(), edge_ref.weight()))
            .collect()
    }

    pub fn out_edges(&self, u: &str) -> Vec<(&str, &Edge)> {
        let Some(&u_index) = self.index_of.get(u) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(u_index, petgraph::Direction::Outgoing)
            .map(|edge_ref| (self.graph[edge_ref.target()].id.as_str(), edge_ref.weight()))
            .collect()
    }

    pub fn neighbors_out(&self, u: &str) -> Vec<&str> {
        self.out_edges(u).into_iter().map(|(v, _)| v).collect()
    }

    /// Independent mutable copy.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Restricts the graph in place to the given node ids, as used by the
    /// `reduce_network` request option.
    pub fn remove_nodes_not_in(&mut self, keep: &HashSet<String>) {
        let to_remove: Vec<NodeIndex> = self
            .index_of
            .iter()
            .filter(|(id, _)| !keep.contains(*id))
            .map(|(_, &index)| index)
            .collect();

        // `remove_node` swaps in the last node, invalidating indices, so we
        // rebuild the side table once removals settle rather than patching
        // it incrementally.
        for index in to_remove {
            self.graph.remove_node(index);
        }
        self.index_of = self
            .graph
            .node_indices()
            .map(|index| (self.graph[index].id.clone(), index))
            .collect();
    }

    fn index(&self, id: &str) -> Result<NodeIndex, GraphError> {
        self.index_of
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index_of.get(id).copied()
    }

    pub fn node_id(&self, index: NodeIndex) -> &str {
        self.graph[index].id.as_str()
    }

    /// Exposes the underlying `petgraph` graph for algorithms (shortest
    /// path, MST, ...) that operate on `NodeIndex` directly.
    pub fn inner(&self) -> &DiGraph<Node, Edge, u32, Directed> {
        &self.graph
    }
}
