//! Flat graph model published to rendering surfaces.
//!
//! # Responsibility
//! - Hold discovered nodes (discovery order) and parent→child edges.
//! - Provide the in-place patch primitives used by incremental updates.
//!
//! # Invariants
//! - Node ids are unique within one graph.
//! - After [`Graph::prune_dangling_edges`] every edge endpoint is a node id.
//! - Edges are not deduplicated; parallel edges are legal.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// One rendered node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub path: String,
    pub label: String,
}

/// Directed parent→child edge between node ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

/// Result of [`Graph::upsert_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
    Unchanged,
}

/// Graph payload owned by exactly one view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Ids of nodes whose path points at `path`.
    pub fn node_ids_with_path(&self, path: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| same_path(node.path.as_str(), path))
            .map(|node| node.id.clone())
            .collect()
    }

    /// Inserts a node or refreshes path/label of the node with the same id.
    pub fn upsert_node(&mut self, node: GraphNode) -> Upsert {
        match self.nodes.iter_mut().find(|existing| existing.id == node.id) {
            Some(existing) if *existing == node => Upsert::Unchanged,
            Some(existing) => {
                existing.path = node.path;
                existing.label = node.label;
                Upsert::Updated
            }
            None => {
                self.nodes.push(node);
                Upsert::Inserted
            }
        }
    }

    /// Removes one node and every edge incident to it.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|edge| !edge.touches(id));
        true
    }

    /// Removes every node stored under `path` plus incident edges.
    ///
    /// Returns removed node ids in discovery order.
    pub fn remove_nodes_with_path(&mut self, path: &str) -> Vec<String> {
        let removed = self.node_ids_with_path(path);
        for id in &removed {
            self.remove_node(id);
        }
        removed
    }

    /// Re-points nodes stored under `from` to `to`. Ids and edges stay put.
    pub fn rename_path(&mut self, from: &str, to: &str) -> usize {
        let mut renamed = 0;
        for node in &mut self.nodes {
            if same_path(node.path.as_str(), from) {
                node.path = to.to_string();
                renamed += 1;
            }
        }
        renamed
    }

    /// Drops outgoing edges of every id in `sources`.
    pub fn remove_edges_from(&mut self, sources: &HashSet<String>) -> usize {
        let before = self.edges.len();
        self.edges
            .retain(|edge| !sources.contains(edge.source.as_str()));
        before - self.edges.len()
    }

    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.source == source && edge.target == target)
    }

    /// Drops edges whose source or target is not a node id.
    ///
    /// Returns the number of removed edges.
    pub fn prune_dangling_edges(&mut self) -> usize {
        let ids: HashSet<&str> = self.nodes.iter().map(|node| node.id.as_str()).collect();
        let before = self.edges.len();
        self.edges.retain(|edge| {
            ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str())
        });
        before - self.edges.len()
    }

    /// Edges referencing an id absent from the node set.
    pub fn dangling_edges(&self) -> Vec<&GraphEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|node| node.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|edge| {
                !ids.contains(edge.source.as_str()) || !ids.contains(edge.target.as_str())
            })
            .collect()
    }

    /// Order-insensitive node view, used to compare rebuilds.
    pub fn node_set(&self) -> BTreeSet<GraphNode> {
        self.nodes.iter().cloned().collect()
    }

    /// Order-insensitive edge view, used to compare rebuilds.
    pub fn edge_set(&self) -> BTreeSet<GraphEdge> {
        self.edges.iter().cloned().collect()
    }
}

/// Compares two filesystem paths component-wise (`a//b` equals `a/b`).
pub fn same_path(left: &str, right: &str) -> bool {
    left == right || Path::new(left) == Path::new(right)
}

#[cfg(test)]
mod tests {
    use super::{same_path, Graph, GraphEdge, GraphNode, Upsert};
    use std::collections::HashSet;

    fn node(id: &str, path: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            path: path.to_string(),
            label: id.to_uppercase(),
        }
    }

    fn sample() -> Graph {
        Graph {
            nodes: vec![node("a", "/w/a.md"), node("b", "/w/b.md"), node("c", "/w/c.md")],
            edges: vec![
                GraphEdge::new("a", "b"),
                GraphEdge::new("a", "c"),
                GraphEdge::new("b", "c"),
                GraphEdge::new("b", "ghost"),
            ],
        }
    }

    #[test]
    fn prune_drops_edges_to_missing_nodes() {
        let mut graph = sample();
        assert_eq!(graph.dangling_edges().len(), 1);
        assert_eq!(graph.prune_dangling_edges(), 1);
        assert!(graph.dangling_edges().is_empty());
        assert_eq!(graph.edges.len(), 3);
    }

    #[test]
    fn remove_node_drops_incident_edges_only() {
        let mut graph = sample();
        assert!(graph.remove_node("b"));
        assert!(!graph.remove_node("b"));
        assert_eq!(graph.edges, vec![GraphEdge::new("a", "c")]);
    }

    #[test]
    fn rename_path_keeps_ids_and_edges() {
        let mut graph = sample();
        let edges = graph.edges.clone();
        assert_eq!(graph.rename_path("/w//b.md", "/w/renamed.md"), 1);
        assert_eq!(graph.node("b").map(|n| n.path.as_str()), Some("/w/renamed.md"));
        assert_eq!(graph.edges, edges);
    }

    #[test]
    fn upsert_reports_insert_update_and_noop() {
        let mut graph = Graph::new();
        assert_eq!(graph.upsert_node(node("a", "/w/a.md")), Upsert::Inserted);
        assert_eq!(graph.upsert_node(node("a", "/w/a.md")), Upsert::Unchanged);
        let mut relabeled = node("a", "/w/a.md");
        relabeled.label = "Alpha".to_string();
        assert_eq!(graph.upsert_node(relabeled), Upsert::Updated);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].label, "Alpha");
    }

    #[test]
    fn remove_edges_from_keeps_inbound_edges() {
        let mut graph = sample();
        let sources: HashSet<String> = ["b".to_string()].into_iter().collect();
        assert_eq!(graph.remove_edges_from(&sources), 2);
        assert!(graph.contains_edge("a", "b"));
    }

    #[test]
    fn same_path_normalizes_separators() {
        assert!(same_path("/w/notes/a.md", "/w//notes/a.md"));
        assert!(!same_path("/w/a.md", "/w/b.md"));
    }

    #[test]
    fn serializes_wire_shape() {
        let graph = Graph {
            nodes: vec![node("a", "/w/a.md")],
            edges: vec![GraphEdge::new("a", "a")],
        };
        let value = serde_json::to_value(&graph).expect("graph should serialize");
        assert_eq!(value["nodes"][0]["label"], "A");
        assert_eq!(value["edges"][0]["source"], "a");
    }
}
