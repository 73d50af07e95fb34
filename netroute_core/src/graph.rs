//! The Graph Model - nodes, undirected weighted edges and lookups.
//!
//! A `Graph` is an immutable value: the engine never edits one in place,
//! it only replaces it wholesale on regeneration. Lookups are linear scans,
//! which is the right trade-off for graphs of about ten nodes.

use nalgebra::Point2;
use netroute_env::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// 2D display position of a node.
pub type Position = Point2<f64>;

/// Display role of a node for the current selection.
///
/// Derived from the session selection, never stored on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Router,
    Source,
    Destination,
}

/// A graph vertex: a router with a position on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identity, unique within a graph
    pub id: NodeId,

    /// Display label
    pub label: String,

    /// Canvas position
    pub position: Position,
}

impl Node {
    /// Creates a node labelled with its own id.
    pub fn new(id: impl Into<NodeId>, x: f64, y: f64) -> Self {
        let id = id.into();
        Self {
            label: id.to_string(),
            id,
            position: Position::new(x, y),
        }
    }

    /// Euclidean distance to another node.
    pub fn distance_to(&self, other: &Node) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }
}

/// An undirected weighted link. `from`/`to` record declaration order only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,

    /// Link cost, analogous to delay
    pub cost: u32,
}

impl Edge {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>, cost: u32) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            cost,
        }
    }

    /// True if this edge joins `a` and `b`, in either direction.
    pub fn connects(&self, a: &NodeId, b: &NodeId) -> bool {
        (self.from == *a && self.to == *b) || (self.from == *b && self.to == *a)
    }

    /// Returns the endpoint opposite `id`, or None if `id` is not an endpoint.
    pub fn opposite(&self, id: &NodeId) -> Option<&NodeId> {
        if self.from == *id {
            Some(&self.to)
        } else if self.to == *id {
            Some(&self.from)
        } else {
            None
        }
    }
}

/// Topology validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("Self-loop on node {0}")]
    SelfLoop(NodeId),

    #[error("Edge {from}-{to} references unknown node {missing}")]
    UnknownNode {
        from: NodeId,
        to: NodeId,
        missing: NodeId,
    },
}

/// Ordered nodes plus ordered edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
}

impl Graph {
    /// Builds a graph after checking id uniqueness, self-loops and edge
    /// endpoints. Parallel edges are allowed.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let mut seen = HashSet::new();
        for node in &nodes {
            if !seen.insert(&node.id) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        for edge in &edges {
            if edge.from == edge.to {
                return Err(GraphError::SelfLoop(edge.from.clone()));
            }
            for end in [&edge.from, &edge.to] {
                if !seen.contains(end) {
                    return Err(GraphError::UnknownNode {
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        missing: end.clone(),
                    });
                }
            }
        }

        Ok(Self { nodes, edges })
    }

    /// The built-in six router network used before any regeneration.
    ///
    /// ```text
    ///        B ---10--- D
    ///      7 |  \10     | \15
    ///        A   \    6 |   F
    ///      9 |    \     | /7
    ///        C ---2---- E
    /// ```
    pub fn default_topology() -> Self {
        let nodes = vec![
            Node::new("A", 100.0, 250.0),
            Node::new("B", 250.0, 100.0),
            Node::new("C", 250.0, 400.0),
            Node::new("D", 500.0, 100.0),
            Node::new("E", 500.0, 400.0),
            Node::new("F", 700.0, 250.0),
        ];
        let edges = vec![
            Edge::new("A", "B", 7),
            Edge::new("A", "C", 9),
            Edge::new("B", "D", 10),
            Edge::new("B", "C", 10),
            Edge::new("C", "E", 2),
            Edge::new("D", "F", 15),
            Edge::new("D", "E", 6),
            Edge::new("E", "F", 7),
        ];
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == *id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    /// First edge joining `a` and `b` in either declared direction.
    pub fn edge_between(&self, a: &NodeId, b: &NodeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.connects(a, b))
    }

    /// Neighbors of `id` with the connecting edge, scanning both directions.
    ///
    /// `id` is only borrowed for the call; the result borrows the graph.
    pub fn neighbors<'a>(&'a self, id: &NodeId) -> Vec<(&'a NodeId, &'a Edge)> {
        self.edges
            .iter()
            .filter_map(|e| e.opposite(id).map(|other| (other, e)))
            .collect()
    }

    /// Breadth-first reachability check from the first node.
    ///
    /// An empty graph counts as connected.
    pub fn is_connected(&self) -> bool {
        let Some(start) = self.nodes.first() else {
            return true;
        };

        let mut visited: HashSet<&NodeId> = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(&start.id);
        queue.push_back(&start.id);

        while let Some(current) = queue.pop_front() {
            for (next, _) in self.neighbors(current) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        visited.len() == self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn test_default_topology_shape() {
        let graph = Graph::default_topology();
        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.edge_count(), 8);
        assert!(graph.is_connected());
    }

    #[test]
    fn test_edge_lookup_is_direction_agnostic() {
        let graph = Graph::default_topology();

        let forward = graph.edge_between(&id("C"), &id("E")).unwrap();
        let backward = graph.edge_between(&id("E"), &id("C")).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward.cost, 2);
        assert!(graph.edge_between(&id("A"), &id("F")).is_none());
    }

    #[test]
    fn test_edge_lookup_returns_first_parallel_edge() {
        let graph = Graph::new(
            vec![Node::new("A", 0.0, 0.0), Node::new("B", 10.0, 0.0)],
            vec![Edge::new("B", "A", 4), Edge::new("A", "B", 1)],
        )
        .unwrap();

        assert_eq!(graph.edge_between(&id("A"), &id("B")).unwrap().cost, 4);
    }

    #[test]
    fn test_node_lookup() {
        let graph = Graph::default_topology();
        assert_eq!(graph.node(&id("D")).unwrap().label, "D");
        assert!(graph.node(&id("Z")).is_none());
    }

    #[test]
    fn test_neighbors_scan_both_directions() {
        let graph = Graph::default_topology();
        let mut around_e: Vec<&str> = graph
            .neighbors(&id("E"))
            .into_iter()
            .map(|(n, _)| n.as_str())
            .collect();
        around_e.sort();

        assert_eq!(around_e, vec!["C", "D", "F"]);
    }

    #[test]
    fn test_neighbors_outlive_lookup_id() {
        let graph = Graph::default_topology();
        let around_a = {
            let lookup = id("A");
            graph.neighbors(&lookup)
        };

        let mut labels: Vec<&str> = around_a.iter().map(|(n, _)| n.as_str()).collect();
        labels.sort();
        assert_eq!(labels, vec!["B", "C"]);
    }

    #[test]
    fn test_validation_rejects_duplicates() {
        let result = Graph::new(
            vec![Node::new("A", 0.0, 0.0), Node::new("A", 1.0, 1.0)],
            vec![],
        );
        assert_eq!(result, Err(GraphError::DuplicateNode(id("A"))));
    }

    #[test]
    fn test_validation_rejects_self_loop() {
        let result = Graph::new(vec![Node::new("A", 0.0, 0.0)], vec![Edge::new("A", "A", 5)]);
        assert_eq!(result, Err(GraphError::SelfLoop(id("A"))));
    }

    #[test]
    fn test_validation_rejects_dangling_edge() {
        let result = Graph::new(vec![Node::new("A", 0.0, 0.0)], vec![Edge::new("A", "Q", 5)]);
        assert!(matches!(result, Err(GraphError::UnknownNode { missing, .. }) if missing == id("Q")));
    }

    #[test]
    fn test_disconnected_graph_detected() {
        let graph = Graph::new(
            vec![
                Node::new("A", 0.0, 0.0),
                Node::new("B", 100.0, 0.0),
                Node::new("C", 200.0, 0.0),
            ],
            vec![Edge::new("A", "B", 5)],
        )
        .unwrap();

        assert!(!graph.is_connected());
    }

    #[test]
    fn test_node_distance() {
        let a = Node::new("A", 0.0, 0.0);
        let b = Node::new("B", 3.0, 4.0);
        approx::assert_relative_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn test_graph_serializes() {
        let json = serde_json::to_value(Graph::default_topology()).unwrap();
        assert_eq!(json["nodes"][0]["id"], "A");
        assert_eq!(json["edges"][4]["cost"], 2);
    }
}
