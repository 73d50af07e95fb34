//! Random topology generation with spacing constraints.
//!
//! Produces a connected graph in three passes:
//! 1. Node placement by bounded rejection sampling
//! 2. A random spanning tree (guarantees connectivity with n-1 edges)
//! 3. A few extra edges to create alternate routes
//!
//! The generator draws only from the RNG it is handed, so a seeded
//! `ChaCha8Rng` reproduces the same topology every time.

use crate::graph::{Edge, Graph, Node, Position};
use netroute_env::NodeId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::{debug, trace};

/// Size of the drawable canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasBounds {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasBounds {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
        }
    }
}

/// Configuration for topology generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Requested node count, capped at the label alphabet size (default: 7)
    pub node_count: usize,

    /// One character per node, used as both id and label
    pub labels: String,

    /// Canvas the nodes are placed on
    pub bounds: CanvasBounds,

    /// Distance kept clear along each canvas border
    pub margin: f64,

    /// Minimum pairwise node distance (default: 100)
    pub min_separation: f64,

    /// Placement draws per node before the last draw is accepted as is
    pub max_placement_attempts: u32,

    /// How many extra edges to attempt beyond the spanning tree
    pub extra_edges: RangeInclusive<usize>,

    /// Edge cost range
    pub cost_range: RangeInclusive<u32>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            node_count: 7,
            labels: "ABCDEFGHIJ".to_string(),
            bounds: CanvasBounds::default(),
            margin: 50.0,
            min_separation: 100.0,
            max_placement_attempts: 100,
            extra_edges: 2..=4,
            cost_range: 5..=19,
        }
    }
}

impl TopologyConfig {
    /// Sets the requested node count.
    pub fn with_node_count(mut self, node_count: usize) -> Self {
        self.node_count = node_count;
        self
    }

    /// Sets the minimum node separation.
    pub fn with_min_separation(mut self, min_separation: f64) -> Self {
        self.min_separation = min_separation;
        self
    }

    /// Sets the canvas size.
    pub fn with_bounds(mut self, width: f64, height: f64) -> Self {
        self.bounds = CanvasBounds { width, height };
        self
    }

    /// Node count after capping at the alphabet size.
    pub fn effective_node_count(&self) -> usize {
        self.node_count.min(self.labels.chars().count())
    }
}

/// Generates random connected topologies.
#[derive(Debug, Clone, Default)]
pub struct TopologyGenerator {
    config: TopologyConfig,
}

impl TopologyGenerator {
    pub fn new(config: TopologyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Generates a connected graph. Never fails.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Graph {
        let nodes = self.place_nodes(rng);
        let mut edges = self.spanning_tree(&nodes, rng);
        self.add_extra_edges(&nodes, &mut edges, rng);

        debug!(
            "Generated topology: {} nodes, {} edges",
            nodes.len(),
            edges.len()
        );

        Graph { nodes, edges }
    }

    /// Rejection-samples one position per label.
    fn place_nodes<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Node> {
        let count = self.config.effective_node_count();
        let mut nodes: Vec<Node> = Vec::with_capacity(count);

        for label in self.config.labels.chars().take(count) {
            let mut position = self.random_position(rng);
            let mut attempts = 1;

            while !self.is_clear(&position, &nodes) {
                if attempts >= self.config.max_placement_attempts {
                    debug!(
                        "Placement of {} exhausted {} attempts, accepting crowded position",
                        label, attempts
                    );
                    break;
                }
                position = self.random_position(rng);
                attempts += 1;
            }

            nodes.push(Node {
                id: NodeId::from(label),
                label: label.to_string(),
                position,
            });
        }

        nodes
    }

    fn is_clear(&self, position: &Position, placed: &[Node]) -> bool {
        placed
            .iter()
            .all(|n| nalgebra::distance(position, &n.position) >= self.config.min_separation)
    }

    fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        let x = sample_axis(rng, self.config.bounds.width, self.config.margin);
        let y = sample_axis(rng, self.config.bounds.height, self.config.margin);
        Position::new(x, y)
    }

    /// Connects node i to a uniformly chosen earlier node, for i in 1..n.
    fn spanning_tree<R: Rng + ?Sized>(&self, nodes: &[Node], rng: &mut R) -> Vec<Edge> {
        (1..nodes.len())
            .map(|i| {
                let parent = rng.gen_range(0..i);
                Edge {
                    from: nodes[parent].id.clone(),
                    to: nodes[i].id.clone(),
                    cost: rng.gen_range(self.config.cost_range.clone()),
                }
            })
            .collect()
    }

    /// Attempts a random number of extra edges. Collisions are skipped,
    /// not retried, so fewer edges than drawn may be added.
    fn add_extra_edges<R: Rng + ?Sized>(&self, nodes: &[Node], edges: &mut Vec<Edge>, rng: &mut R) {
        if nodes.len() < 2 {
            return;
        }

        let wanted = rng.gen_range(self.config.extra_edges.clone());
        for _ in 0..wanted {
            let a = &nodes[rng.gen_range(0..nodes.len())].id;
            let b = &nodes[rng.gen_range(0..nodes.len())].id;

            if a == b || edges.iter().any(|e| e.connects(a, b)) {
                trace!("Skipping extra edge {}-{}", a, b);
                continue;
            }

            edges.push(Edge {
                from: a.clone(),
                to: b.clone(),
                cost: rng.gen_range(self.config.cost_range.clone()),
            });
        }
    }
}

/// Uniform coordinate in `[margin, extent - margin)`, collapsing to the
/// centre line when the canvas is narrower than both margins.
fn sample_axis<R: Rng + ?Sized>(rng: &mut R, extent: f64, margin: f64) -> f64 {
    let lo = margin.min(extent / 2.0);
    let hi = extent - lo;
    if lo < hi {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}
