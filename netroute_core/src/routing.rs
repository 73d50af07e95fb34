//! Shortest-path routing over the Graph Model.
//!
//! Single-source Dijkstra with a linear scan for the next node. Graphs are
//! small enough that a priority queue buys nothing.

use crate::graph::{Edge, Graph, Node};
use netroute_env::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

/// One directed traversal of an edge within a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub from: Node,
    pub to: Node,
    pub edge: Edge,
}

impl PathSegment {
    pub fn cost(&self) -> u32 {
        self.edge.cost
    }
}

/// Computes the minimum-cost route from `source` to `destination`.
///
/// Returns an empty vector when either id is absent, the destination is
/// unreachable, or `source == destination`. Consecutive segments share an
/// endpoint: `path[i].to == path[i + 1].from`.
pub fn shortest_path(graph: &Graph, source: &NodeId, destination: &NodeId) -> Vec<PathSegment> {
    if !graph.contains(source) || !graph.contains(destination) {
        debug!("Route {} -> {} requested for unknown node", source, destination);
        return Vec::new();
    }

    let mut distance: HashMap<&NodeId, u64> = graph
        .nodes()
        .iter()
        .map(|n| (&n.id, u64::MAX))
        .collect();
    distance.insert(source, 0);

    // node -> (previous node, edge used to reach it)
    let mut previous: HashMap<&NodeId, (&NodeId, &Edge)> = HashMap::new();
    let mut unvisited: Vec<&NodeId> = graph.nodes().iter().map(|n| &n.id).collect();

    loop {
        let Some((slot, current)) = unvisited
            .iter()
            .enumerate()
            .min_by_key(|(_, id)| distance[*id])
            .map(|(slot, id)| (slot, *id))
        else {
            break;
        };

        let current_distance = distance[current];
        if current_distance == u64::MAX {
            // Everything left is unreachable
            break;
        }
        if current == destination {
            break;
        }
        unvisited.swap_remove(slot);

        for (neighbor, edge) in graph.neighbors(current) {
            let candidate = current_distance + u64::from(edge.cost);
            let entry = distance.entry(neighbor).or_insert(u64::MAX);
            if candidate < *entry {
                trace!("Relax {} via {}: {} -> {}", neighbor, current, *entry, candidate);
                *entry = candidate;
                previous.insert(neighbor, (current, edge));
            }
        }
    }

    let path = reconstruct(graph, &previous, source, destination);
    debug!(
        "Route {} -> {}: {} hops, cost {}",
        source,
        destination,
        path.len(),
        path_cost(&path)
    );
    path
}

fn reconstruct(
    graph: &Graph,
    previous: &HashMap<&NodeId, (&NodeId, &Edge)>,
    source: &NodeId,
    destination: &NodeId,
) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut current = destination;

    while current != source {
        let Some(&(prev, edge)) = previous.get(current) else {
            // Chain broke before reaching the source: unreachable
            return Vec::new();
        };
        let (Some(from), Some(to)) = (graph.node(prev), graph.node(current)) else {
            return Vec::new();
        };
        segments.push(PathSegment {
            from: from.clone(),
            to: to.clone(),
            edge: edge.clone(),
        });
        current = prev;
    }

    segments.reverse();
    segments
}

/// Sum of edge costs along a route, widened so long routes of large costs
/// cannot overflow.
pub fn path_cost(path: &[PathSegment]) -> u64 {
    path.iter().map(|s| u64::from(s.cost())).sum()
}

/// Node ids visited by a route, source first.
pub fn path_node_ids(path: &[PathSegment]) -> Vec<NodeId> {
    let mut ids: Vec<NodeId> = path.iter().map(|s| s.from.id.clone()).collect();
    if let Some(last) = path.last() {
        ids.push(last.to.id.clone());
    }
    ids
}

/// Renders a route as "A → C → E → F".
pub fn describe_route(path: &[PathSegment]) -> String {
    path_node_ids(path)
        .iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(" → ")
}
