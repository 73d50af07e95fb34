//! NetRoute Core - Shortest-Path Packet Routing Engine
//!
//! The engine behind an educational routing visualization:
//! 1. **Topology**: random connected graphs with spacing constraints
//! 2. **Routing**: Dijkstra over undirected weighted edges
//! 3. **Animation**: time-driven interpolation of a packet along a route
//!
//! Rendering is left to the caller, which consumes graphs, paths and
//! animation frames and forwards user intents through `RouteSession`.

pub mod graph;
pub mod topology;
pub mod routing;
pub mod animation;
pub mod session;
pub mod route_runtime;

// Re-export key types for convenience
pub use graph::{Edge, Graph, GraphError, Node, NodeRole, Position};
pub use topology::{CanvasBounds, TopologyConfig, TopologyGenerator};
pub use routing::{describe_route, path_cost, path_node_ids, shortest_path, PathSegment};
pub use animation::{
    locate, AnimationConfig, AnimationError, AnimationFrame, AnimationPhase, PacketAnimator,
    TickOutcome,
};
pub use session::{RouteError, RouteSession, SimulationState};
pub use route_runtime::RouteRuntime;
