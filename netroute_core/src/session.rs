//! Session state and the intents a presentation layer forwards to the engine.
//!
//! `RouteSession` is the single owner of all mutable state: the current
//! graph, the selection, the computed path and the animator. Everything it
//! delegates to (generator, solver, `locate`) is a pure function of its
//! inputs.

use crate::animation::{AnimationConfig, AnimationError, PacketAnimator, TickOutcome};
use crate::graph::{Graph, NodeRole};
use crate::routing::{describe_route, path_cost, shortest_path, PathSegment};
use crate::topology::{TopologyConfig, TopologyGenerator};
use netroute_env::{FrameHandle, FrameScheduler, NodeId};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Status shown before anything has been sent.
pub const IDLE_STATUS: &str = "Select source and destination";

/// Failures of a send request. None of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Select both a source and a destination")]
    MissingSelection,

    #[error("Source and destination must differ (both are {0})")]
    InvalidSelection(NodeId),

    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("No path from {from} to {to}")]
    NoPathFound { from: NodeId, to: NodeId },

    #[error(transparent)]
    Animation(#[from] AnimationError),
}

/// Transient per-session state, reset on every regeneration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub source: Option<NodeId>,
    pub destination: Option<NodeId>,

    /// Route of the latest successful send
    pub path: Vec<PathSegment>,

    pub animating: bool,
    pub delivered: bool,

    /// Human-readable status line
    pub status: String,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            path: Vec::new(),
            animating: false,
            delivered: false,
            status: IDLE_STATUS.to_string(),
        }
    }
}

impl SimulationState {
    /// Display role of a node under the current selection.
    pub fn role_of(&self, id: &NodeId) -> NodeRole {
        if self.source.as_ref() == Some(id) {
            NodeRole::Source
        } else if self.destination.as_ref() == Some(id) {
            NodeRole::Destination
        } else {
            NodeRole::Router
        }
    }

    /// True if the edge between `a` and `b` lies on the current path.
    pub fn path_uses(&self, a: &NodeId, b: &NodeId) -> bool {
        self.path.iter().any(|s| s.edge.connects(a, b))
    }

    pub fn path_cost(&self) -> u64 {
        path_cost(&self.path)
    }
}

/// The engine as seen from a presentation layer.
#[derive(Debug)]
pub struct RouteSession {
    graph: Graph,
    state: SimulationState,
    animator: PacketAnimator,
    generator: TopologyGenerator,
}

impl RouteSession {
    /// Creates a session showing the built-in default topology.
    pub fn new(topology: TopologyConfig, animation: AnimationConfig) -> Self {
        Self::with_graph(Graph::default_topology(), topology, animation)
    }

    /// Creates a session over an explicit graph.
    pub fn with_graph(graph: Graph, topology: TopologyConfig, animation: AnimationConfig) -> Self {
        Self {
            graph,
            state: SimulationState::default(),
            animator: PacketAnimator::new(animation),
            generator: TopologyGenerator::new(topology),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn animator(&self) -> &PacketAnimator {
        &self.animator
    }

    pub fn topology_config(&self) -> &TopologyConfig {
        self.generator.config()
    }

    pub fn role_of(&self, id: &NodeId) -> NodeRole {
        self.state.role_of(id)
    }

    /// Sets or clears the source node.
    pub fn select_source(&mut self, id: Option<NodeId>) -> Result<(), RouteError> {
        let id = self.checked(id)?;
        self.state.source = id;
        Ok(())
    }

    /// Sets or clears the destination node.
    pub fn select_destination(&mut self, id: Option<NodeId>) -> Result<(), RouteError> {
        let id = self.checked(id)?;
        self.state.destination = id;
        Ok(())
    }

    fn checked(&self, id: Option<NodeId>) -> Result<Option<NodeId>, RouteError> {
        match id {
            Some(id) if !self.graph.contains(&id) => Err(RouteError::UnknownNode(id)),
            other => Ok(other),
        }
    }

    /// Routes a packet from the selected source to the selected destination
    /// and starts animating it. Returns the path cost.
    ///
    /// A send while a packet is still moving supersedes it.
    pub fn send_packet<S: FrameScheduler + ?Sized>(
        &mut self,
        now: Duration,
        scheduler: &mut S,
    ) -> Result<u64, RouteError> {
        let result = self.try_send(now, scheduler);
        if let Err(err) = &result {
            self.state.status = err.to_string();
        }
        result
    }

    fn try_send<S: FrameScheduler + ?Sized>(
        &mut self,
        now: Duration,
        scheduler: &mut S,
    ) -> Result<u64, RouteError> {
        let (Some(from), Some(to)) = (self.state.source.clone(), self.state.destination.clone()) else {
            return Err(RouteError::MissingSelection);
        };
        if from == to {
            return Err(RouteError::InvalidSelection(from));
        }

        let path = shortest_path(&self.graph, &from, &to);
        if path.is_empty() {
            self.animator.cancel(scheduler);
            self.state.path.clear();
            self.state.animating = false;
            self.state.delivered = false;
            return Err(RouteError::NoPathFound { from, to });
        }

        let cost = path_cost(&path);
        self.animator.begin(path.clone(), now, scheduler)?;

        info!("Sending packet {} -> {} (cost {})", from, to, cost);
        self.state.status = format!("Sending packet {} → {} (cost {})", from, to, cost);
        self.state.path = path;
        self.state.animating = true;
        self.state.delivered = false;
        Ok(cost)
    }

    /// Delivers one frame callback to the animator.
    pub fn tick<S: FrameScheduler + ?Sized>(
        &mut self,
        handle: FrameHandle,
        now: Duration,
        scheduler: &mut S,
    ) -> TickOutcome {
        let outcome = self.animator.tick(handle, now, scheduler);
        if let TickOutcome::Completed(_) = outcome {
            self.state.animating = false;
            self.state.delivered = true;
            self.state.status = match (&self.state.source, &self.state.destination) {
                (Some(from), Some(to)) => format!(
                    "Packet delivered {} → {} via {} (cost {})",
                    from,
                    to,
                    describe_route(&self.state.path),
                    self.state.path_cost()
                ),
                _ => "Packet delivered".to_string(),
            };
            info!("{}", self.state.status);
        }
        outcome
    }

    /// Stops the packet in flight, if any.
    pub fn cancel<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        let cancelled = self.animator.cancel(scheduler);
        if cancelled {
            self.state.animating = false;
            self.state.status = "Transmission cancelled".to_string();
        }
        cancelled
    }

    /// Replaces the graph with a freshly generated one and resets all
    /// session state.
    pub fn regenerate<R, S>(&mut self, rng: &mut R, node_count: Option<usize>, scheduler: &mut S) -> &Graph
    where
        R: Rng + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        if let Some(count) = node_count {
            let config = self.generator.config().clone().with_node_count(count);
            self.generator = TopologyGenerator::new(config);
        }

        self.animator.cancel(scheduler);
        self.graph = self.generator.generate(rng);
        self.state = SimulationState::default();

        debug!(
            "Regenerated network: {} nodes, {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        &self.graph
    }
}

impl Default for RouteSession {
    fn default() -> Self {
        Self::new(TopologyConfig::default(), AnimationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationPhase;
    use crate::graph::{Edge, Node};
    use netroute_env::FrameQueue;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn id(s: &str) -> Option<NodeId> {
        Some(NodeId::from(s))
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_initial_state() {
        let session = RouteSession::default();
        assert_eq!(session.state().status, IDLE_STATUS);
        assert_eq!(session.graph().node_count(), 6);
        assert!(!session.state().animating);
    }

    #[test]
    fn test_send_and_deliver() {
        let mut frames = FrameQueue::new();
        let mut session = RouteSession::default();
        session.select_source(id("A")).unwrap();
        session.select_destination(id("F")).unwrap();

        assert_eq!(session.send_packet(ms(0), &mut frames), Ok(18));
        assert!(session.state().animating);
        assert_eq!(session.state().status, "Sending packet A → F (cost 18)");
        assert!(session.state().path_uses(&NodeId::from("E"), &NodeId::from("C")));
        assert!(!session.state().path_uses(&NodeId::from("A"), &NodeId::from("B")));

        let handle = frames.next_due().unwrap();
        assert!(matches!(
            session.tick(handle, ms(2500), &mut frames),
            TickOutcome::Completed(_)
        ));
        assert!(!session.state().animating);
        assert!(session.state().delivered);
        assert_eq!(
            session.state().status,
            "Packet delivered A → F via A → C → E → F (cost 18)"
        );
    }

    #[test]
    fn test_roles_follow_selection() {
        let mut session = RouteSession::default();
        session.select_source(id("B")).unwrap();
        session.select_destination(id("D")).unwrap();

        assert_eq!(session.role_of(&NodeId::from("B")), NodeRole::Source);
        assert_eq!(session.role_of(&NodeId::from("D")), NodeRole::Destination);
        assert_eq!(session.role_of(&NodeId::from("A")), NodeRole::Router);
    }

    #[test]
    fn test_missing_selection() {
        let mut frames = FrameQueue::new();
        let mut session = RouteSession::default();
        session.select_source(id("A")).unwrap();

        assert_eq!(
            session.send_packet(ms(0), &mut frames),
            Err(RouteError::MissingSelection)
        );
        assert_eq!(session.state().status, "Select both a source and a destination");
    }

    #[test]
    fn test_same_node_refused_before_solver() {
        let mut frames = FrameQueue::new();
        let mut session = RouteSession::default();
        session.select_source(id("C")).unwrap();
        session.select_destination(id("C")).unwrap();

        assert_eq!(
            session.send_packet(ms(0), &mut frames),
            Err(RouteError::InvalidSelection(NodeId::from("C")))
        );
        assert_eq!(frames.issued(), 0);
        assert_eq!(session.animator().phase(), AnimationPhase::Idle);
    }

    #[test]
    fn test_unknown_selection_rejected() {
        let mut session = RouteSession::default();
        assert_eq!(
            session.select_source(id("Q")),
            Err(RouteError::UnknownNode(NodeId::from("Q")))
        );
        assert!(session.state().source.is_none());

        // Clearing is always allowed
        session.select_source(id("A")).unwrap();
        session.select_source(None).unwrap();
        assert!(session.state().source.is_none());
    }

    #[test]
    fn test_no_path_reported() {
        let graph = Graph::new(
            vec![Node::new("A", 0.0, 0.0), Node::new("B", 200.0, 0.0), Node::new("C", 400.0, 0.0)],
            vec![Edge::new("A", "B", 5)],
        )
        .unwrap();
        let mut frames = FrameQueue::new();
        let mut session = RouteSession::with_graph(graph, TopologyConfig::default(), AnimationConfig::default());
        session.select_source(id("A")).unwrap();
        session.select_destination(id("C")).unwrap();

        let err = session.send_packet(ms(0), &mut frames).unwrap_err();
        assert_eq!(
            err,
            RouteError::NoPathFound {
                from: NodeId::from("A"),
                to: NodeId::from("C"),
            }
        );
        assert_eq!(session.state().status, "No path from A to C");
        assert!(session.state().path.is_empty());
        assert!(!session.state().animating);
    }

    #[test]
    fn test_send_over_maximal_cost_edges() {
        let graph = Graph::new(
            vec![Node::new("A", 0.0, 0.0), Node::new("B", 200.0, 0.0), Node::new("C", 400.0, 0.0)],
            vec![Edge::new("A", "B", u32::MAX), Edge::new("B", "C", u32::MAX)],
        )
        .unwrap();
        let mut frames = FrameQueue::new();
        let mut session = RouteSession::with_graph(graph, TopologyConfig::default(), AnimationConfig::default());
        session.select_source(id("A")).unwrap();
        session.select_destination(id("C")).unwrap();

        let expected = 2 * u64::from(u32::MAX);
        assert_eq!(session.send_packet(ms(0), &mut frames), Ok(expected));
        assert_eq!(session.state().path_cost(), expected);
        assert_eq!(
            session.state().status,
            format!("Sending packet A → C (cost {})", expected)
        );
    }

    #[test]
    fn test_resend_supersedes_running_packet() {
        let mut frames = FrameQueue::new();
        let mut session = RouteSession::default();
        session.select_source(id("A")).unwrap();
        session.select_destination(id("F")).unwrap();
        session.send_packet(ms(0), &mut frames).unwrap();
        let first = session.animator().pending_frame().unwrap();

        session.select_destination(id("D")).unwrap();
        assert_eq!(session.send_packet(ms(500), &mut frames), Ok(17));

        assert_eq!(session.tick(first, ms(600), &mut frames), TickOutcome::Stale);
        assert_eq!(frames.pending_count(), 1);
    }

    #[test]
    fn test_cancel_stops_packet() {
        let mut frames = FrameQueue::new();
        let mut session = RouteSession::default();
        session.select_source(id("A")).unwrap();
        session.select_destination(id("F")).unwrap();
        session.send_packet(ms(0), &mut frames).unwrap();

        assert!(session.cancel(&mut frames));
        assert!(!session.state().animating);
        assert!(!session.state().delivered);
        assert_eq!(frames.pending_count(), 0);
    }

    #[test]
    fn test_regenerate_resets_state() {
        let mut frames = FrameQueue::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut session = RouteSession::default();
        session.select_source(id("A")).unwrap();
        session.select_destination(id("F")).unwrap();
        session.send_packet(ms(0), &mut frames).unwrap();

        let graph = session.regenerate(&mut rng, Some(9), &mut frames);
        assert_eq!(graph.node_count(), 9);
        assert!(graph.is_connected());

        assert_eq!(session.state(), &SimulationState::default());
        assert_eq!(session.animator().phase(), AnimationPhase::Idle);
        assert_eq!(frames.pending_count(), 0);
        assert_eq!(session.topology_config().node_count, 9);
    }
}
