//! Scenario runner - executes routing scenarios on a virtual clock.

use crate::context::SimContext;
use crate::exporter::{SimExport, SimFrame};
use crate::frames::SimFrameScheduler;
use crate::scenarios::ScenarioId;

use netroute_core::{
    path_node_ids, AnimationConfig, AnimationFrame, Graph, Node, RouteError, RouteRuntime,
    RouteSession, TickOutcome, TopologyConfig, TopologyGenerator,
};
use netroute_env::{FrameScheduler, NodeId, RouteContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Frame callbacks delivered
    pub total_ticks: u64,

    /// Final virtual time in milliseconds
    pub final_time_ms: u64,

    /// Cost of the last routed path
    pub cost: Option<u64>,

    /// Segments in the last routed path
    pub hops: usize,

    /// Completion events observed
    pub completions: u64,

    /// Ticks ignored as stale
    pub stale_ticks: u64,

    /// Failure message if any
    pub failure_reason: Option<String>,
}

/// Collects failed expectations for one run.
#[derive(Debug, Default)]
struct Checks {
    failures: Vec<String>,
}

impl Checks {
    fn expect(&mut self, condition: bool, message: impl FnOnce() -> String) {
        if !condition {
            let message = message();
            warn!("  expectation failed: {}", message);
            self.failures.push(message);
        }
    }

    fn reason(&self) -> Option<String> {
        if self.failures.is_empty() {
            None
        } else {
            Some(self.failures.join("; "))
        }
    }
}

/// What happened while frames were being fired.
#[derive(Debug, Default)]
struct Flight {
    ticks: u64,
    stale: u64,
    completions: u64,
    last: Option<AnimationFrame>,

    /// Progress never went backwards
    monotonic: bool,
}

impl Flight {
    fn new() -> Self {
        Self {
            monotonic: true,
            ..Self::default()
        }
    }

    /// Folds one tick outcome in, recording emitted frames.
    fn record(&mut self, outcome: TickOutcome, now: Duration, export: &mut SimExport) {
        self.ticks += 1;
        let frame = match outcome {
            TickOutcome::Stale => {
                self.stale += 1;
                return;
            }
            TickOutcome::Progress(frame) => frame,
            TickOutcome::Completed(frame) => {
                self.completions += 1;
                frame
            }
        };

        if let Some(previous) = &self.last {
            if frame.progress < previous.progress {
                self.monotonic = false;
            }
        }
        export.add_frame(SimFrame::new(now, &frame));
        self.last = Some(frame);
    }
}

/// Runs routing scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Routers in generated topologies
    node_count: usize,

    /// Frame rate in Hz
    tick_rate_hz: u32,

    /// Packet travel time
    duration: Duration,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            node_count: 7,
            tick_rate_hz: 60,
            duration: Duration::from_millis(2500),
        }
    }

    /// Sets the number of routers in generated topologies. At least two are
    /// kept so every scenario has a source and a destination.
    pub fn with_node_count(mut self, node_count: usize) -> Self {
        self.node_count = node_count.max(2);
        self
    }

    /// Sets the frame rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz.max(1);
        self
    }

    /// Sets the packet travel time.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64)
    }

    fn animation_config(&self) -> AnimationConfig {
        AnimationConfig::default()
            .with_duration(self.duration)
            .with_frame_interval(self.frame_interval())
    }

    fn topology_config(&self) -> TopologyConfig {
        TopologyConfig::default().with_node_count(self.node_count)
    }

    /// Frames a flight may take before the run is declared stuck.
    fn frame_budget(&self) -> u64 {
        let nominal = self.duration.as_secs_f64() * self.tick_rate_hz as f64;
        (nominal.ceil() as u64).saturating_mul(2).saturating_add(10)
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.run_recorded(scenario).0
    }

    /// Runs a scenario and also returns the recorded frames.
    pub fn run_recorded(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());

        let context = SimContext::shared(self.seed);
        let mut export = SimExport::new(scenario.name(), self.seed);
        let mut checks = Checks::default();

        let flight = match scenario {
            ScenarioId::DefaultRoute => self.run_default_route(&context, &mut export, &mut checks),
            ScenarioId::RandomRoute => self.run_random_route(&context, &mut export, &mut checks),
            ScenarioId::Disconnected => self.run_disconnected(&context, &mut export, &mut checks),
            ScenarioId::Resend => self.run_resend(&context, &mut export, &mut checks),
            ScenarioId::InvalidSelection => {
                self.run_invalid_selection(&context, &mut export, &mut checks)
            }
        };

        checks.expect(export.delivered == scenario.delivers(), || {
            format!(
                "{} should {}deliver, delivered={}",
                scenario.name(),
                if scenario.delivers() { "" } else { "not " },
                export.delivered
            )
        });

        let result = ScenarioResult {
            scenario,
            seed: self.seed,
            passed: checks.failures.is_empty(),
            total_ticks: flight.ticks,
            final_time_ms: context.now().as_millis() as u64,
            cost: export.cost,
            hops: export.path.len().saturating_sub(1),
            completions: flight.completions,
            stale_ticks: flight.stale,
            failure_reason: checks.reason(),
        };
        (result, export)
    }

    /// Fires frames until none are pending, `max_ticks` is reached, or the
    /// budget runs out.
    fn fly(
        &self,
        session: &mut RouteSession,
        context: &SimContext,
        frames: &mut SimFrameScheduler,
        export: &mut SimExport,
        max_ticks: Option<u64>,
        flight: &mut Flight,
    ) {
        let interval = self.frame_interval();
        let limit = max_ticks.unwrap_or(u64::MAX).min(self.frame_budget());
        let mut fired = 0;

        while fired < limit {
            let Some(handle) = frames.next_due() else {
                break;
            };
            context.advance_time(interval);
            let now = context.now();
            let outcome = session.tick(handle, now, frames);
            flight.record(outcome, now, export);
            fired += 1;

            if flight.ticks % 30 == 0 {
                debug!(
                    "  t={}ms | progress={:.2}",
                    now.as_millis(),
                    flight.last.map_or(0.0, |f| f.progress)
                );
            }
        }
    }

    fn finish_export(&self, session: &RouteSession, export: &mut SimExport) {
        let state = session.state();
        export.graph = session.graph().clone();
        export.path = path_node_ids(&state.path)
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        export.cost = (!state.path.is_empty()).then(|| state.path_cost());
        export.delivered = state.delivered;
        export.status = state.status.clone();
    }

    fn run_default_route(
        &self,
        context: &Arc<SimContext>,
        export: &mut SimExport,
        checks: &mut Checks,
    ) -> Flight {
        let mut session = RouteSession::new(self.topology_config(), self.animation_config());
        let mut frames = SimFrameScheduler::new();
        let mut flight = Flight::new();

        let selected = session
            .select_source(Some(NodeId::from("A")))
            .and_then(|_| session.select_destination(Some(NodeId::from("F"))));
        checks.expect(selected.is_ok(), || format!("selection failed: {:?}", selected));

        let sent = session.send_packet(context.now(), &mut frames);
        checks.expect(sent == Ok(18), || format!("expected cost 18, got {:?}", sent));

        self.fly(&mut session, context, &mut frames, export, None, &mut flight);
        self.finish_export(&session, export);

        checks.expect(export.path == ["A", "C", "E", "F"], || {
            format!("expected A-C-E-F, got {:?}", export.path)
        });
        checks.expect(flight.completions == 1, || {
            format!("expected one completion, got {}", flight.completions)
        });
        checks.expect(flight.monotonic, || "progress went backwards".to_string());
        checks.expect(session.state().delivered, || "packet not delivered".to_string());

        let arrived_at = session.graph().node(&NodeId::from("F")).map(|n| n.position);
        checks.expect(flight.last.map(|f| f.position) == arrived_at, || {
            "packet did not finish on F".to_string()
        });
        flight
    }

    fn run_random_route(
        &self,
        context: &Arc<SimContext>,
        export: &mut SimExport,
        checks: &mut Checks,
    ) -> Flight {
        let session = RouteSession::new(self.topology_config(), self.animation_config());
        let mut runtime = RouteRuntime::new(Arc::clone(context), session);
        let mut flight = Flight::new();

        let graph = runtime.regenerate(Some(self.node_count));
        let expected_nodes = self.topology_config().effective_node_count();
        checks.expect(graph.node_count() == expected_nodes, || {
            format!("expected {} nodes, got {}", expected_nodes, graph.node_count())
        });
        checks.expect(graph.is_connected(), || "generated graph is disconnected".to_string());

        let endpoints = match (graph.nodes().first(), graph.nodes().last()) {
            (Some(first), Some(last)) if first.id != last.id => Some((first.id.clone(), last.id.clone())),
            _ => None,
        };
        let Some((source, destination)) = endpoints else {
            checks.expect(false, || "generated graph has fewer than two routers".to_string());
            self.finish_export(runtime.session(), export);
            return flight;
        };

        let sent = runtime
            .select(source.clone(), destination.clone())
            .and_then(|_| runtime.send_packet());
        checks.expect(sent.is_ok(), || {
            format!("send {} -> {} failed: {:?}", source, destination, sent)
        });

        let interval = self.frame_interval();
        for _ in 0..self.frame_budget() {
            context.advance_time(interval);
            let now = context.now();
            match runtime.step() {
                Some(outcome) => flight.record(outcome, now, export),
                None => break,
            }
        }
        self.finish_export(runtime.session(), export);

        checks.expect(flight.completions == 1, || {
            format!("expected one completion, got {}", flight.completions)
        });
        checks.expect(flight.monotonic, || "progress went backwards".to_string());
        checks.expect(
            export.path.first() == Some(&source.to_string())
                && export.path.last() == Some(&destination.to_string()),
            || format!("route {:?} does not join {} and {}", export.path, source, destination),
        );
        flight
    }

    fn run_disconnected(
        &self,
        context: &Arc<SimContext>,
        export: &mut SimExport,
        checks: &mut Checks,
    ) -> Flight {
        let mut rng = context.rng(0);
        let generated = TopologyGenerator::new(self.topology_config()).generate(&mut rng);

        let mut nodes = generated.nodes().to_vec();
        nodes.push(Node::new("Z", 10.0, 10.0));
        let graph = match Graph::new(nodes, generated.edges().to_vec()) {
            Ok(graph) => graph,
            Err(err) => {
                checks.expect(false, || format!("could not build graph: {}", err));
                return Flight::new();
            }
        };

        let source = graph.nodes().first().map(|n| n.id.clone());
        let mut session = RouteSession::with_graph(graph, self.topology_config(), self.animation_config());
        let mut frames = SimFrameScheduler::new();

        let selected = session
            .select_source(source.clone())
            .and_then(|_| session.select_destination(Some(NodeId::from("Z"))));
        checks.expect(selected.is_ok(), || format!("selection failed: {:?}", selected));

        let sent = session.send_packet(context.now(), &mut frames);
        checks.expect(matches!(sent, Err(RouteError::NoPathFound { .. })), || {
            format!("expected no path, got {:?}", sent)
        });
        checks.expect(frames.requested().is_empty(), || {
            "frames were scheduled for an unroutable packet".to_string()
        });
        checks.expect(session.state().status.starts_with("No path from"), || {
            format!("unexpected status: {}", session.state().status)
        });

        self.finish_export(&session, export);
        Flight::new()
    }

    fn run_resend(
        &self,
        context: &Arc<SimContext>,
        export: &mut SimExport,
        checks: &mut Checks,
    ) -> Flight {
        let mut session = RouteSession::new(self.topology_config(), self.animation_config());
        let mut frames = SimFrameScheduler::new();
        let mut flight = Flight::new();

        let first = session
            .select_source(Some(NodeId::from("A")))
            .and_then(|_| session.select_destination(Some(NodeId::from("F"))))
            .and_then(|_| session.send_packet(context.now(), &mut frames));
        checks.expect(first.is_ok(), || format!("first send failed: {:?}", first));

        // Fly roughly halfway, then redirect to D
        let halfway = self.frame_budget().saturating_sub(10) / 4;
        self.fly(&mut session, context, &mut frames, export, Some(halfway), &mut flight);
        let superseded = session.animator().pending_frame();

        let second = session
            .select_destination(Some(NodeId::from("D")))
            .and_then(|_| session.send_packet(context.now(), &mut frames));
        checks.expect(second == Ok(17), || format!("expected resend cost 17, got {:?}", second));

        if let Some(stale) = superseded {
            checks.expect(frames.cancelled().contains(&stale), || {
                format!("{} was not cancelled on resend", stale)
            });
            // A callback that was already queued must not move the packet
            let outcome = session.tick(stale, context.now(), &mut frames);
            flight.record(outcome, context.now(), export);
        }
        checks.expect(flight.stale == 1, || {
            format!("expected the replayed frame to be stale, got {} stale", flight.stale)
        });
        checks.expect(flight.completions == 0, || "first packet completed early".to_string());

        self.fly(&mut session, context, &mut frames, export, None, &mut flight);
        self.finish_export(&session, export);

        checks.expect(flight.completions == 1, || {
            format!("expected one completion, got {}", flight.completions)
        });
        checks.expect(export.path.last().map(String::as_str) == Some("D"), || {
            format!("final route {:?} does not end at D", export.path)
        });
        checks.expect(frames.pending_count() == 0, || "frames left pending".to_string());
        flight
    }

    fn run_invalid_selection(
        &self,
        context: &Arc<SimContext>,
        export: &mut SimExport,
        checks: &mut Checks,
    ) -> Flight {
        let mut session = RouteSession::new(self.topology_config(), self.animation_config());
        let mut frames = SimFrameScheduler::new();

        let sent = session
            .select_source(Some(NodeId::from("C")))
            .and_then(|_| session.select_destination(Some(NodeId::from("C"))))
            .and_then(|_| session.send_packet(context.now(), &mut frames));
        checks.expect(
            sent == Err(RouteError::InvalidSelection(NodeId::from("C"))),
            || format!("expected invalid selection, got {:?}", sent),
        );
        checks.expect(frames.requested().is_empty(), || {
            "frames were scheduled for an invalid selection".to_string()
        });
        checks.expect(!session.animator().is_running(), || "animator started".to_string());

        self.finish_export(&session, export);
        Flight::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_route_passes() {
        let result = ScenarioRunner::new(42).run(ScenarioId::DefaultRoute);
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.cost, Some(18));
        assert_eq!(result.hops, 3);
        assert_eq!(result.completions, 1);
        assert!(result.final_time_ms >= 2500);
    }

    #[test]
    fn test_all_scenarios_pass() {
        let runner = ScenarioRunner::new(7);
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(result.passed, "{}: {:?}", scenario, result.failure_reason);
        }
    }

    #[test]
    fn test_resend_records_one_stale_tick() {
        let result = ScenarioRunner::new(1).run(ScenarioId::Resend);
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.stale_ticks, 1);
        assert_eq!(result.cost, Some(17));
    }

    #[test]
    fn test_failing_scenarios_emit_no_frames() {
        let runner = ScenarioRunner::new(3);
        for scenario in [ScenarioId::Disconnected, ScenarioId::InvalidSelection] {
            let (result, export) = runner.run_recorded(scenario);
            assert!(result.passed, "{}: {:?}", scenario, result.failure_reason);
            assert!(export.frames.is_empty());
            assert!(!export.delivered);
        }
    }

    #[test]
    fn test_random_route_is_reproducible() {
        let runner = ScenarioRunner::new(99).with_node_count(9);
        let (_, a) = runner.run_recorded(ScenarioId::RandomRoute);
        let (_, b) = runner.run_recorded(ScenarioId::RandomRoute);

        assert_eq!(a.graph, b.graph);
        assert_eq!(a.path, b.path);
        assert_eq!(a.frames.len(), b.frames.len());
        assert_eq!(a.graph.node_count(), 9);
    }

    #[test]
    fn test_delivery_matches_scenario_expectation() {
        let runner = ScenarioRunner::new(11);
        for scenario in ScenarioId::all() {
            let (result, export) = runner.run_recorded(scenario);
            assert!(result.passed, "{}: {:?}", scenario, result.failure_reason);
            assert_eq!(export.delivered, scenario.delivers(), "{}", scenario);
        }
    }

    #[test]
    fn test_frame_budget_saturates_for_huge_durations() {
        let runner = ScenarioRunner::new(1)
            .with_duration(Duration::from_secs(u64::MAX / 2))
            .with_tick_rate(u32::MAX);
        assert_eq!(runner.frame_budget(), u64::MAX);
    }

    #[test]
    fn test_export_covers_duration() {
        let runner = ScenarioRunner::new(5).with_duration(Duration::from_millis(1000));
        let (result, export) = runner.run_recorded(ScenarioId::DefaultRoute);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert!(export.delivered);
        assert!(export.duration_ms() >= 1000);
        assert_eq!(export.frames.last().map(|f| f.progress), Some(1.0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_random_route_delivers(seed in any::<u64>(), nodes in 2usize..=10) {
            let result = ScenarioRunner::new(seed)
                .with_node_count(nodes)
                .with_tick_rate(30)
                .run(ScenarioId::RandomRoute);
            prop_assert!(result.passed, "{:?}", result.failure_reason);
        }
    }
}
