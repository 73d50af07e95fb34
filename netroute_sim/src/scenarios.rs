//! Routing scenarios for the deterministic harness.

use thiserror::Error;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// RT-001: A to F on the built-in topology, cost 18 via C and E
    DefaultRoute,

    /// RT-002: First to last node on a seeded random topology
    RandomRoute,

    /// RT-003: Destination on an isolated node, expect no path
    Disconnected,

    /// RT-004: Second send mid-flight supersedes the first
    Resend,

    /// RT-005: Source equals destination, refused before routing
    InvalidSelection,
}

/// Returned when a scenario name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown scenario: {0}")]
pub struct UnknownScenario(pub String);

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::DefaultRoute,
            ScenarioId::RandomRoute,
            ScenarioId::Disconnected,
            ScenarioId::Resend,
            ScenarioId::InvalidSelection,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::DefaultRoute => "default_route",
            ScenarioId::RandomRoute => "random_route",
            ScenarioId::Disconnected => "disconnected",
            ScenarioId::Resend => "resend",
            ScenarioId::InvalidSelection => "invalid_selection",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::DefaultRoute => "Route A → F on the default network, expect A → C → E → F at cost 18",
            ScenarioId::RandomRoute => "Generate a seeded topology and deliver a packet across it",
            ScenarioId::Disconnected => "Add an isolated router and verify the send is refused",
            ScenarioId::Resend => "Resend mid-flight, replay the stale frame, expect one delivery",
            ScenarioId::InvalidSelection => "Pick the same router twice and verify nothing is routed",
        }
    }

    /// Returns true if the scenario is expected to deliver a packet.
    pub fn delivers(&self) -> bool {
        matches!(
            self,
            ScenarioId::DefaultRoute | ScenarioId::RandomRoute | ScenarioId::Resend
        )
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default_route" | "defaultroute" | "rt-001" => Ok(ScenarioId::DefaultRoute),
            "random_route" | "randomroute" | "rt-002" => Ok(ScenarioId::RandomRoute),
            "disconnected" | "rt-003" => Ok(ScenarioId::Disconnected),
            "resend" | "rt-004" => Ok(ScenarioId::Resend),
            "invalid_selection" | "invalidselection" | "rt-005" => Ok(ScenarioId::InvalidSelection),
            _ => Err(UnknownScenario(s.to_string())),
        }
    }
}
