//! JSON exporter for offline visualization.
//!
//! Exports the topology, the route and every animation frame of a run.

use netroute_core::{AnimationFrame, Graph};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::time::Duration;

/// A single animation frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Virtual time in milliseconds
    pub time_ms: u64,

    /// Normalized progress along the route
    pub progress: f64,

    pub segment_index: usize,
    pub x: f64,
    pub y: f64,
}

impl SimFrame {
    pub fn new(time: Duration, frame: &AnimationFrame) -> Self {
        Self {
            time_ms: time.as_millis() as u64,
            progress: frame.progress,
            segment_index: frame.segment_index,
            x: frame.position.x,
            y: frame.position.y,
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Topology the packet travelled over
    pub graph: Graph,

    /// Node ids along the route, source first
    pub path: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<u64>,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub delivered: bool,

    /// Final status line
    pub status: String,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            graph: Graph::default(),
            path: Vec::new(),
            cost: None,
            frames: Vec::new(),
            delivered: false,
            status: String::new(),
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.frames.push(frame);
    }

    /// Duration covered by the recorded frames.
    pub fn duration_ms(&self) -> u64 {
        self.frames.last().map_or(0, |f| f.time_ms)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netroute_core::{locate, shortest_path};
    use netroute_env::NodeId;

    #[test]
    fn test_export_serializes_frames() {
        let graph = Graph::default_topology();
        let path = shortest_path(&graph, &NodeId::from("A"), &NodeId::from("F"));
        let frame = locate(&path, 1.0).unwrap();

        let mut export = SimExport::new("default_route", 42);
        export.graph = graph;
        export.add_frame(SimFrame::new(Duration::from_millis(2500), &frame));

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["scenario"], "default_route");
        assert_eq!(json["frames"][0]["time_ms"], 2500);
        assert_eq!(json["frames"][0]["x"], 700.0);
        assert!(json.get("cost").is_none());
        assert_eq!(export.duration_ms(), 2500);
    }
}
