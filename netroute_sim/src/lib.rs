//! NetRoute Deterministic Simulation Harness
//!
//! Runs the routing engine headlessly on a virtual clock, so every
//! topology, route and animation frame is reproducible from one seed.
//!
//! # Core Principle: Injected Time, Frames and Entropy
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: Virtual clock advances one frame interval per fired frame
//! - **Frames**: A manual scheduler that records every request and cancel
//! - **Randomness**: All topologies derived from a single 64-bit seed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ScenarioRunner                          │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │ SimContext (Virtual Clock + Seeded ChaCha8)          │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │       │                        │                            │
//! │  ┌────▼─────────┐       ┌──────▼────────────┐               │
//! │  │ RouteSession │◄─────►│ SimFrameScheduler │               │
//! │  └──────────────┘ ticks └───────────────────┘               │
//! │       │                                                     │
//! │  ┌────▼──────────────────────────────┐                      │
//! │  │  SimExport (frames → JSON)        │                      │
//! │  └───────────────────────────────────┘                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use netroute_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::DefaultRoute);
//! assert!(result.passed);
//! ```

mod context;
mod exporter;
mod frames;
mod runner;
pub mod scenarios;

pub use context::SimContext;
pub use exporter::{SimExport, SimFrame};
pub use frames::SimFrameScheduler;
pub use runner::{ScenarioResult, ScenarioRunner};
