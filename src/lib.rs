//! Discrete-time simulation of trains moving over a railway network.
//!
//! A [`Network`] of nodes and rails is loaded, every [`Train`] gets a path
//! from a [`PathfindingStrategy`], and [`Simulation`] advances all trains in
//! fixed steps, braking for trains ahead and reporting collisions and
//! progress to its [`Observer`]s.

pub mod config;
pub mod error;
pub mod input;
pub mod network;
pub mod observer;
pub mod output;
pub mod pathfinding;
pub mod simulation;
pub mod time;
pub mod train;

pub use config::SimulationConfig;
pub use error::{ConfigError, ConfigFileError, Error, OutputError, ParseError, SimulationError};
pub use network::{Network, NodeId, RailId};
pub use observer::{Event, EventLogger, Observer, ObserverId, Snapshot};
pub use output::ResultWriter;
pub use pathfinding::{Dijkstra, EdgeCost, PathfindingStrategy};
pub use simulation::{Phase, RunOutcome, RunReport, Simulation, TrainSummary};
pub use time::Time;
pub use train::{Train, TrainId, TrainPhysics, TrainSpec, TrainState};
