//! Fleetsim Simulation Engine
//!
//! Discrete-time simulator for a load-balancing fleet with queue-driven
//! autoscaling.

pub mod arrivals;
pub mod config;
pub mod policies;
pub mod simulator;

pub use arrivals::{ArrivalConfig, ArrivalSource, RandomArrivals, ScriptedArrivals};
pub use config::{ConfigOverrides, RunConfig, SimulationConfig};
pub use policies::{
    AutoscaleDecision, AutoscalePolicy, FixedPolicy, MAX_BASELINE, PolicyConfig, PolicyKind,
    ThresholdPolicy,
};
pub use simulator::{SimulationResult, Simulator};
