//! Fleetsim Core - Shared types for the load-balancing fleet simulation
//!
//! This crate defines the pieces the simulation loop is built from:
//! - WorkItem (one unit of work) and WorkQueue (strict FIFO)
//! - Worker and WorkerPool (floor-bounded, LIFO shrink)
//! - SimEvent and the EventSink trait (structured event log)
//! - Error types
//!
//! Everything here is synchronous and single-threaded. The controller in
//! `fleetsim-engine` holds the only `&mut` to the queue, pool and sink.

pub mod types;
pub mod queue;
pub mod worker;
pub mod event;
pub mod error;

pub use types::*;
pub use queue::WorkQueue;
pub use worker::{Worker, WorkerPool};
pub use event::{EventSink, MemorySink, SimEvent, TracingSink};
pub use error::*;
