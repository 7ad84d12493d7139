//! Error types for Fleetsim

use thiserror::Error;

use crate::types::WorkerId;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, FleetError>;

/// Core error type for fleet simulation operations
///
/// None of these are recoverable at runtime. `EmptyQueue` and
/// `DispatchPrecondition` indicate a broken caller invariant and abort the
/// run; `InvalidConfiguration` is raised before the first tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FleetError {
    #[error("Dequeue from an empty work queue")]
    EmptyQueue,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Worker {worker_id} is busy and cannot accept work")]
    DispatchPrecondition { worker_id: WorkerId },
}

impl FleetError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
