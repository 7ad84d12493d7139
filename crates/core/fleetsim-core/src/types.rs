//! Core types for the fleet simulation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of work carried by a request
///
/// Inert metadata for the queue and the pool; only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// CPU-bound processing job ('P')
    Compute,
    /// Streaming job ('S')
    Stream,
}

impl Category {
    /// Single-letter job type code used in the text log
    pub fn code(self) -> char {
        match self {
            Category::Compute => 'P',
            Category::Stream => 'S',
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Worker identity
///
/// Assigned from the pool size at creation time, so an identity is reused
/// when the pool shrinks and later grows back past the same size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of work flowing through the fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: u64,
    pub source: String,      // Incoming address
    pub destination: String, // Outgoing address
    pub cost: u32,           // Processing time in ticks, logged but never waited on
    pub category: Category,
}

impl WorkItem {
    pub fn new(
        id: u64,
        source: impl Into<String>,
        destination: impl Into<String>,
        cost: u32,
        category: Category,
    ) -> Self {
        WorkItem {
            id,
            source: source.into(),
            destination: destination.into(),
            cost,
            category,
        }
    }
}
