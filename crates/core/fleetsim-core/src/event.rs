//! Structured simulation events and the sinks that receive them
//!
//! The controller emits exactly five kinds of event, in tick order:
//! dispatches, then pool resizes, then new requests, then the tick summary.
//! How a sink formats or stores them is up to the sink.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::{Category, WorkItem, WorkerId};

/// Tracing target for event-log output
///
/// Subscribers can route this target to a dedicated log file.
pub const EVENT_TARGET: &str = "fleetsim::events";

/// One entry in the simulation event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    NewRequest {
        id: u64,
        source: String,
        destination: String,
        cost: u32,
        category: Category,
    },
    Dispatch {
        worker_id: WorkerId,
        id: u64,
        source: String,
        destination: String,
        cost: u32,
        category: Category,
    },
    ServerAdded {
        index: usize,
    },
    ServerRemoved {
        index: usize,
    },
    TickSummary {
        tick: u64,
        queue_size: usize,
    },
}

impl SimEvent {
    pub fn new_request(item: &WorkItem) -> Self {
        SimEvent::NewRequest {
            id: item.id,
            source: item.source.clone(),
            destination: item.destination.clone(),
            cost: item.cost,
            category: item.category,
        }
    }

    pub fn dispatch(worker_id: WorkerId, item: &WorkItem) -> Self {
        SimEvent::Dispatch {
            worker_id,
            id: item.id,
            source: item.source.clone(),
            destination: item.destination.clone(),
            cost: item.cost,
            category: item.category,
        }
    }

    /// Short name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            SimEvent::NewRequest { .. } => "new_request",
            SimEvent::Dispatch { .. } => "dispatch",
            SimEvent::ServerAdded { .. } => "server_added",
            SimEvent::ServerRemoved { .. } => "server_removed",
            SimEvent::TickSummary { .. } => "tick_summary",
        }
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimEvent::NewRequest { id, source, destination, cost, category } => write!(
                f,
                "Generated new request with ID: {id}, IP in: {source}, \
                 IP out: {destination}, time: {cost}, job type: {category}"
            ),
            SimEvent::Dispatch { worker_id, id, source, destination, cost, category } => write!(
                f,
                "Worker {worker_id} is processing request ID: {id}, IP in: {source}, \
                 IP out: {destination}, time: {cost}, job type: {category}"
            ),
            SimEvent::ServerAdded { index } => write!(f, "Added new worker {index}"),
            SimEvent::ServerRemoved { index } => write!(f, "Removed worker {index}"),
            SimEvent::TickSummary { tick, queue_size } => {
                write!(f, "Queue size at the end of cycle {tick}: {queue_size}")
            }
        }
    }
}

/// Append-only, ordered receiver of simulation events
pub trait EventSink {
    fn emit(&mut self, event: SimEvent);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: SimEvent) {
        (**self).emit(event);
    }
}

impl EventSink for Vec<SimEvent> {
    fn emit(&mut self, event: SimEvent) {
        self.push(event);
    }
}

/// Forwards every event to `tracing` under [`EVENT_TARGET`]
///
/// Per-request events go out at DEBUG, fleet changes and tick summaries at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: SimEvent) {
        match &event {
            SimEvent::NewRequest { id, category, .. } => {
                debug!(target: EVENT_TARGET, request = id, job_type = %category, "{event}");
            }
            SimEvent::Dispatch { worker_id, id, .. } => {
                debug!(target: EVENT_TARGET, worker = %worker_id, request = id, "{event}");
            }
            SimEvent::ServerAdded { index } => {
                info!(target: EVENT_TARGET, worker = index, "{event}");
            }
            SimEvent::ServerRemoved { index } => {
                info!(target: EVENT_TARGET, worker = index, "{event}");
            }
            SimEvent::TickSummary { tick, queue_size } => {
                info!(target: EVENT_TARGET, tick, queue_size, "{event}");
            }
        }
    }
}

/// Records events in memory, optionally forwarding them to another sink
#[derive(Debug, Default)]
pub struct MemorySink<S = ()> {
    events: Vec<SimEvent>,
    inner: S,
}

impl EventSink for () {
    fn emit(&mut self, _event: SimEvent) {}
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink {
            events: Vec::new(),
            inner: (),
        }
    }
}

impl<S: EventSink> MemorySink<S> {
    /// Record events and also pass them on to `inner`
    pub fn tee(inner: S) -> Self {
        MemorySink {
            events: Vec::new(),
            inner,
        }
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<SimEvent> {
        self.events
    }

    /// Number of recorded events of the given kind
    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }
}

impl<S: EventSink> EventSink for MemorySink<S> {
    fn emit(&mut self, event: SimEvent) {
        self.events.push(event.clone());
        self.inner.emit(event);
    }
}
