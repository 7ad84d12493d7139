//! FIFO work queue
//!
//! Strict insertion order: no priority, no deduplication. Category is
//! carried along but never looked at here.

use std::collections::VecDeque;

use crate::error::{FleetError, Result};
use crate::types::WorkItem;

/// Shared queue of pending work items
#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    items: VecDeque<WorkItem>,
}

impl WorkQueue {
    pub fn new() -> Self {
        WorkQueue {
            items: VecDeque::new(),
        }
    }

    /// Append an item behind everything already queued
    pub fn enqueue(&mut self, item: WorkItem) {
        self.items.push_back(item);
    }

    /// Append items in iteration order
    pub fn extend(&mut self, items: impl IntoIterator<Item = WorkItem>) {
        self.items.extend(items);
    }

    /// Remove and return the earliest-inserted item
    ///
    /// Callers are expected to check `is_empty()` first; hitting
    /// `EmptyQueue` means the dispatch loop lost track of the queue state.
    pub fn dequeue(&mut self) -> Result<WorkItem> {
        self.items.pop_front().ok_or(FleetError::EmptyQueue)
    }

    /// Head of the queue without removing it
    pub fn peek(&self) -> Option<&WorkItem> {
        self.items.front()
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
