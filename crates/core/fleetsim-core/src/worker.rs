//! Workers and the floor-bounded worker pool
//!
//! The pool owns its workers by value. Growth appends at the tail and
//! shrinking pops from the tail, so the most recently added workers are
//! reclaimed first and interior workers are never disturbed.

use tracing::debug;

use crate::error::{FleetError, Result};
use crate::event::{EventSink, SimEvent};
use crate::queue::WorkQueue;
use crate::types::{WorkItem, WorkerId};

/// A single server in the fleet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worker {
    id: WorkerId,
    available: bool,
}

impl Worker {
    pub fn new(id: WorkerId) -> Self {
        Worker {
            id,
            available: true,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Handle one work item
    ///
    /// Processing is instantaneous at tick granularity: the worker is busy
    /// only for the duration of this call. The item's `cost` is reported,
    /// not waited on.
    pub fn process(&mut self, item: WorkItem, sink: &mut dyn EventSink) -> Result<()> {
        if !self.available {
            return Err(FleetError::DispatchPrecondition { worker_id: self.id });
        }

        self.available = false;
        sink.emit(SimEvent::dispatch(self.id, &item));
        self.available = true;

        Ok(())
    }
}

/// Ordered collection of workers that never shrinks below its floor
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: Vec<Worker>,
    floor: usize,
}

impl WorkerPool {
    /// Create a pool of `floor` workers with identities `0..floor`
    pub fn new(floor: usize) -> Self {
        WorkerPool {
            workers: (0..floor).map(|i| Worker::new(WorkerId(i))).collect(),
            floor,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn floor(&self) -> usize {
        self.floor
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    /// Hand queued items to available workers, scanning left to right
    ///
    /// The scan order is fixed: when the queue holds fewer items than there
    /// are workers, the lowest positions get the work. Each worker takes at
    /// most one item per scan. Returns the number of items dispatched.
    pub fn try_dispatch(
        &mut self,
        queue: &mut WorkQueue,
        sink: &mut dyn EventSink,
    ) -> Result<usize> {
        let mut dispatched = 0;

        for worker in self.workers.iter_mut() {
            if queue.is_empty() {
                break;
            }
            if !worker.is_available() {
                continue;
            }

            let item = queue.dequeue()?;
            worker.process(item, sink)?;
            dispatched += 1;
        }

        Ok(dispatched)
    }

    /// Append `n` fresh workers
    ///
    /// Each new worker's identity is the pool size at the moment it is
    /// appended.
    pub fn grow(&mut self, n: usize, sink: &mut dyn EventSink) {
        for _ in 0..n {
            let index = self.workers.len();
            self.workers.push(Worker::new(WorkerId(index)));
            sink.emit(SimEvent::ServerAdded { index });
        }

        if n > 0 {
            debug!(added = n, size = self.size(), "worker pool grown");
        }
    }

    /// Remove up to `n` workers from the tail, stopping at the floor
    ///
    /// Returns how many workers were actually removed.
    pub fn shrink(&mut self, n: usize, sink: &mut dyn EventSink) -> usize {
        let removable = self.size().saturating_sub(self.floor);
        let to_remove = n.min(removable);

        for _ in 0..to_remove {
            self.workers.pop();
            sink.emit(SimEvent::ServerRemoved { index: self.workers.len() });
        }

        if to_remove > 0 {
            debug!(removed = to_remove, size = self.size(), "worker pool shrunk");
        }
        to_remove
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MemorySink;
    use crate::types::Category;

    fn fill(queue: &mut WorkQueue, n: u64) {
        for id in 0..n {
            queue.enqueue(WorkItem::new(id, "a", "b", 1, Category::Compute));
        }
    }

    fn dispatch_workers(sink: &MemorySink) -> Vec<(usize, u64)> {
        sink.events()
            .iter()
            .filter_map(|e| match e {
                SimEvent::Dispatch { worker_id, id, .. } => Some((worker_id.0, *id)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_worker_process_emits_dispatch() {
        let mut worker = Worker::new(WorkerId(3));
        let mut sink = MemorySink::new();
        let item = WorkItem::new(9, "1.2.3.4", "5.6.7.8", 20, Category::Stream);

        worker.process(item.clone(), &mut sink).unwrap();

        // Back to available once the call returns
        assert!(worker.is_available());
        assert_eq!(sink.events(), &[SimEvent::dispatch(WorkerId(3), &item)]);
    }

    #[test]
    fn test_busy_worker_rejects_work() {
        let mut worker = Worker::new(WorkerId(1));
        worker.available = false;
        let mut sink = MemorySink::new();

        let err = worker
            .process(WorkItem::new(1, "a", "b", 0, Category::Compute), &mut sink)
            .unwrap_err();

        assert_eq!(err, FleetError::DispatchPrecondition { worker_id: WorkerId(1) });
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_dispatch_drains_min_of_queue_and_pool() {
        let mut sink = MemorySink::new();

        // More work than workers
        let mut pool = WorkerPool::new(3);
        let mut queue = WorkQueue::new();
        fill(&mut queue, 7);
        assert_eq!(pool.try_dispatch(&mut queue, &mut sink).unwrap(), 3);
        assert_eq!(queue.size(), 4);

        // More workers than work
        let mut pool = WorkerPool::new(5);
        let mut queue = WorkQueue::new();
        fill(&mut queue, 2);
        assert_eq!(pool.try_dispatch(&mut queue, &mut sink).unwrap(), 2);
        assert!(queue.is_empty());
        assert!(pool.workers().iter().all(Worker::is_available));
    }

    #[test]
    fn test_dispatch_scans_left_to_right() {
        let mut pool = WorkerPool::new(4);
        let mut queue = WorkQueue::new();
        fill(&mut queue, 2);
        let mut sink = MemorySink::new();

        pool.try_dispatch(&mut queue, &mut sink).unwrap();

        // Head of queue goes to the first worker
        assert_eq!(dispatch_workers(&sink), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_dispatch_skips_busy_workers() {
        let mut pool = WorkerPool::new(3);
        pool.workers[1].available = false;
        let mut queue = WorkQueue::new();
        fill(&mut queue, 3);
        let mut sink = MemorySink::new();

        assert_eq!(pool.try_dispatch(&mut queue, &mut sink).unwrap(), 2);
        assert_eq!(dispatch_workers(&sink), vec![(0, 0), (2, 1)]);
        assert_eq!(queue.size(), 1);
    }

    #[test]
    fn test_grow_assigns_size_as_identity() {
        let mut pool = WorkerPool::new(2);
        let mut sink = MemorySink::new();

        pool.grow(3, &mut sink);

        assert_eq!(pool.size(), 5);
        let ids: Vec<usize> = pool.workers().iter().map(|w| w.id().0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(
            sink.events(),
            &[
                SimEvent::ServerAdded { index: 2 },
                SimEvent::ServerAdded { index: 3 },
                SimEvent::ServerAdded { index: 4 },
            ]
        );
    }

    #[test]
    fn test_shrink_is_lifo_and_floor_bounded() {
        let mut pool = WorkerPool::new(2);
        let mut sink = MemorySink::new();
        pool.grow(4, &mut sink);

        let removed = pool.shrink(10, &mut sink);

        assert_eq!(removed, 4);
        assert_eq!(pool.size(), 2);
        let removals: Vec<usize> = sink
            .events()
            .iter()
            .filter_map(|e| match e {
                SimEvent::ServerRemoved { index } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(removals, vec![5, 4, 3, 2]);

        // Already at the floor
        assert_eq!(pool.shrink(1, &mut sink), 0);
        assert_eq!(pool.size(), 2);
    }

    #[test]
    fn test_identity_reuse_after_shrink_and_grow() {
        let mut pool = WorkerPool::new(1);
        let mut sink = MemorySink::new();

        pool.grow(2, &mut sink);
        pool.shrink(1, &mut sink);
        pool.grow(1, &mut sink);

        // Identity 2 is handed out twice over the run
        let ids: Vec<usize> = pool.workers().iter().map(|w| w.id().0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(sink.count("server_added"), 3);
    }
}
