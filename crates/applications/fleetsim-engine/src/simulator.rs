//! Discrete-time simulator for the load-balancing fleet
//!
//! Each tick runs four phases in a fixed order:
//! 1. dispatch queued work to available workers
//! 2. let the autoscaling policy resize the pool
//! 3. enqueue this tick's arrivals
//! 4. emit the tick summary
//!
//! Processing is synchronous, so nothing is in flight between ticks and
//! the run needs no cleanup once the tick budget is spent.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fleetsim_core::{EventSink, Result, SimEvent, WorkQueue, WorkerPool};

use crate::arrivals::{ArrivalSource, RandomArrivals};
use crate::config::SimulationConfig;
use crate::policies::AutoscalePolicy;

/// Result of a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub policy_name: String,
    pub ticks_run: u64,
    pub initial_servers: usize,
    pub final_pool_size: usize,
    pub peak_pool_size: usize,
    pub total_arrivals: u64,
    pub total_dispatched: u64,
    pub servers_added: u64,
    pub servers_removed: u64,
    pub final_queue_size: usize,
    pub peak_queue_size: usize,
    pub average_queue_size: f64,
}

/// Tick-driven fleet simulator
pub struct Simulator {
    duration_ticks: u64,
    current_tick: u64,
    queue: WorkQueue,
    pool: WorkerPool,
    policy: Box<dyn AutoscalePolicy>,
    arrivals: Box<dyn ArrivalSource>,

    // Metrics
    total_arrivals: u64,
    total_dispatched: u64,
    servers_added: u64,
    servers_removed: u64,
    peak_pool_size: usize,
    peak_queue_size: usize,
    queue_size_sum: u64,
}

impl Simulator {
    /// Build a simulator with the configured policy and random traffic
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let policy = config.policy.build()?;
        let arrivals = match config.seed {
            Some(seed) => RandomArrivals::seeded(config.arrivals.clone(), seed),
            None => RandomArrivals::new(config.arrivals.clone()),
        };

        Self::with_parts(config, policy, Box::new(arrivals))
    }

    /// Build a simulator from explicit collaborators
    ///
    /// The queue is pre-loaded with the configured backlog.
    pub fn with_parts(
        config: SimulationConfig,
        policy: Box<dyn AutoscalePolicy>,
        mut arrivals: Box<dyn ArrivalSource>,
    ) -> Result<Self> {
        config.validate()?;

        let pool = WorkerPool::new(config.run.initial_servers);
        let mut queue = WorkQueue::new();
        queue.extend(arrivals.backlog(config.backlog_size()));

        Ok(Simulator {
            duration_ticks: config.run.duration_ticks,
            current_tick: 0,
            peak_pool_size: pool.size(),
            peak_queue_size: queue.size(),
            queue,
            pool,
            policy,
            arrivals,
            total_arrivals: 0,
            total_dispatched: 0,
            servers_added: 0,
            servers_removed: 0,
            queue_size_sum: 0,
        })
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn is_finished(&self) -> bool {
        self.current_tick >= self.duration_ticks
    }

    /// Run the remaining ticks and collect the results
    pub fn run(&mut self, sink: &mut dyn EventSink) -> Result<SimulationResult> {
        info!(
            policy = self.policy.name(),
            servers = self.pool.size(),
            ticks = self.duration_ticks,
            backlog = self.queue.size(),
            "starting simulation"
        );

        while self.step(sink)? {}

        let result = self.result();
        info!(
            ticks = result.ticks_run,
            dispatched = result.total_dispatched,
            final_pool = result.final_pool_size,
            final_queue = result.final_queue_size,
            "simulation finished"
        );
        Ok(result)
    }

    /// Advance one tick
    ///
    /// Returns `false` without doing anything once the duration is exhausted.
    pub fn step(&mut self, sink: &mut dyn EventSink) -> Result<bool> {
        if self.is_finished() {
            return Ok(false);
        }
        self.current_tick += 1;
        let tick = self.current_tick;

        // 1. Dispatch
        let dispatched = self.pool.try_dispatch(&mut self.queue, sink)?;
        self.total_dispatched += dispatched as u64;

        // 2. Autoscale on the post-dispatch depth
        let decision = self
            .policy
            .decide(self.queue.size(), self.pool.size(), self.pool.floor());
        match decision.delta.cmp(&0) {
            Ordering::Greater => {
                let n = decision.delta as usize;
                self.pool.grow(n, sink);
                self.servers_added += n as u64;
            }
            Ordering::Less => {
                let removed = self.pool.shrink(decision.delta.unsigned_abs() as usize, sink);
                self.servers_removed += removed as u64;
            }
            Ordering::Equal => {}
        }
        debug_assert!(self.pool.size() >= self.pool.floor());

        // 3. Arrivals
        let new_items = self.arrivals.arrivals(tick);
        self.total_arrivals += new_items.len() as u64;
        for item in new_items {
            sink.emit(SimEvent::new_request(&item));
            self.queue.enqueue(item);
        }

        // 4. Summary
        let queue_size = self.queue.size();
        sink.emit(SimEvent::TickSummary { tick, queue_size });

        self.peak_pool_size = self.peak_pool_size.max(self.pool.size());
        self.peak_queue_size = self.peak_queue_size.max(queue_size);
        self.queue_size_sum += queue_size as u64;

        debug!(
            tick,
            dispatched,
            delta = decision.delta,
            pool = self.pool.size(),
            queue_size,
            "tick complete"
        );

        Ok(true)
    }

    /// Snapshot of the run so far
    pub fn result(&self) -> SimulationResult {
        let average_queue_size = if self.current_tick > 0 {
            self.queue_size_sum as f64 / self.current_tick as f64
        } else {
            0.0
        };

        SimulationResult {
            policy_name: self.policy.name().to_string(),
            ticks_run: self.current_tick,
            initial_servers: self.pool.floor(),
            final_pool_size: self.pool.size(),
            peak_pool_size: self.peak_pool_size,
            total_arrivals: self.total_arrivals,
            total_dispatched: self.total_dispatched,
            servers_added: self.servers_added,
            servers_removed: self.servers_removed,
            final_queue_size: self.queue.size(),
            peak_queue_size: self.peak_queue_size,
            average_queue_size,
        }
    }
}
