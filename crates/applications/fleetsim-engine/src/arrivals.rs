//! Synthetic request generation
//!
//! The simulator only needs "zero or more work items per tick"; where they
//! come from is pluggable through [`ArrivalSource`]. [`RandomArrivals`]
//! produces uniformly random traffic:
//! - per-tick count drawn from a configured inclusive range
//! - random dotted-quad source and destination addresses
//! - uniform cost and a fair coin for the job category

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use fleetsim_core::{Category, FleetError, Result, WorkItem};

/// Supplier of new work items
pub trait ArrivalSource {
    /// Items arriving during `tick` (1-based)
    fn arrivals(&mut self, tick: u64) -> Vec<WorkItem>;

    /// Items pre-loaded into the queue before the first tick
    fn backlog(&mut self, count: usize) -> Vec<WorkItem>;
}

/// Shape of the synthetic traffic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrivalConfig {
    pub min_per_tick: usize,
    pub max_per_tick: usize,
    /// Upper bound (inclusive) for a request's cost
    pub max_cost: u32,
    /// Backlog size per initial server
    pub backlog_per_server: usize,
}

impl Default for ArrivalConfig {
    fn default() -> Self {
        ArrivalConfig {
            min_per_tick: 1,
            max_per_tick: 10,
            max_cost: 99,
            backlog_per_server: 100,
        }
    }
}

impl ArrivalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_per_tick > self.max_per_tick {
            return Err(FleetError::config(format!(
                "arrival range is empty: min {} > max {}",
                self.min_per_tick, self.max_per_tick
            )));
        }
        Ok(())
    }
}

/// Random request generator
///
/// Ids increase monotonically across backlog and arrivals for the whole run.
pub struct RandomArrivals {
    config: ArrivalConfig,
    rng: StdRng,
    next_id: u64,
}

impl RandomArrivals {
    /// Create a generator seeded from OS entropy
    pub fn new(config: ArrivalConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a reproducible generator
    pub fn seeded(config: ArrivalConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: ArrivalConfig, rng: StdRng) -> Self {
        RandomArrivals {
            config,
            rng,
            next_id: 0,
        }
    }

    fn random_ip(&mut self) -> String {
        let octets: [u8; 4] = [
            self.rng.gen_range(0..=255),
            self.rng.gen_range(0..=255),
            self.rng.gen_range(0..=255),
            self.rng.gen_range(0..=255),
        ];
        format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
    }

    fn next_item(&mut self) -> WorkItem {
        let id = self.next_id;
        self.next_id += 1;

        let source = self.random_ip();
        let destination = self.random_ip();
        let cost = self.rng.gen_range(0..=self.config.max_cost);
        let category = if self.rng.gen_bool(0.5) {
            Category::Compute
        } else {
            Category::Stream
        };

        WorkItem::new(id, source, destination, cost, category)
    }
}

impl ArrivalSource for RandomArrivals {
    fn arrivals(&mut self, _tick: u64) -> Vec<WorkItem> {
        let count = self
            .rng
            .gen_range(self.config.min_per_tick..=self.config.max_per_tick);
        (0..count).map(|_| self.next_item()).collect()
    }

    fn backlog(&mut self, count: usize) -> Vec<WorkItem> {
        (0..count).map(|_| self.next_item()).collect()
    }
}

/// Replays a fixed arrival count per tick with deterministic items
///
/// Useful for reproducing a known load curve.
pub struct ScriptedArrivals {
    counts: Vec<usize>,
    next_id: u64,
}

impl ScriptedArrivals {
    /// `counts[i]` items arrive on tick `i + 1`; ticks past the end get none
    pub fn new(counts: Vec<usize>) -> Self {
        ScriptedArrivals { counts, next_id: 0 }
    }

    fn make(&mut self, count: usize) -> Vec<WorkItem> {
        (0..count)
            .map(|_| {
                let id = self.next_id;
                self.next_id += 1;
                let category = if id % 2 == 0 { Category::Compute } else { Category::Stream };
                WorkItem::new(id, "10.0.0.1", "10.0.0.2", (id % 100) as u32, category)
            })
            .collect()
    }
}

impl ArrivalSource for ScriptedArrivals {
    fn arrivals(&mut self, tick: u64) -> Vec<WorkItem> {
        let count = tick
            .checked_sub(1)
            .and_then(|i| self.counts.get(i as usize).copied())
            .unwrap_or(0);
        self.make(count)
    }

    fn backlog(&mut self, count: usize) -> Vec<WorkItem> {
        self.make(count)
    }
}
