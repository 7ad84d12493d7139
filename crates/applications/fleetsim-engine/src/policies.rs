//! Autoscaling policies for the worker pool
//!
//! Implements the policies a run can be configured with:
//! - Threshold: one worker per N pending items plus a baseline, decaying
//!   toward the floor when the queue runs short
//! - Fixed: never resizes (baseline for comparison)

use serde::{Deserialize, Serialize};

use fleetsim_core::{FleetError, Result};

/// Largest accepted `baseline`; anything above would ask for an absurd pool
pub const MAX_BASELINE: usize = 100_000;

/// Resize decision for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoscaleDecision {
    pub target_size: usize,
    /// Positive = grow, negative = shrink, zero = no-op
    pub delta: i64,
}

impl AutoscaleDecision {
    pub fn no_op(current_size: usize) -> Self {
        AutoscaleDecision {
            target_size: current_size,
            delta: 0,
        }
    }

    fn grow(current_size: usize, by: usize) -> Self {
        AutoscaleDecision {
            target_size: current_size.saturating_add(by),
            delta: i64::try_from(by).unwrap_or(i64::MAX),
        }
    }

    fn shrink(current_size: usize, by: usize) -> Self {
        AutoscaleDecision {
            target_size: current_size - by,
            delta: -(by as i64),
        }
    }

    pub fn is_no_op(&self) -> bool {
        self.delta == 0
    }
}

/// Autoscaling policy trait
pub trait AutoscalePolicy {
    /// Decide the pool size for the next tick
    ///
    /// `queue_depth` is the queue size after this tick's dispatch. The
    /// decision must never take the pool below `floor`.
    fn decide(&self, queue_depth: usize, current_size: usize, floor: usize) -> AutoscaleDecision;

    /// Get policy name
    fn name(&self) -> &str;
}

/// Which policy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Threshold,
    Fixed,
}

/// Tunables for the threshold policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub kind: PolicyKind,
    /// Pending items one worker is expected to absorb
    pub items_per_worker: usize,
    /// Shrink when depth drops below `current_size / shrink_divisor`
    pub shrink_divisor: usize,
    /// Workers required even with an empty queue
    pub baseline: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            kind: PolicyKind::Threshold,
            items_per_worker: 10,
            shrink_divisor: 2,
            baseline: 1,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.items_per_worker == 0 {
            return Err(FleetError::config("items_per_worker must be > 0"));
        }
        if self.shrink_divisor == 0 {
            return Err(FleetError::config("shrink_divisor must be > 0"));
        }
        if self.baseline > MAX_BASELINE {
            return Err(FleetError::config(format!(
                "baseline must be <= {MAX_BASELINE}, got {}",
                self.baseline
            )));
        }
        Ok(())
    }

    /// Build the configured policy
    pub fn build(&self) -> Result<Box<dyn AutoscalePolicy>> {
        self.validate()?;
        Ok(match self.kind {
            PolicyKind::Threshold => Box::new(ThresholdPolicy::from_config(self)),
            PolicyKind::Fixed => Box::new(FixedPolicy::new()),
        })
    }
}

/// Queue-depth threshold policy
///
/// 1. `required = depth / items_per_worker + baseline`
/// 2. grow to `required` when `depth > current` and `required > current`
/// 3. otherwise, when `depth < current / shrink_divisor`, shrink by
///    `current - depth / items_per_worker`, clamped to the floor
///
/// Rules 2 and 3 never both fire in the same tick.
#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    items_per_worker: usize,
    shrink_divisor: usize,
    baseline: usize,
}

impl ThresholdPolicy {
    pub fn new() -> Self {
        Self::from_config(&PolicyConfig::default())
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        ThresholdPolicy {
            items_per_worker: config.items_per_worker.max(1),
            shrink_divisor: config.shrink_divisor.max(1),
            baseline: config.baseline,
        }
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoscalePolicy for ThresholdPolicy {
    fn decide(&self, queue_depth: usize, current_size: usize, floor: usize) -> AutoscaleDecision {
        let covered = queue_depth / self.items_per_worker;
        let required = covered.saturating_add(self.baseline);

        if queue_depth > current_size && required > current_size {
            return AutoscaleDecision::grow(current_size, required - current_size);
        }

        if queue_depth < current_size / self.shrink_divisor {
            // Raw amount can exceed what the floor allows; never negative
            let to_remove = current_size
                .saturating_sub(covered)
                .min(current_size.saturating_sub(floor));
            if to_remove > 0 {
                return AutoscaleDecision::shrink(current_size, to_remove);
            }
        }

        AutoscaleDecision::no_op(current_size)
    }

    fn name(&self) -> &str {
        "Threshold"
    }
}

/// Baseline policy: the pool keeps its initial size for the whole run
pub struct FixedPolicy;

impl FixedPolicy {
    pub fn new() -> Self {
        FixedPolicy
    }
}

impl AutoscalePolicy for FixedPolicy {
    fn decide(&self, _queue_depth: usize, current_size: usize, _floor: usize) -> AutoscaleDecision {
        AutoscaleDecision::no_op(current_size)
    }

    fn name(&self) -> &str {
        "Fixed"
    }
}
