//! Run configuration
//!
//! A run is fixed at construction: server count, duration, traffic shape and
//! policy. Nothing here changes mid-run.

use serde::{Deserialize, Serialize};

use fleetsim_core::{FleetError, Result};

use crate::arrivals::ArrivalConfig;
use crate::policies::{PolicyConfig, PolicyKind};

/// The two user-supplied run parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Starting pool size, also the floor autoscaling never goes below
    pub initial_servers: usize,
    pub duration_ticks: u64,
}

impl RunConfig {
    /// Validate raw (possibly negative) user input
    pub fn try_new(initial_servers: i64, duration_ticks: i64) -> Result<Self> {
        if initial_servers <= 0 {
            return Err(FleetError::config(format!(
                "initial server count must be > 0, got {initial_servers}"
            )));
        }
        if duration_ticks < 0 {
            return Err(FleetError::config(format!(
                "duration must be >= 0 ticks, got {duration_ticks}"
            )));
        }

        Ok(RunConfig {
            initial_servers: initial_servers as usize,
            duration_ticks: duration_ticks as u64,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_servers == 0 {
            return Err(FleetError::config("initial server count must be > 0, got 0"));
        }
        Ok(())
    }
}

/// Everything needed to build a simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub run: RunConfig,

    /// RNG seed for reproducible traffic; OS entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub arrivals: ArrivalConfig,

    #[serde(default)]
    pub policy: PolicyConfig,
}

impl SimulationConfig {
    pub fn new(run: RunConfig) -> Self {
        SimulationConfig {
            run,
            seed: None,
            arrivals: ArrivalConfig::default(),
            policy: PolicyConfig::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse a JSON config document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)
            .map_err(|e| FleetError::config(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.run.validate()?;
        self.arrivals.validate()?;
        self.policy.validate()?;

        if self
            .run
            .initial_servers
            .checked_mul(self.arrivals.backlog_per_server)
            .is_none()
        {
            return Err(FleetError::config(format!(
                "backlog of {} servers x {} requests overflows",
                self.run.initial_servers, self.arrivals.backlog_per_server
            )));
        }
        Ok(())
    }

    /// Items pre-loaded before the first tick
    pub fn backlog_size(&self) -> usize {
        self.run
            .initial_servers
            .saturating_mul(self.arrivals.backlog_per_server)
    }

    /// Apply command-line values on top of this config, then re-validate
    ///
    /// Any field set in `overrides` wins over the loaded value.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if overrides.servers.is_some() || overrides.duration.is_some() {
            let servers = overrides
                .servers
                .unwrap_or(self.run.initial_servers as i64);
            let duration = overrides
                .duration
                .unwrap_or(self.run.duration_ticks as i64);
            self.run = RunConfig::try_new(servers, duration)?;
        }
        if let Some(seed) = overrides.seed {
            self.seed = Some(seed);
        }
        if let Some(min) = overrides.min_arrivals {
            self.arrivals.min_per_tick = min;
        }
        if let Some(max) = overrides.max_arrivals {
            self.arrivals.max_per_tick = max;
        }
        if let Some(backlog) = overrides.backlog_per_server {
            self.arrivals.backlog_per_server = backlog;
        }
        if let Some(kind) = overrides.policy {
            self.policy.kind = kind;
        }

        self.validate()
    }
}

/// Optional per-field values that take precedence over a loaded config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub servers: Option<i64>,
    pub duration: Option<i64>,
    pub seed: Option<u64>,
    pub min_arrivals: Option<usize>,
    pub max_arrivals: Option<usize>,
    pub backlog_per_server: Option<usize>,
    pub policy: Option<PolicyKind>,
}
