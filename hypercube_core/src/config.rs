//! Tunables for worker nodes and the gradient balancer.

use crate::error::BalancerError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration shared by a cluster and its balancer.
///
/// Durations are stored in milliseconds so the struct round-trips through
/// JSON config files unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Queue length at which a node reports itself full (default: 5)
    pub queue_capacity: usize,

    /// Maximum in-flight processing operations per node (default: 5)
    pub concurrency_limit: usize,

    /// Simulated processing time per unit of task weight (default: 100ms)
    pub time_per_weight_unit_ms: u64,

    /// Pause between rebalancing passes (default: 10ms)
    pub rebalance_pass_delay_ms: u64,

    /// Pause before rescanning when every node is full (default: 10ms)
    pub placement_retry_delay_ms: u64,

    /// Give up placing a task after this long (default: wait forever).
    ///
    /// Measured on the context clock. On a virtual clock that every sleeper
    /// advances, this counts all concurrent processing time, not only the
    /// placement's own wait.
    pub admission_timeout_ms: Option<u64>,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 5,
            concurrency_limit: 5,
            time_per_weight_unit_ms: 100,
            rebalance_pass_delay_ms: 10,
            placement_retry_delay_ms: 10,
            admission_timeout_ms: None,
        }
    }
}

impl BalancerConfig {
    /// Sets the queue capacity threshold.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the per-node concurrency limit.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Sets the processing time per weight unit.
    pub fn with_time_per_weight_unit(mut self, unit: Duration) -> Self {
        self.time_per_weight_unit_ms = unit.as_millis() as u64;
        self
    }

    /// Sets the delay between rebalancing passes.
    pub fn with_rebalance_pass_delay(mut self, delay: Duration) -> Self {
        self.rebalance_pass_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the placement retry delay.
    pub fn with_placement_retry_delay(mut self, delay: Duration) -> Self {
        self.placement_retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Bounds how long placement may wait for a free queue slot.
    pub fn with_admission_timeout(mut self, timeout: Duration) -> Self {
        self.admission_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn time_per_weight_unit(&self) -> Duration {
        Duration::from_millis(self.time_per_weight_unit_ms)
    }

    pub fn rebalance_pass_delay(&self) -> Duration {
        Duration::from_millis(self.rebalance_pass_delay_ms)
    }

    pub fn placement_retry_delay(&self) -> Duration {
        Duration::from_millis(self.placement_retry_delay_ms)
    }

    pub fn admission_timeout(&self) -> Option<Duration> {
        self.admission_timeout_ms.map(Duration::from_millis)
    }

    /// Simulated processing time for a task of the given weight.
    pub fn processing_time(&self, weight: u32) -> Duration {
        Duration::from_millis(self.time_per_weight_unit_ms.saturating_mul(weight as u64))
    }

    /// Rejects settings that would deadlock the cluster.
    pub fn validate(&self) -> Result<(), BalancerError> {
        if self.queue_capacity == 0 {
            return Err(BalancerError::config("queue_capacity must be at least 1"));
        }
        if self.concurrency_limit == 0 {
            return Err(BalancerError::config("concurrency_limit must be at least 1"));
        }
        Ok(())
    }

    /// Parses and validates a JSON config. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, BalancerError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| BalancerError::config(format!("invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BalancerError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| BalancerError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}
