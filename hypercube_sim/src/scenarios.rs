//! Load-balancing scenarios.

use crate::error::SimError;
use crate::workload::WeightDistribution;
use serde::{Deserialize, Serialize};

/// How a scenario's tasks enter the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    /// Through `GradientLoadBalancer::add_task` (least-loaded placement)
    Placement,

    /// Straight onto node 0's queue, bypassing placement, then rebalanced
    Hotspot,
}

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// Uniform weights submitted through placement
    Uniform,

    /// Pareto weights submitted through placement
    HeavyTail,

    /// Every task dumped on node 0; only migration can spread it
    Hotspot,

    /// Four times the task count, far beyond total queue capacity
    Burst,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Uniform,
            ScenarioId::HeavyTail,
            ScenarioId::Hotspot,
            ScenarioId::Burst,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Uniform => "uniform",
            ScenarioId::HeavyTail => "heavy_tail",
            ScenarioId::Hotspot => "hotspot",
            ScenarioId::Burst => "burst",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Uniform => "Uniform task weights, least-loaded placement with rebalancing",
            ScenarioId::HeavyTail => "Pareto task weights, a few heavy tasks dominate total load",
            ScenarioId::Hotspot => "All tasks queued on node 0, gradient migration spreads them",
            ScenarioId::Burst => "4x task count, placement backpressure while nodes drain",
        }
    }

    pub fn distribution(&self) -> WeightDistribution {
        match self {
            ScenarioId::HeavyTail => WeightDistribution::HeavyTail,
            _ => WeightDistribution::Uniform,
        }
    }

    pub fn injection(&self) -> Injection {
        match self {
            ScenarioId::Hotspot => Injection::Hotspot,
            _ => Injection::Placement,
        }
    }

    /// Number of tasks to generate for a base task count.
    pub fn task_count(&self, base: usize) -> usize {
        match self {
            ScenarioId::Burst => base.saturating_mul(4),
            _ => base,
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" => Ok(ScenarioId::Uniform),
            "heavy_tail" | "heavytail" => Ok(ScenarioId::HeavyTail),
            "hotspot" | "hot_spot" => Ok(ScenarioId::Hotspot),
            "burst" => Ok(ScenarioId::Burst),
            _ => Err(SimError::UnknownScenario(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>().unwrap(), scenario);
            assert_eq!(scenario.to_string(), scenario.name());
        }
    }

    #[test]
    fn test_unknown_scenario() {
        assert!(matches!(
            "split_brain".parse::<ScenarioId>(),
            Err(SimError::UnknownScenario(_))
        ));
    }

    #[test]
    fn test_only_hotspot_bypasses_placement() {
        for scenario in ScenarioId::all() {
            assert!(!scenario.description().is_empty());
            assert_eq!(
                scenario.injection() == Injection::Hotspot,
                scenario == ScenarioId::Hotspot
            );
        }
    }

    #[test]
    fn test_burst_multiplies_tasks() {
        assert_eq!(ScenarioId::Burst.task_count(10), 40);
        assert_eq!(ScenarioId::Uniform.task_count(10), 10);
    }
}
