//! Scenario runner - drives the balancer against the non-distributed baseline.

use crate::context::SimContext;
use crate::error::SimError;
use crate::scenarios::{Injection, ScenarioId};
use crate::workload::WorkloadGenerator;

use hypercube_core::{BalanceReport, BalancerConfig, BalancerError, Cluster, GradientLoadBalancer};
use hypercube_env::{ClusterContext, NodeId};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tolerance when comparing deviation percentages.
const DEVIATION_EPSILON: f64 = 1e-9;

/// Processed-load summary of one cluster after a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMetrics {
    pub total_load: u64,
    pub tasks_processed: u64,
    pub average_load: f64,
    pub deviation_percentage: f64,

    /// Largest `total_load` of any single node
    pub max_node_load: u64,
}

impl RunMetrics {
    pub fn from_cluster<C: ClusterContext>(cluster: &Cluster<C>) -> Self {
        let nodes = cluster.node_statistics();
        Self {
            total_load: cluster.total_load(),
            tasks_processed: nodes.iter().map(|n| n.tasks_processed).sum(),
            average_load: cluster.average_load(),
            deviation_percentage: cluster.load_deviation_percentage(),
            max_node_load: nodes.iter().map(|n| n.total_load).max().unwrap_or(0),
        }
    }
}

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    pub dimensions: u32,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Sum of generated task weights
    pub submitted_load: u64,

    /// Cluster driven by the gradient balancer
    pub distributed: RunMetrics,

    /// Same workload, every task on node 0
    pub baseline: RunMetrics,

    /// Balancing work accumulated over the distributed run
    pub balance: BalanceReport,

    /// Failure message if any
    pub failure_reason: Option<String>,
}

/// Runs load-balancing scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Hypercube dimension of every cluster built
    dimensions: u32,

    /// Base number of tasks per scenario
    task_count: usize,

    /// Upper bound on generated task weights
    max_weight: u32,

    config: BalancerConfig,

    /// Print per-node lines to stdout after each run
    print_statistics: bool,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64, dimensions: u32) -> Self {
        Self {
            seed,
            dimensions,
            task_count: 64,
            max_weight: 10,
            config: BalancerConfig::default(),
            print_statistics: false,
        }
    }

    /// Sets the base task count.
    pub fn with_task_count(mut self, count: usize) -> Self {
        self.task_count = count;
        self
    }

    /// Sets the largest task weight.
    pub fn with_max_weight(mut self, max_weight: u32) -> Self {
        self.max_weight = max_weight;
        self
    }

    /// Sets the balancer tunables.
    pub fn with_config(mut self, config: BalancerConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables the per-node statistics printout.
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.print_statistics = enabled;
        self
    }

    /// Runs a scenario on the virtual clock.
    pub async fn run(&self, scenario: ScenarioId) -> Result<ScenarioResult, SimError> {
        let seed = self.seed;
        self.run_with(scenario, || SimContext::shared(seed)).await
    }

    /// Runs a scenario with contexts from `make_context`; one context per
    /// cluster (distributed and baseline).
    pub async fn run_with<C, F>(&self, scenario: ScenarioId, make_context: F) -> Result<ScenarioResult, SimError>
    where
        C: ClusterContext,
        F: Fn() -> Arc<C>,
    {
        info!(
            "Starting scenario: {} (seed={}, dimensions={})",
            scenario.name(),
            self.seed,
            self.dimensions
        );

        // Workload seed is decoupled from the context seed
        let workload_seed = self.seed.wrapping_mul(0x9e3779b97f4a7c15);
        let mut generator = WorkloadGenerator::new(workload_seed, self.max_weight)?;
        let weights = generator.generate(scenario.task_count(self.task_count), scenario.distribution());
        let submitted_load: u64 = weights.iter().map(|&w| w as u64).sum();
        debug!(
            tasks = weights.len(),
            max_weight = generator.max_weight(),
            submitted_load,
            "workload generated"
        );

        // Distributed run
        let cluster = Arc::new(Cluster::with_config(
            self.dimensions,
            make_context(),
            self.config.clone(),
        )?);
        let balancer = Arc::new(GradientLoadBalancer::new(Arc::clone(&cluster), self.dimensions)?);

        let balance = match scenario.injection() {
            Injection::Hotspot => Self::run_hotspot(&balancer, &weights).await?,
            Injection::Placement => Self::run_placement(&balancer, weights.clone()).await?,
        };
        let distributed = RunMetrics::from_cluster(&cluster);
        let distributed_pending = cluster.pending_tasks();

        if self.print_statistics {
            cluster.print_statistics();
        }

        // Baseline run on a fresh cluster
        let baseline_cluster = Cluster::with_config(self.dimensions, make_context(), self.config.clone())?;
        baseline_cluster.simulate_without_distribution(&weights).await?;
        let baseline = RunMetrics::from_cluster(&baseline_cluster);

        if self.print_statistics {
            baseline_cluster.print_first_node_statistics();
        }

        let failure_reason = Self::check(submitted_load, distributed_pending, &distributed, &baseline);
        if let Some(reason) = &failure_reason {
            warn!(scenario = scenario.name(), seed = self.seed, "{}", reason);
        }

        info!(
            scenario = scenario.name(),
            migrations = balance.migrations,
            distributed_deviation = distributed.deviation_percentage,
            baseline_deviation = baseline.deviation_percentage,
            "scenario complete"
        );

        Ok(ScenarioResult {
            scenario,
            seed: self.seed,
            dimensions: self.dimensions,
            passed: failure_reason.is_none(),
            submitted_load,
            distributed,
            baseline,
            balance,
            failure_reason,
        })
    }

    /// All work lands on node 0, then migration alone spreads it before
    /// processing starts.
    async fn run_hotspot<C: ClusterContext>(
        balancer: &GradientLoadBalancer<C>,
        weights: &[u32],
    ) -> Result<BalanceReport, SimError> {
        let cluster = balancer.cluster();
        let hot = cluster.node(NodeId(0))?;
        for &weight in weights {
            hot.add_task(weight);
        }

        let report = balancer.balance_load().await;
        cluster.process_all_tasks().await?;
        Ok(report)
    }

    /// A submitter task places work while this task alternates balancing and
    /// processing, until the submitter is done and every queue is empty.
    async fn run_placement<C: ClusterContext>(
        balancer: &Arc<GradientLoadBalancer<C>>,
        weights: Vec<u32>,
    ) -> Result<BalanceReport, SimError> {
        let cluster = Arc::clone(balancer.cluster());
        let retry_delay = cluster.config().placement_retry_delay();

        let submitter = {
            let balancer = Arc::clone(balancer);
            tokio::spawn(async move {
                for weight in weights {
                    balancer.add_task(weight).await?;
                }
                Ok::<_, BalancerError>(())
            })
        };

        let mut report = BalanceReport::default();
        loop {
            let finished = submitter.is_finished();
            report += balancer.balance_load().await;
            cluster.process_all_tasks().await?;

            if finished && cluster.pending_tasks() == 0 {
                break;
            }
            cluster.context().sleep(retry_delay).await;
        }

        submitter
            .await
            .map_err(|e| SimError::Runtime(format!("submitter failed: {}", e)))??;
        Ok(report)
    }

    fn check(
        submitted_load: u64,
        distributed_pending: usize,
        distributed: &RunMetrics,
        baseline: &RunMetrics,
    ) -> Option<String> {
        if distributed.total_load != submitted_load {
            return Some(format!(
                "distributed run processed {} of {} load",
                distributed.total_load, submitted_load
            ));
        }
        if baseline.total_load != submitted_load {
            return Some(format!(
                "baseline run processed {} of {} load",
                baseline.total_load, submitted_load
            ));
        }
        if distributed_pending != 0 {
            return Some(format!("{} tasks left queued", distributed_pending));
        }
        if distributed.deviation_percentage > baseline.deviation_percentage + DEVIATION_EPSILON {
            return Some(format!(
                "distributed deviation {:.2}% exceeds baseline {:.2}%",
                distributed.deviation_percentage, baseline.deviation_percentage
            ));
        }
        None
    }
}
