//! Gradient Load Balancer - placement and neighbor-to-neighbor migration.
//!
//! The balancing signal is a node's *queue length*: only work that has not
//! started can move, and historical `total_load` is never touched.
//!
//! # Rebalancing pass
//!
//! ```text
//!   average = mean(queue_length)
//!   for node in id order:
//!       gradient = queue_length(node) - average
//!       if gradient > 0:
//!           target = neighbor with the shortest queue among those
//!                    below average and at least 2 shorter than node
//!           move head(node) -> tail(target)      (at most once per pass)
//! ```
//!
//! Passes repeat until a pass moves nothing or no node has pending work.
//! Every migration lowers `Σ queue_length²` by at least 2, so the loop
//! terminates for any finite distribution.

use crate::cluster::Cluster;
use crate::error::BalancerError;
use crate::topology::HypercubeTopology;
use crate::worker_node::WorkerNode;

use hypercube_env::{poll_until, ClusterContext, EnvError, NodeId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Placement attempts between "cluster saturated" warnings.
const SATURATION_WARN_INTERVAL: u64 = 100;

/// Outcome of one `balance_load` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// Passes executed, including the final zero-migration pass
    pub passes: usize,

    /// Tasks moved between neighbors
    pub migrations: usize,
}

impl std::ops::AddAssign for BalanceReport {
    fn add_assign(&mut self, other: Self) {
        self.passes += other.passes;
        self.migrations += other.migrations;
    }
}

/// Assigns tasks to the least-loaded node and pushes queued work down the
/// queue-length gradient towards hypercube neighbors.
pub struct GradientLoadBalancer<Ctx: ClusterContext> {
    cluster: Arc<Cluster<Ctx>>,
    topology: HypercubeTopology,
}

impl<Ctx: ClusterContext> GradientLoadBalancer<Ctx> {
    /// Creates a balancer over `cluster`. `dimensions` must match the cluster.
    pub fn new(cluster: Arc<Cluster<Ctx>>, dimensions: u32) -> Result<Self, BalancerError> {
        if dimensions != cluster.dimensions() {
            return Err(BalancerError::DimensionMismatch {
                cluster: cluster.dimensions(),
                balancer: dimensions,
            });
        }
        let topology = HypercubeTopology::new(dimensions)?;

        Ok(Self { cluster, topology })
    }

    pub fn cluster(&self) -> &Arc<Cluster<Ctx>> {
        &self.cluster
    }

    pub fn topology(&self) -> &HypercubeTopology {
        &self.topology
    }

    /// The `D` hypercube neighbors of a node.
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.topology.neighbors(id)
    }

    /// Node with the shortest queue; ties go to the lowest id.
    fn least_loaded(&self) -> Option<&WorkerNode<Ctx>> {
        // min_by_key keeps the first of equal minima, i.e. the lowest id
        self.cluster
            .nodes()
            .iter()
            .map(|n| n.as_ref())
            .min_by_key(|n| n.queue_length())
    }

    /// Places a task on the least-loaded node and returns that node's id.
    ///
    /// If even the least-loaded node is full, waits `placement_retry_delay`
    /// and rescans. The wait is unbounded unless `admission_timeout` is set,
    /// in which case `AdmissionTimeout` is returned and the task is not queued.
    pub async fn add_task(&self, weight: u32) -> Result<NodeId, BalancerError> {
        if weight == 0 {
            return Err(BalancerError::InvalidWeight(weight));
        }

        let config = self.cluster.config();
        let mut saturated_attempts = 0u64;

        let placed = poll_until(
            self.cluster.context().as_ref(),
            config.placement_retry_delay(),
            config.admission_timeout(),
            || {
                let node = self.least_loaded()?;
                if node.is_queue_full() {
                    saturated_attempts += 1;
                    if saturated_attempts % SATURATION_WARN_INTERVAL == 0 {
                        warn!(weight, attempts = saturated_attempts, "every queue is full, placement still waiting");
                    }
                    return None;
                }
                node.add_task(weight);
                Some(node.id())
            },
        )
        .await;

        match placed {
            Ok(id) => {
                debug!(node = %id, weight, "task placed");
                Ok(id)
            }
            Err(EnvError::Timeout(ms)) => {
                warn!(weight, timeout_ms = ms, "task rejected: admission timed out");
                Err(BalancerError::AdmissionTimeout(ms))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn average_queue_length(&self) -> f64 {
        let nodes = self.cluster.nodes();
        let pending: usize = nodes.iter().map(|n| n.queue_length()).sum();
        pending as f64 / nodes.len() as f64
    }

    /// One pass over all nodes in id order; returns the number of migrations.
    fn balance_pass(&self) -> usize {
        let average = self.average_queue_length();
        let mut migrations = 0;

        for node in self.cluster.nodes() {
            let load = node.queue_length();
            let gradient = load as f64 - average;
            if gradient <= 0.0 {
                continue;
            }

            // Qualifying neighbors sit below average, and far enough below
            // this node that moving one task does not just swap the two lengths.
            let target = self
                .neighbors(node.id())
                .iter()
                .filter_map(|&id| self.cluster.node(id).ok())
                .map(|n| (n.queue_length(), n))
                .filter(|&(len, _)| (len as f64) < average && len + 2 <= load)
                .min_by_key(|&(len, _)| len);

            let Some((_, target)) = target else {
                continue;
            };

            if let Some(weight) = node.take_pending() {
                target.add_task(weight);
                migrations += 1;
                debug!(
                    from = %node.id(),
                    to = %target.id(),
                    weight,
                    gradient,
                    "task migrated"
                );
            }
        }

        migrations
    }

    /// Repeats balancing passes until a pass moves nothing or every queue is
    /// empty, pausing `rebalance_pass_delay` between passes.
    pub async fn balance_load(&self) -> BalanceReport {
        let mut report = BalanceReport::default();
        let pass_delay = self.cluster.config().rebalance_pass_delay();

        while self.cluster.nodes().iter().any(|n| n.has_pending()) {
            report.passes += 1;
            let moved = self.balance_pass();
            report.migrations += moved;

            if moved == 0 {
                break;
            }
            self.cluster.context().sleep(pass_delay).await;
        }

        info!(
            passes = report.passes,
            migrations = report.migrations,
            pending = self.cluster.pending_tasks(),
            "load balancing settled"
        );
        report
    }
}
