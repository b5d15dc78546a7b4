//! Cluster - the fixed set of `2^D` worker nodes and its aggregate views.

use crate::config::BalancerConfig;
use crate::error::BalancerError;
use crate::stats::{self, ClusterStats, NodeStats};
use crate::topology;
use crate::worker_node::WorkerNode;

use hypercube_env::{ClusterContext, ConcurrencyLimiter, EnvError, NodeId};
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info};

/// A hypercube of worker nodes, indexed `0..2^D`.
///
/// Generic over the context so the same cluster runs on the real clock or
/// on a virtual one.
pub struct Cluster<Ctx: ClusterContext> {
    dimensions: u32,

    /// Environment context shared by every node
    context: Arc<Ctx>,

    /// Nodes by id; never resized
    nodes: Vec<Arc<WorkerNode<Ctx>>>,

    config: BalancerConfig,
}

fn lane_failed(err: JoinError) -> BalancerError {
    EnvError::context(format!("processing task failed: {}", err)).into()
}

impl<Ctx: ClusterContext> Cluster<Ctx> {
    /// Creates a cluster of `2^dimensions` idle nodes with default tunables.
    pub fn new(dimensions: u32, context: Arc<Ctx>) -> Result<Self, BalancerError> {
        Self::with_config(dimensions, context, BalancerConfig::default())
    }

    /// Creates a cluster with explicit tunables.
    pub fn with_config(
        dimensions: u32,
        context: Arc<Ctx>,
        config: BalancerConfig,
    ) -> Result<Self, BalancerError> {
        config.validate()?;
        let count = topology::node_count(dimensions)?;

        let nodes = (0..count)
            .map(|i| Arc::new(WorkerNode::new(NodeId(i), Arc::clone(&context), &config)))
            .collect();

        debug!(dimensions, nodes = count, "cluster created");

        Ok(Self {
            dimensions,
            context,
            nodes,
            config,
        })
    }

    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<Ctx> {
        &self.context
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> &[Arc<WorkerNode<Ctx>>] {
        &self.nodes
    }

    /// Looks up a node by id. Out-of-range ids are an error, never wrapped.
    pub fn node(&self, id: NodeId) -> Result<&WorkerNode<Ctx>, BalancerError> {
        self.nodes
            .get(id.index())
            .map(|node| node.as_ref())
            .ok_or(BalancerError::NodeOutOfRange {
                id,
                node_count: self.nodes.len(),
            })
    }

    fn total_loads(&self) -> Vec<u64> {
        self.nodes.iter().map(|n| n.total_load()).collect()
    }

    /// Mean processed load (`total_load`) across nodes.
    pub fn average_load(&self) -> f64 {
        stats::average(&self.total_loads())
    }

    /// Percentage deviation of processed load from the average; 0 when idle.
    pub fn load_deviation_percentage(&self) -> f64 {
        stats::deviation_percentage(&self.total_loads())
    }

    /// Tasks queued across the cluster and not yet started.
    pub fn pending_tasks(&self) -> usize {
        self.nodes.iter().map(|n| n.queue_length()).sum()
    }

    /// Sum of processed load across the cluster.
    pub fn total_load(&self) -> u64 {
        self.nodes.iter().map(|n| n.total_load()).sum()
    }

    /// Drains every node concurrently and returns the total weight processed.
    ///
    /// Each node gets `concurrency_limit` drain lanes, all still gated by the
    /// node's own limiter. Suspends until every lane has seen its queue empty.
    pub async fn process_all_tasks(&self) -> Result<u64, BalancerError> {
        let mut lanes = JoinSet::new();
        for node in &self.nodes {
            for _ in 0..self.config.concurrency_limit {
                let node = Arc::clone(node);
                lanes.spawn(async move { node.drain().await });
            }
        }

        let mut processed = 0u64;
        while let Some(joined) = lanes.join_next().await {
            processed += joined.map_err(lane_failed)??;
        }

        info!(
            processed,
            average_load = self.average_load(),
            deviation = self.load_deviation_percentage(),
            "all nodes drained"
        );
        Ok(processed)
    }

    /// Baseline without distribution: every task goes to node 0.
    ///
    /// At most `concurrency_limit` submit-and-process units are in flight;
    /// further submissions wait for a slot. Returns node 0's `total_load`
    /// once all of them have completed.
    pub async fn simulate_without_distribution(&self, weights: &[u32]) -> Result<u64, BalancerError> {
        let node = Arc::clone(&self.nodes[0]);
        let submissions = ConcurrencyLimiter::new(self.config.concurrency_limit);
        let mut in_flight = JoinSet::new();

        for &weight in weights {
            let slot = submissions.acquire().await?;
            let node = Arc::clone(&node);
            in_flight.spawn(async move {
                node.add_task(weight);
                let result = node.process_one_task().await;
                drop(slot);
                result
            });
        }

        while let Some(joined) = in_flight.join_next().await {
            joined.map_err(lane_failed)??;
        }

        debug!(tasks = weights.len(), total_load = node.total_load(), "baseline run complete");
        Ok(node.total_load())
    }

    /// Snapshot of every node's counters.
    pub fn node_statistics(&self) -> Vec<NodeStats> {
        self.nodes.iter().map(|n| n.stats()).collect()
    }

    /// Cluster-wide summary for structured output.
    pub fn statistics(&self) -> ClusterStats {
        let nodes = self.node_statistics();
        let loads: Vec<u64> = nodes.iter().map(|n| n.total_load).collect();

        ClusterStats {
            dimensions: self.dimensions,
            node_count: nodes.len(),
            average_load: stats::average(&loads),
            deviation_percentage: stats::deviation_percentage(&loads),
            nodes,
        }
    }

    /// Prints one line per node to stdout.
    pub fn print_statistics(&self) {
        for node in &self.nodes {
            println!("{}", node.stats());
        }
    }

    /// Prints node 0's line to stdout (the baseline node).
    pub fn print_first_node_statistics(&self) {
        println!("{}", self.nodes[0].stats());
    }
}
