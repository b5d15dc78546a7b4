//! Load statistics reported by nodes and clusters.

use hypercube_env::NodeId;
use serde::{Deserialize, Serialize};

/// Point-in-time counters of one worker node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    pub id: NodeId,
    pub tasks_processed: u64,
    pub total_load: u64,
    pub queue_length: usize,
}

impl std::fmt::Display for NodeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WorkerNode {}: TasksProcessed = {}, TotalLoad = {}",
            self.id, self.tasks_processed, self.total_load
        )
    }
}

/// Cluster-wide summary. Nodes are sampled one after another, so the
/// snapshot is not isolated from concurrent processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterStats {
    pub dimensions: u32,
    pub node_count: usize,
    pub average_load: f64,
    pub deviation_percentage: f64,
    pub nodes: Vec<NodeStats>,
}

/// Arithmetic mean. Zero for an empty slice.
pub fn average(loads: &[u64]) -> f64 {
    if loads.is_empty() {
        return 0.0;
    }
    loads.iter().map(|&l| l as f64).sum::<f64>() / loads.len() as f64
}

/// Mean absolute deviation from the average, as a percentage of the average.
///
/// `(Σ|load_i − avg| / (N × avg)) × 100`, defined as 0 when the average is 0
/// (every node idle is perfect balance).
pub fn deviation_percentage(loads: &[u64]) -> f64 {
    let avg = average(loads);
    if avg == 0.0 {
        return 0.0;
    }

    let total_deviation: f64 = loads.iter().map(|&l| (l as f64 - avg).abs()).sum();
    total_deviation / (loads.len() as f64 * avg) * 100.0
}
