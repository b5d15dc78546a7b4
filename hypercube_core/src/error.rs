//! Error types for the balancing subsystem.

use hypercube_env::{EnvError, NodeId};
use thiserror::Error;

/// Errors returned by cluster and balancer operations.
#[derive(Debug, Error)]
pub enum BalancerError {
    /// Node lookup outside `0..2^D`
    #[error("Node {id} out of range for a cluster of {node_count} nodes")]
    NodeOutOfRange { id: NodeId, node_count: usize },

    /// Dimension count the cluster cannot be built with
    #[error("Invalid dimensions: {requested} (maximum {max})")]
    InvalidDimensions { requested: u32, max: u32 },

    /// Balancer built with a dimension count different from its cluster's
    #[error("Dimension mismatch: cluster has {cluster}, balancer was given {balancer}")]
    DimensionMismatch { cluster: u32, balancer: u32 },

    /// Task weights must be positive
    #[error("Invalid task weight: {0}")]
    InvalidWeight(u32),

    /// Configuration rejected by validation or parsing
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Placement waited longer than the configured admission timeout
    #[error("Admission timed out after {0}ms")]
    AdmissionTimeout(u64),

    /// Failure in the environment layer (limiter, runtime)
    #[error(transparent)]
    Env(#[from] EnvError),
}

impl BalancerError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
