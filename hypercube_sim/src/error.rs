//! Error types for the simulation harness.

use hypercube_core::BalancerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Invalid workload: {0}")]
    InvalidWorkload(String),

    #[error(transparent)]
    Balancer(#[from] BalancerError),

    /// A spawned simulation task panicked or was cancelled
    #[error("Runtime error: {0}")]
    Runtime(String),
}
