//! Hypercube Core - gradient load balancing across a hypercube of workers
//!
//! A cluster of `2^D` worker nodes, each with a FIFO queue of pending task
//! weights, and a balancer that:
//! 1. **Places** each incoming task on the node with the shortest queue
//! 2. **Rebalances** queued work from above-average nodes to below-average
//!    hypercube neighbors, one task per overloaded node per pass
//! 3. Leaves **processing** to the cluster, which drains every node
//!    concurrently under a per-node concurrency limit
//!
//! ```ignore
//! use hypercube_core::{Cluster, GradientLoadBalancer};
//! use hypercube_env::TokioContext;
//!
//! let cluster = Arc::new(Cluster::new(3, TokioContext::shared())?);
//! let balancer = GradientLoadBalancer::new(cluster.clone(), 3)?;
//! for weight in [3, 1, 4, 1, 5] {
//!     balancer.add_task(weight).await?;
//! }
//! balancer.balance_load().await;
//! cluster.process_all_tasks().await?;
//! println!("deviation: {:.1}%", cluster.load_deviation_percentage());
//! ```

pub mod balancer;
pub mod cluster;
pub mod config;
pub mod error;
pub mod stats;
pub mod topology;
pub mod worker_node;

// Re-export key types for convenience
pub use balancer::{BalanceReport, GradientLoadBalancer};
pub use cluster::Cluster;
pub use config::BalancerConfig;
pub use error::BalancerError;
pub use stats::{ClusterStats, NodeStats};
pub use topology::{HypercubeTopology, MAX_DIMENSIONS};
pub use worker_node::WorkerNode;
