//! Hypercube Deterministic Simulation Harness
//!
//! Runs the gradient load balancer against seeded workloads on a virtual
//! clock and compares every run with the non-distributed baseline (all work
//! on node 0).
//!
//! # Core Principle
//!
//! All sources of non-determinism are controlled:
//! - **Time**: `SimContext` advances a virtual clock on every sleep, so task
//!   processing costs no wall time
//! - **Workload**: task weights come from a `ChaCha8Rng` derived from a
//!   single 64-bit seed
//!
//! # Usage
//!
//! ```ignore
//! use hypercube_sim::{ScenarioRunner, ScenarioId};
//!
//! let runner = ScenarioRunner::new(42, 3).with_task_count(128);
//! let result = runner.run(ScenarioId::Hotspot).await?;
//! assert!(result.passed);
//! ```

mod context;
mod error;
pub mod runner;
pub mod scenarios;
pub mod workload;

pub use context::SimContext;
pub use error::SimError;
pub use runner::{RunMetrics, ScenarioResult, ScenarioRunner};
pub use scenarios::{Injection, ScenarioId};
pub use workload::{WeightDistribution, WorkloadGenerator};
