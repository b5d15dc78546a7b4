//! Hypercube Environment Abstraction Layer
//!
//! This crate provides the abstraction allowing the balancer and its worker
//! nodes to run against **real time** (tokio) or a **virtual clock**
//! (simulation).
//!
//! # Core Concept
//!
//! Everything that waits goes through the environment:
//! - Time (`now()`, `sleep()`)
//! - Bounded concurrency (`ConcurrencyLimiter`)
//! - Retry loops (`poll_until`)
//!
//! # Example
//!
//! ```ignore
//! use hypercube_env::{ClusterContext, ConcurrencyLimiter};
//!
//! async fn process<Ctx: ClusterContext>(ctx: &Ctx, limiter: &ConcurrencyLimiter) {
//!     let _slot = limiter.acquire().await?;
//!     ctx.sleep(Duration::from_millis(300)).await;
//! }
//! ```

mod context;
mod error;
mod limiter;
mod poll;
mod tokio_impl;
mod types;

pub use context::ClusterContext;
pub use error::EnvError;
pub use limiter::{ConcurrencyLimiter, LimiterPermit};
pub use poll::poll_until;
pub use tokio_impl::TokioContext;
pub use types::NodeId;
