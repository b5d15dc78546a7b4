//! Core environment context trait for cluster components.

use async_trait::async_trait;
use std::time::Duration;

/// The central interface for environment interaction.
///
/// Worker nodes and the balancer never touch the clock directly. Every
/// synthetic delay (task processing, placement retry, pass spacing) goes
/// through this trait so the same code runs against real time or a virtual
/// clock.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`
/// - **Simulation**: `SimContext` (in `hypercube_sim`) - virtual clock that
///   advances on `sleep` and yields to the scheduler
#[async_trait]
pub trait ClusterContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Used for deadlines (admission timeout) and duration measurements.
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
