//! Counting limiter bounding concurrent in-flight operations.

use crate::error::EnvError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// At most `capacity` holders at once; further callers suspend until a
/// permit is released.
///
/// Thin wrapper over `tokio::sync::Semaphore` that remembers its capacity so
/// callers can observe how many slots are in use.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    /// Creates a limiter with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free slot.
    pub async fn acquire(&self) -> Result<LimiterPermit, EnvError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| EnvError::LimiterClosed)?;
        Ok(LimiterPermit { _permit: permit })
    }

    /// Number of slots currently held.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limiter_counts_holders() {
        let limiter = ConcurrencyLimiter::new(2);
        assert_eq!(limiter.in_flight(), 0);

        let a = limiter.acquire().await.unwrap();
        let b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.in_flight(), 2);

        drop(a);
        assert_eq!(limiter.in_flight(), 1);
        drop(b);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_blocks_when_exhausted() {
        let limiter = ConcurrencyLimiter::new(1);
        let held = limiter.acquire().await.unwrap();

        let waiting = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            limiter.acquire(),
        )
        .await;
        assert!(waiting.is_err(), "second acquire must wait for a slot");

        drop(held);
        assert!(limiter.acquire().await.is_ok());
    }
}
