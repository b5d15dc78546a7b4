//! Wait-until-condition polling at a bounded interval.

use crate::context::ClusterContext;
use crate::error::EnvError;
use std::time::Duration;

/// Repeatedly evaluates `attempt` until it yields a value, sleeping
/// `interval` through the context between attempts.
///
/// With `deadline = None` the loop is unbounded and relies on some other task
/// eventually making the condition true. With `Some(limit)` it gives up once
/// `limit` has elapsed on the context clock and returns `EnvError::Timeout`.
/// The first attempt always runs, even with a zero deadline.
pub async fn poll_until<C, T, F>(
    ctx: &C,
    interval: Duration,
    deadline: Option<Duration>,
    mut attempt: F,
) -> Result<T, EnvError>
where
    C: ClusterContext + ?Sized,
    F: FnMut() -> Option<T>,
{
    let started = ctx.now();
    loop {
        if let Some(value) = attempt() {
            return Ok(value);
        }
        if let Some(limit) = deadline {
            if ctx.now().saturating_sub(started) >= limit {
                return Err(EnvError::timeout(limit));
            }
        }
        ctx.sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokioContext;

    #[tokio::test(start_paused = true)]
    async fn test_poll_returns_first_success() {
        let ctx = TokioContext::new();
        let mut calls = 0;
        let value = poll_until(&ctx, Duration::from_millis(10), None, || {
            calls += 1;
            (calls == 3).then_some(calls)
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert!(ctx.now() >= Duration::from_millis(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_times_out() {
        let ctx = TokioContext::new();
        let result: Result<(), _> = poll_until(
            &ctx,
            Duration::from_millis(10),
            Some(Duration::from_millis(35)),
            || None,
        )
        .await;

        assert!(matches!(result, Err(EnvError::Timeout(35))));
    }
}
