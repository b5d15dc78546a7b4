//! Worker node: a FIFO queue of pending task weights plus processing counters.

use crate::config::BalancerConfig;
use crate::stats::NodeStats;

use hypercube_env::{ClusterContext, ConcurrencyLimiter, EnvError, NodeId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// One node of the hypercube.
///
/// The queue holds only work that has not started. A task leaves the queue
/// either by being processed here or by being migrated to a neighbor; only
/// processing touches `tasks_processed` / `total_load`.
pub struct WorkerNode<Ctx: ClusterContext> {
    id: NodeId,

    /// Environment context (clock for synthetic processing delays)
    context: Arc<Ctx>,

    /// Pending task weights, head = next to process
    queue: Mutex<VecDeque<u32>>,

    /// Completed task count
    tasks_processed: AtomicU64,

    /// Sum of completed task weights
    total_load: AtomicU64,

    /// Caps in-flight `process_one_task` calls
    limiter: ConcurrencyLimiter,

    config: BalancerConfig,
}

impl<Ctx: ClusterContext> WorkerNode<Ctx> {
    /// Creates an idle node.
    pub fn new(id: NodeId, context: Arc<Ctx>, config: &BalancerConfig) -> Self {
        Self {
            id,
            context,
            queue: Mutex::new(VecDeque::new()),
            tasks_processed: AtomicU64::new(0),
            total_load: AtomicU64::new(0),
            limiter: ConcurrencyLimiter::new(config.concurrency_limit),
            config: config.clone(),
        }
    }

    // Poisoned locks are recovered
    fn queue(&self) -> MutexGuard<'_, VecDeque<u32>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Appends a task to the tail of the queue. Capacity is not enforced here.
    pub fn add_task(&self, weight: u32) {
        self.queue().push_back(weight);
    }

    /// Removes the head of the queue without processing it.
    pub fn take_pending(&self) -> Option<u32> {
        self.queue().pop_front()
    }

    pub fn queue_length(&self) -> usize {
        self.queue().len()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue().is_empty()
    }

    /// True once the queue holds `queue_capacity` tasks or more.
    pub fn is_queue_full(&self) -> bool {
        self.queue_length() >= self.config.queue_capacity
    }

    /// Snapshot of pending weights in processing order.
    pub fn pending_weights(&self) -> Vec<u32> {
        self.queue().iter().copied().collect()
    }

    pub fn tasks_processed(&self) -> u64 {
        self.tasks_processed.load(Ordering::Acquire)
    }

    pub fn total_load(&self) -> u64 {
        self.total_load.load(Ordering::Acquire)
    }

    /// Number of processing operations currently holding a limiter slot.
    pub fn in_flight(&self) -> usize {
        self.limiter.in_flight()
    }

    pub fn stats(&self) -> NodeStats {
        NodeStats {
            id: self.id,
            tasks_processed: self.tasks_processed(),
            total_load: self.total_load(),
            queue_length: self.queue_length(),
        }
    }

    /// Processes the task at the head of the queue.
    ///
    /// Waits for a limiter slot, dequeues one task and sleeps for
    /// `weight × time_per_weight_unit` before counting it. Returns
    /// `Ok(None)` when the queue was empty by the time the slot was granted.
    pub async fn process_one_task(&self) -> Result<Option<u32>, EnvError> {
        let _slot = self.limiter.acquire().await?;

        let Some(weight) = self.take_pending() else {
            return Ok(None);
        };

        self.context.sleep(self.config.processing_time(weight)).await;

        self.tasks_processed.fetch_add(1, Ordering::AcqRel);
        self.total_load.fetch_add(weight as u64, Ordering::AcqRel);
        trace!(node = %self.id, weight, "task processed");

        Ok(Some(weight))
    }

    /// Processes tasks until the queue is observed empty. Returns the sum of
    /// weights this call processed.
    pub async fn drain(&self) -> Result<u64, EnvError> {
        let mut processed = 0u64;
        while let Some(weight) = self.process_one_task().await? {
            processed += weight as u64;
        }
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypercube_env::TokioContext;
    use std::time::Duration;

    fn node(config: &BalancerConfig) -> Arc<WorkerNode<TokioContext>> {
        Arc::new(WorkerNode::new(NodeId(0), TokioContext::shared(), config))
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_processes_queue_in_order() {
        let node = node(&BalancerConfig::default());
        for weight in [2, 3, 1] {
            node.add_task(weight);
        }

        assert_eq!(node.pending_weights(), vec![2, 3, 1]);
        assert_eq!(node.tasks_processed(), 0, "enqueue must not touch counters");

        assert_eq!(node.process_one_task().await.unwrap(), Some(2));
        assert_eq!(node.pending_weights(), vec![3, 1]);

        assert_eq!(node.drain().await.unwrap(), 4);
        assert_eq!(node.tasks_processed(), 3);
        assert_eq!(node.total_load(), 6);
        assert_eq!(node.queue_length(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_queue_is_noop() {
        let node = node(&BalancerConfig::default());
        assert_eq!(node.process_one_task().await.unwrap(), None);
        assert_eq!(node.tasks_processed(), 0);
        assert_eq!(node.total_load(), 0);
    }

    #[test]
    fn test_queue_full_threshold() {
        let node = node(&BalancerConfig::default().with_queue_capacity(2));
        assert!(!node.is_queue_full());
        node.add_task(1);
        assert!(!node.is_queue_full());
        node.add_task(1);
        assert!(node.is_queue_full());

        // Capacity is advisory; the node still accepts work
        node.add_task(1);
        assert_eq!(node.queue_length(), 3);
    }

    #[test]
    fn test_take_pending_leaves_counters() {
        let node = node(&BalancerConfig::default());
        node.add_task(4);
        assert_eq!(node.take_pending(), Some(4));
        assert_eq!(node.take_pending(), None);
        assert_eq!(node.total_load(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_processing_takes_weight_scaled_time() {
        let config = BalancerConfig::default();
        let ctx = TokioContext::shared();
        let node = WorkerNode::new(NodeId(1), ctx.clone(), &config);
        node.add_task(3);

        let before = tokio::time::Instant::now();
        node.process_one_task().await.unwrap();
        assert!(before.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_capped() {
        let config = BalancerConfig::default().with_concurrency_limit(2);
        let node = node(&config);
        for _ in 0..6 {
            node.add_task(1);
        }

        let mut handles = Vec::new();
        for _ in 0..6 {
            let node = Arc::clone(&node);
            handles.push(tokio::spawn(async move { node.process_one_task().await }));
        }

        // Let every caller reach the limiter or the processing sleep
        tokio::task::yield_now().await;
        for _ in 0..10 {
            assert!(node.in_flight() <= 2);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), Some(1));
        }
        assert_eq!(node.tasks_processed(), 6);
        assert_eq!(node.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_never_share_a_task() {
        let node = node(&BalancerConfig::default());
        for weight in 1..=20 {
            node.add_task(weight);
        }

        let mut handles = Vec::new();
        for _ in 0..8 {
            let node = Arc::clone(&node);
            handles.push(tokio::spawn(async move { node.drain().await }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap().unwrap();
        }
        assert_eq!(total, (1..=20).sum::<u64>());
        assert_eq!(node.tasks_processed(), 20);
    }
}
