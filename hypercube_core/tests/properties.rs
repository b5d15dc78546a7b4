//! Property tests for topology, placement, rebalancing and processing.

use hypercube_core::{BalancerConfig, Cluster, GradientLoadBalancer, HypercubeTopology};
use hypercube_env::{NodeId, TokioContext};
use proptest::prelude::*;
use std::future::Future;
use std::sync::Arc;

fn run<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("test runtime")
        .block_on(future)
}

fn setup(dimensions: u32, config: BalancerConfig) -> (Arc<Cluster<TokioContext>>, GradientLoadBalancer<TokioContext>) {
    let cluster = Arc::new(Cluster::with_config(dimensions, TokioContext::shared(), config).unwrap());
    let balancer = GradientLoadBalancer::new(Arc::clone(&cluster), dimensions).unwrap();
    (cluster, balancer)
}

/// Per-node queues for a cube of 0..=4 dimensions.
fn distribution() -> impl Strategy<Value = (u32, Vec<Vec<u32>>)> {
    (0u32..=4).prop_flat_map(|d| {
        let nodes = 1usize << d;
        (
            Just(d),
            prop::collection::vec(prop::collection::vec(1u32..=9, 0..12), nodes),
        )
    })
}

fn sorted_pending(cluster: &Cluster<TokioContext>) -> Vec<u32> {
    let mut all: Vec<u32> = cluster
        .nodes()
        .iter()
        .flat_map(|n| n.pending_weights())
        .collect();
    all.sort_unstable();
    all
}

proptest! {
    #[test]
    fn cluster_has_one_node_per_coordinate(d in 0u32..=10) {
        let cluster = Cluster::new(d, TokioContext::shared()).unwrap();
        prop_assert_eq!(cluster.node_count(), 1usize << d);
        for (i, node) in cluster.nodes().iter().enumerate() {
            prop_assert_eq!(node.id(), NodeId(i));
        }
    }

    #[test]
    fn adjacency_is_symmetric_with_d_neighbors(d in 0u32..=8) {
        let topology = HypercubeTopology::new(d).unwrap();
        for i in 0..topology.node_count() {
            let a = NodeId(i);
            let neighbors = topology.neighbors(a);
            prop_assert_eq!(neighbors.len(), d as usize);

            for &b in neighbors {
                prop_assert!(b.index() < topology.node_count());
                prop_assert_eq!(a.hamming_distance(b), 1);
                prop_assert!(topology.neighbors(b).contains(&a));
                prop_assert!(topology.are_adjacent(a, b));
            }
        }
    }

    #[test]
    fn rebalancing_conserves_pending_work((d, queues) in distribution()) {
        let (cluster, balancer) = setup(d, BalancerConfig::default());
        for (node, weights) in cluster.nodes().iter().zip(&queues) {
            for &w in weights {
                node.add_task(w);
            }
        }
        let before = sorted_pending(&cluster);
        let squares_before: usize = cluster.nodes().iter().map(|n| n.queue_length().pow(2)).sum();

        let report = run(balancer.balance_load());

        prop_assert_eq!(sorted_pending(&cluster), before);
        prop_assert!(cluster.nodes().iter().all(|n| n.tasks_processed() == 0 && n.total_load() == 0));

        // Each migration lowers the sum of squared queue lengths by at least 2
        let squares_after: usize = cluster.nodes().iter().map(|n| n.queue_length().pow(2)).sum();
        prop_assert!(squares_after + 2 * report.migrations <= squares_before);
        // Every pass but the last moved something
        prop_assert!(report.passes <= report.migrations + 1);
    }

    #[test]
    fn placement_targets_a_shortest_queue(
        d in 0u32..=3,
        weights in prop::collection::vec(1u32..=9, 1..40),
    ) {
        let config = BalancerConfig::default().with_queue_capacity(usize::MAX);
        let (cluster, balancer) = setup(d, config);

        for &w in &weights {
            let lengths: Vec<usize> = cluster.nodes().iter().map(|n| n.queue_length()).collect();
            let shortest = *lengths.iter().min().unwrap();
            let expected = lengths.iter().position(|&l| l == shortest).unwrap();

            let placed = run(balancer.add_task(w)).unwrap();
            prop_assert_eq!(placed, NodeId(expected));
        }
        prop_assert_eq!(cluster.pending_tasks(), weights.len());
    }

    #[test]
    fn processing_drains_everything((d, queues) in distribution()) {
        let (cluster, balancer) = setup(d, BalancerConfig::default());
        let mut submitted = 0u64;
        for (node, weights) in cluster.nodes().iter().zip(&queues) {
            for &w in weights {
                node.add_task(w);
                submitted += w as u64;
            }
        }

        let processed = run(async {
            balancer.balance_load().await;
            cluster.process_all_tasks().await
        }).unwrap();

        prop_assert_eq!(processed, submitted);
        prop_assert_eq!(cluster.total_load(), submitted);
        prop_assert_eq!(cluster.pending_tasks(), 0);
        let tasks: u64 = cluster.nodes().iter().map(|n| n.tasks_processed()).sum();
        prop_assert_eq!(tasks, queues.iter().map(|q| q.len() as u64).sum::<u64>());
    }
}

#[test]
fn saturated_cluster_never_drops_tasks() {
    let config = BalancerConfig::default().with_queue_capacity(2);
    let (cluster, balancer) = setup(2, config);
    let balancer = Arc::new(balancer);
    let weights: Vec<u32> = (1..=30).map(|i| i % 5 + 1).collect();
    let submitted: u64 = weights.iter().map(|&w| w as u64).sum();

    let processed = run(async {
        let submitter = {
            let balancer = Arc::clone(&balancer);
            let weights = weights.clone();
            tokio::spawn(async move {
                for w in weights {
                    balancer.add_task(w).await?;
                }
                Ok::<_, hypercube_core::BalancerError>(())
            })
        };

        let mut processed = 0;
        loop {
            let finished = submitter.is_finished();
            processed += cluster.process_all_tasks().await?;
            if finished && cluster.pending_tasks() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        submitter.await.expect("submitter panicked")?;
        Ok::<_, hypercube_core::BalancerError>(processed)
    })
    .unwrap();

    assert_eq!(processed, submitted);
    assert_eq!(cluster.total_load(), submitted);
}
