//! Hypercube topology for a cluster of `2^D` worker nodes.
//!
//! Node `i` and node `j` are adjacent iff `i XOR j` is a power of two below
//! `2^D`, i.e. their ids differ in exactly one bit. Every node has exactly
//! `D` neighbors and the relation is symmetric.

use crate::error::BalancerError;
use hypercube_env::NodeId;

/// Largest supported dimension count (65 536 nodes).
pub const MAX_DIMENSIONS: u32 = 16;

/// Number of nodes in a hypercube of the given dimension.
pub fn node_count(dimensions: u32) -> Result<usize, BalancerError> {
    if dimensions > MAX_DIMENSIONS {
        return Err(BalancerError::InvalidDimensions {
            requested: dimensions,
            max: MAX_DIMENSIONS,
        });
    }
    Ok(1usize << dimensions)
}

/// Neighbors of `id`, one per dimension, in ascending dimension order.
pub fn neighbors_of(id: NodeId, dimensions: u32) -> Vec<NodeId> {
    (0..dimensions).map(|d| id.flip(d)).collect()
}

/// Precomputed adjacency for a hypercube.
#[derive(Debug, Clone)]
pub struct HypercubeTopology {
    dimensions: u32,

    /// Adjacency list: node index -> neighbors in dimension order
    adjacency: Vec<Vec<NodeId>>,
}

impl HypercubeTopology {
    /// Builds the adjacency table for a `dimensions`-cube.
    pub fn new(dimensions: u32) -> Result<Self, BalancerError> {
        let count = node_count(dimensions)?;
        let adjacency = (0..count)
            .map(|i| neighbors_of(NodeId(i), dimensions))
            .collect();

        Ok(Self {
            dimensions,
            adjacency,
        })
    }

    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns the neighbors of a node (empty for out-of-range ids).
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.adjacency
            .get(id.index())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// True when `a` and `b` are both in range and differ in exactly one bit.
    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        a.index() < self.node_count()
            && b.index() < self.node_count()
            && a.hamming_distance(b) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_topology() {
        let topology = HypercubeTopology::new(2).unwrap();

        assert_eq!(topology.node_count(), 4);
        assert_eq!(topology.neighbors(NodeId(0)), &[NodeId(1), NodeId(2)]);
        assert_eq!(topology.neighbors(NodeId(3)), &[NodeId(2), NodeId(1)]);

        // Diagonal corners are not adjacent
        assert!(!topology.are_adjacent(NodeId(0), NodeId(3)));
        assert!(topology.are_adjacent(NodeId(1), NodeId(3)));
    }

    #[test]
    fn test_zero_dimensions_is_single_isolated_node() {
        let topology = HypercubeTopology::new(0).unwrap();
        assert_eq!(topology.node_count(), 1);
        assert!(topology.neighbors(NodeId(0)).is_empty());
    }

    #[test]
    fn test_out_of_range_has_no_neighbors() {
        let topology = HypercubeTopology::new(3).unwrap();
        assert!(topology.neighbors(NodeId(8)).is_empty());
        assert!(!topology.are_adjacent(NodeId(0), NodeId(8)));
    }

    #[test]
    fn test_rejects_oversized_cube() {
        assert!(matches!(
            HypercubeTopology::new(MAX_DIMENSIONS + 1),
            Err(BalancerError::InvalidDimensions { .. })
        ));
    }
}
