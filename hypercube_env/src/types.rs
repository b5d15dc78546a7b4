//! Common types for the hypercube environment abstraction.

use serde::{Deserialize, Serialize};

/// Identifier of a worker node.
///
/// The id doubles as the node's hypercube coordinate: bit `d` of the id is
/// the node's position along dimension `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Returns the raw index.
    pub fn index(&self) -> usize {
        self.0
    }

    /// Returns the node reached by flipping the bit for `dimension`.
    pub fn flip(&self, dimension: u32) -> NodeId {
        NodeId(self.0 ^ (1usize << dimension))
    }

    /// Number of coordinates in which two ids differ.
    pub fn hamming_distance(&self, other: NodeId) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
