//! Seeded task-weight generation.
//!
//! The workload RNG is seeded separately from the context seed so that
//! changing cluster parameters never changes the task sequence.

use crate::error::SimError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Pareto};
use serde::{Deserialize, Serialize};

/// Pareto shape for heavy-tailed weights (smaller = heavier tail).
const HEAVY_TAIL_SHAPE: f64 = 1.2;

/// Shape of the generated weight sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightDistribution {
    /// Every weight in `1..=max_weight` equally likely
    Uniform,

    /// Mostly light tasks with rare heavy ones (Pareto, clamped)
    HeavyTail,
}

/// Deterministic generator of positive task weights.
pub struct WorkloadGenerator {
    rng: ChaCha8Rng,
    max_weight: u32,
    pareto: Pareto<f64>,
}

impl WorkloadGenerator {
    /// Creates a generator; `max_weight` must be at least 1.
    pub fn new(seed: u64, max_weight: u32) -> Result<Self, SimError> {
        if max_weight == 0 {
            return Err(SimError::InvalidWorkload("max_weight must be at least 1".to_string()));
        }
        let pareto = Pareto::new(1.0, HEAVY_TAIL_SHAPE)
            .map_err(|e| SimError::InvalidWorkload(format!("pareto: {}", e)))?;

        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_weight,
            pareto,
        })
    }

    pub fn max_weight(&self) -> u32 {
        self.max_weight
    }

    /// Draws one weight in `1..=max_weight`.
    pub fn next_weight(&mut self, distribution: WeightDistribution) -> u32 {
        match distribution {
            WeightDistribution::Uniform => self.rng.gen_range(1..=self.max_weight),
            WeightDistribution::HeavyTail => {
                // Pareto(1, a) samples are >= 1.0
                let sample = self.pareto.sample(&mut self.rng).floor();
                (sample.min(self.max_weight as f64) as u32).max(1)
            }
        }
    }

    /// Draws `count` weights.
    pub fn generate(&mut self, count: usize, distribution: WeightDistribution) -> Vec<u32> {
        (0..count).map(|_| self.next_weight(distribution)).collect()
    }
}
