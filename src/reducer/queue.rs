use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Error, Result};

/// Values for one reduction round
///
/// Filled once with uniformly random values, then handed to the pool by value,
/// so each item is consumed by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkQueue {
    values: Vec<i64>,
}

impl WorkQueue {
    /// `count` values drawn uniformly from `[low, high]`
    pub fn generate<G: Rng>(low: i64, high: i64, count: usize, rng: &mut G) -> Result<Self> {
        if low > high {
            return Err(Error::InvalidRange { low, high });
        }

        let values = (0..count).map(|_| rng.gen_range(low..=high)).collect();
        Ok(Self { values })
    }

    /// Seeded generation is reproducible; without a seed the OS seeds the RNG
    pub fn generate_seeded(low: i64, high: i64, count: usize, seed: Option<u64>) -> Result<Self> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::generate(low, high, count, &mut rng)
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<i64> {
        self.values
    }
}
