//! Seeded draws of the coordinate subset used by partial descent.

use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Draws `parameters_used` distinct coordinates per epoch.
///
/// The generator is seeded once per run and only advances, so a fixed seed
/// reproduces the whole sequence of subsets.
#[derive(Debug, Clone)]
pub struct CoordinateSampler {
    rng: ChaCha8Rng,
    n_parameters: usize,
    parameters_used: usize,
}

impl CoordinateSampler {
    /// Callers guarantee `0 < parameters_used <= n_parameters`.
    pub fn new(seed: u64, n_parameters: usize, parameters_used: usize) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            n_parameters,
            parameters_used,
        }
    }

    /// Sampled without replacement, returned in ascending order.
    pub fn draw(&mut self) -> Vec<usize> {
        let mut indices =
            index::sample(&mut self.rng, self.n_parameters, self.parameters_used).into_vec();
        indices.sort_unstable();
        indices
    }
}
