//! Deterministic RNG utilities for reproducible tests.

use nalgebra::SVector;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Create a deterministic `ChaCha8Rng` from a seed.
///
/// All test randomization should go through this to ensure reproducibility.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Deterministic vector with entries uniform in `[-scale, scale)`.
pub fn random_vector<const N: usize>(rng: &mut ChaCha8Rng, scale: f64) -> SVector<f64, N> {
    SVector::from_fn(|_, _| scale * (2.0 * rng.r#gen::<f64>() - 1.0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
