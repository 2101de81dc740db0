//! Seeded randomness for the decision loop.
//!
//! Same seed, same run: every nondeterministic choice the engine makes goes
//! through one ChaCha8 stream so a failing exploration can be replayed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Create the engine RNG: seeded when the configuration provides a seed,
/// otherwise from OS entropy.
#[must_use]
pub fn engine_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Bernoulli draw: true with probability `rate`.
pub fn toss(rng: &mut ChaCha8Rng, rate: f64) -> bool {
    rng.gen::<f64>() < rate
}

/// Uniformly pick one element of `items`.
pub fn pick<'a, T>(rng: &mut ChaCha8Rng, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        items.get(rng.gen_range(0..items.len()))
    }
}
