//! Paced delays between delivered events.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Duration of the next throttle delay.
///
/// With randomization off this is `base_ms` exactly. With randomization on
/// and a positive base: draw a signed value, take its absolute value, reduce
/// modulo the base and add one, landing in `[1, base_ms]`.
#[must_use]
pub fn throttle_duration(base_ms: u64, randomize: bool, rng: &mut ChaCha8Rng) -> u64 {
    if randomize && base_ms > 0 {
        let draw = rng.gen::<i64>();
        draw.unsigned_abs() % base_ms + 1
    } else {
        base_ms
    }
}
