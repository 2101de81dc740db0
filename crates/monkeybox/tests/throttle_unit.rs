// Test module - relaxed lint rules
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(missing_docs)]

//! Throttle scheduler unit tests

use monkeybox::rng::engine_rng;
use monkeybox::throttle::throttle_duration;

#[test]
fn randomization_off_returns_base_exactly() {
    let mut rng = engine_rng(Some(1));
    for base in [0, 1, 50, 300, 10_000] {
        assert_eq!(throttle_duration(base, false, &mut rng), base);
    }
}

#[test]
fn randomization_on_lands_in_one_to_base() {
    let mut rng = engine_rng(Some(2));
    let base = 300;
    for _ in 0..1000 {
        let duration = throttle_duration(base, true, &mut rng);
        assert!(
            (1..=base).contains(&duration),
            "duration {duration} outside [1, {base}]"
        );
    }
}

#[test]
fn randomization_on_zero_base_stays_zero() {
    let mut rng = engine_rng(Some(3));
    assert_eq!(throttle_duration(0, true, &mut rng), 0);
}

#[test]
fn randomized_draws_vary() {
    let mut rng = engine_rng(Some(4));
    let draws: Vec<u64> = (0..50).map(|_| throttle_duration(1000, true, &mut rng)).collect();
    let first = draws.first().copied().unwrap();
    assert!(
        draws.iter().any(|d| *d != first),
        "1000-wide throttle should not collapse to one value"
    );
}
