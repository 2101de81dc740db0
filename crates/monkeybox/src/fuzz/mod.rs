//! Randomized fallback interactions, independent of oracle reasoning.
//!
//! Two sampling surfaces exist. The full surface mixes taps, hardware keys
//! and system toggles; the simplified surface keeps only taps and volume
//! keys, for states where aggressive input would just dig the hole deeper
//! (launcher, post-restart, unknown window).

use crate::model::{FuzzDirective, KeyCode, PointF, Rect, ToggleKind};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

const FUZZ_KEYS: &[KeyCode] = &[
    KeyCode::Back,
    KeyCode::Menu,
    KeyCode::VolumeUp,
    KeyCode::VolumeDown,
];

const SAFE_FUZZ_KEYS: &[KeyCode] = &[KeyCode::VolumeUp, KeyCode::VolumeDown];

/// Directives sampled from the full interaction surface.
pub fn full_directives(rng: &mut ChaCha8Rng, display: Rect) -> Vec<FuzzDirective> {
    let count = rng.gen_range(1..=4);
    (0..count)
        .map(|_| match rng.gen_range(0..6_u32) {
            0..=2 => tap(rng, display),
            3 | 4 => key(rng, FUZZ_KEYS),
            _ => toggle(rng),
        })
        .collect()
}

/// Directives sampled from the reduced surface: taps and volume keys only.
pub fn simplified_directives(rng: &mut ChaCha8Rng, display: Rect) -> Vec<FuzzDirective> {
    let count = rng.gen_range(1..=3);
    (0..count)
        .map(|_| match rng.gen_range(0..4_u32) {
            0..=2 => tap(rng, display),
            _ => key(rng, SAFE_FUZZ_KEYS),
        })
        .collect()
}

fn tap(rng: &mut ChaCha8Rng, display: Rect) -> FuzzDirective {
    let dx = rng.gen_range(0..display.width().max(1));
    let dy = rng.gen_range(0..display.height().max(1));
    FuzzDirective::Tap {
        point: PointF::new((display.left + dx) as f32, (display.top + dy) as f32),
    }
}

fn key(rng: &mut ChaCha8Rng, set: &[KeyCode]) -> FuzzDirective {
    let code = crate::rng::pick(rng, set)
        .copied()
        .unwrap_or(KeyCode::VolumeDown);
    FuzzDirective::Key { code }
}

fn toggle(rng: &mut ChaCha8Rng) -> FuzzDirective {
    let kind = match rng.gen_range(0..3_u32) {
        0 => ToggleKind::Wifi,
        1 => ToggleKind::Airplane,
        _ => ToggleKind::Rotation,
    };
    FuzzDirective::Toggle { kind }
}
