//! Bounded-retry acquisition of the current UI state.
//!
//! Foreground identity and window tree come from two separate device calls
//! that are not atomic with each other; either can transiently come back
//! empty while the platform is mid-transition. Acquisition probes the fast
//! path a bounded number of times, then escalates once to a settled read
//! with an extended idle wait before giving up.

use crate::device::{Device, DeviceError};
use crate::model::ComponentName;
use std::thread;
use std::time::Duration;

/// Immutable view of the UI captured for one decision cycle. Never cached
/// across cycles.
#[derive(Clone, Debug)]
pub struct UiSnapshot {
    pub foreground: ComponentName,
    /// Package owning the active window; may differ from the foreground
    /// activity's package when a system surface sits on top.
    pub window_owner: String,
    pub ui_tree: String,
    pub captured_at_ms: u64,
}

/// Why acquisition came back empty.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AcquireFailure {
    ForegroundUnresolved,
    TreeUnavailable,
}

/// Retry budget: fast attempts with fixed spacing, then one settled probe.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
    pub idle_timeout: Duration,
}

/// Which read a probe should perform.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Probe {
    Fast,
    Settled,
}

/// Bounded retry with one escalation: `attempts` fast probes spaced by
/// `interval`, then a single settled probe before giving up.
pub fn retry_with_escalation<T, E>(
    attempts: u32,
    interval: Duration,
    mut probe: impl FnMut(Probe) -> Result<Option<T>, E>,
) -> Result<Option<T>, E> {
    for _ in 0..attempts {
        if let Some(value) = probe(Probe::Fast)? {
            return Ok(Some(value));
        }
        thread::sleep(interval);
    }
    probe(Probe::Settled)
}

/// Acquire the foreground component and UI tree together.
///
/// The outer `Result` carries hard device failures; the inner one
/// distinguishes an unresolved foreground from an unavailable tree so the
/// recovery policy can log them apart.
pub fn acquire(
    device: &mut dyn Device,
    policy: &RetryPolicy,
) -> Result<Result<UiSnapshot, AcquireFailure>, DeviceError> {
    let mut last_failure = AcquireFailure::TreeUnavailable;
    let idle_timeout = policy.idle_timeout;

    let outcome = retry_with_escalation(policy.attempts, policy.interval, |probe| {
        let foreground = device.foreground_component()?;
        let window = match probe {
            Probe::Fast => device.active_window()?,
            Probe::Settled => device.active_window_settled(idle_timeout)?,
        };
        match (foreground, window) {
            (Some(foreground), Some(window)) if !window.tree_text.is_empty() => {
                Ok::<_, DeviceError>(Some((foreground, window)))
            }
            (None, _) => {
                last_failure = AcquireFailure::ForegroundUnresolved;
                Ok(None)
            }
            _ => {
                last_failure = AcquireFailure::TreeUnavailable;
                Ok(None)
            }
        }
    })?;

    Ok(match outcome {
        Some((foreground, window)) => {
            let captured_at_ms = device.uptime_millis();
            Ok(UiSnapshot {
                foreground,
                window_owner: window.owner_package,
                ui_tree: window.tree_text,
                captured_at_ms,
            })
        }
        None => Err(last_failure),
    })
}
