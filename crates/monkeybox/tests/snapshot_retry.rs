// Test module - relaxed lint rules
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(missing_docs)]

//! UI snapshot acquisition tests
//!
//! Bounded fast retries, one settled escalation, and the distinction between
//! "foreground unresolved" and "tree unavailable".

use monkeybox::device::{ActiveWindow, Device};
use monkeybox::model::ComponentName;
use monkeybox::model::Rect;
use monkeybox::snapshot::{acquire, retry_with_escalation, AcquireFailure, Probe, RetryPolicy};
use monkeybox::testing::MockDevice;
use std::convert::Infallible;
use std::time::Duration;

const DISPLAY: Rect = Rect {
    left: 0,
    top: 0,
    right: 1080,
    bottom: 1920,
};

fn policy(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempts,
        interval: Duration::ZERO,
        idle_timeout: Duration::from_millis(10),
    }
}

fn component() -> ComponentName {
    ComponentName::new("com.example.app", "com.example.app.MainActivity")
}

fn window(tree: &str) -> ActiveWindow {
    ActiveWindow {
        owner_package: "com.example.app".to_string(),
        tree_text: tree.to_string(),
    }
}

// =============================================================================
// Retry Combinator
// =============================================================================

#[test]
fn exhausted_fast_probes_escalate_exactly_once() {
    let mut probes = Vec::new();
    let outcome: Result<Option<u32>, Infallible> =
        retry_with_escalation(3, Duration::ZERO, |probe| {
            probes.push(probe);
            Ok(None)
        });

    assert!(outcome.unwrap().is_none());
    assert_eq!(
        probes,
        vec![Probe::Fast, Probe::Fast, Probe::Fast, Probe::Settled]
    );
}

#[test]
fn early_success_skips_the_escalation() {
    let mut probes = Vec::new();
    let outcome: Result<Option<u32>, Infallible> =
        retry_with_escalation(3, Duration::ZERO, |probe| {
            probes.push(probe);
            if probes.len() == 2 {
                Ok(Some(42))
            } else {
                Ok(None)
            }
        });

    assert_eq!(outcome.unwrap(), Some(42));
    assert_eq!(probes, vec![Probe::Fast, Probe::Fast]);
}

#[test]
fn probe_errors_propagate_immediately() {
    let mut calls = 0;
    let outcome: Result<Option<u32>, &str> = retry_with_escalation(3, Duration::ZERO, |_| {
        calls += 1;
        Err("channel lost")
    });

    assert_eq!(outcome.unwrap_err(), "channel lost");
    assert_eq!(calls, 1);
}

// =============================================================================
// Acquisition
// =============================================================================

#[test]
fn first_attempt_success_reads_fast_path_once() {
    let mut device = MockDevice::new(DISPLAY);
    device.hold_screen(component(), "<node text='ok'/>");

    let snapshot = acquire(&mut device, &policy(3)).unwrap().unwrap();
    assert_eq!(snapshot.foreground, component());
    assert_eq!(snapshot.ui_tree, "<node text='ok'/>");
    assert_eq!(snapshot.window_owner, "com.example.app");
    assert_eq!(device.fast_window_reads, 1);
    assert_eq!(device.settled_window_reads, 0);
}

#[test]
fn settled_fallback_rescues_a_flaky_fast_path() {
    let mut device = MockDevice::new(DISPLAY);
    device.script_foreground(Some(component()));
    device.script_window(None);
    device.script_window(None);
    device.script_window(None);
    device.script_window(Some(window("<late/>")));

    let snapshot = acquire(&mut device, &policy(3)).unwrap().unwrap();
    assert_eq!(snapshot.ui_tree, "<late/>");
    assert_eq!(device.fast_window_reads, 3);
    assert_eq!(device.settled_window_reads, 1);
}

#[test]
fn unresolved_foreground_is_reported_as_such() {
    let mut device = MockDevice::new(DISPLAY);
    device.script_window(Some(window("<tree/>")));

    let failure = acquire(&mut device, &policy(2)).unwrap().unwrap_err();
    assert_eq!(failure, AcquireFailure::ForegroundUnresolved);
}

#[test]
fn missing_window_is_reported_as_tree_unavailable() {
    let mut device = MockDevice::new(DISPLAY);
    device.script_foreground(Some(component()));
    device.script_window(None);

    let failure = acquire(&mut device, &policy(2)).unwrap().unwrap_err();
    assert_eq!(failure, AcquireFailure::TreeUnavailable);
    assert_eq!(device.fast_window_reads, 2);
    assert_eq!(device.settled_window_reads, 1);
}

#[test]
fn empty_tree_counts_as_unavailable() {
    let mut device = MockDevice::new(DISPLAY);
    device.script_foreground(Some(component()));
    device.script_window(Some(window("")));

    let failure = acquire(&mut device, &policy(2)).unwrap().unwrap_err();
    assert_eq!(failure, AcquireFailure::TreeUnavailable);
}

#[test]
fn hard_device_failures_bubble_out() {
    let mut device = MockDevice::new(DISPLAY);
    device.fail_foreground = true;

    assert!(acquire(&mut device, &policy(2)).is_err());
}

#[test]
fn snapshot_carries_a_capture_timestamp() {
    let mut device = MockDevice::new(DISPLAY);
    device.hold_screen(component(), "<tree/>");

    let snapshot = acquire(&mut device, &policy(1)).unwrap().unwrap();
    assert_eq!(snapshot.captured_at_ms, device.uptime_millis() - 5);
}
