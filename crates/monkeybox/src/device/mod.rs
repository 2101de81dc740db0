//! Device-side collaborators the engine drives.
//!
//! The engine never talks to a platform directly; everything it needs from
//! the device under test goes through [`Device`]. Production embedders bind
//! this to their introspection and injection transport; tests use the
//! scripted implementation in [`crate::testing`].

use crate::model::{ComponentName, KeyCode, Rect};
use std::time::Duration;
use thiserror::Error;

/// Raw UI structure of the active window plus its owning package.
///
/// The owning package may differ from the foreground activity's package when
/// a system surface (notification shade, permission dialog) sits on top.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveWindow {
    pub owner_package: String,
    pub tree_text: String,
}

/// Encoded screen capture, handed to the capture service untouched.
#[derive(Clone, Debug)]
pub struct ScreenImage {
    pub data: Vec<u8>,
}

/// Hard device failures. Soft conditions (unresolved foreground, missing
/// window) are expressed as `Ok(None)` and handled by the recovery policy.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device introspection channel lost: {0}")]
    ChannelLost(String),
    #[error("device call failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the engine consumes from the device under test.
pub trait Device {
    /// Component currently in the foreground; `None` when the platform
    /// cannot resolve it right now.
    fn foreground_component(&mut self) -> Result<Option<ComponentName>, DeviceError>;

    /// Fast-path read of the active window.
    fn active_window(&mut self) -> Result<Option<ActiveWindow>, DeviceError>;

    /// Slow-path read: wait for the UI to go idle up to `timeout`, then read.
    fn active_window_settled(&mut self, timeout: Duration)
        -> Result<Option<ActiveWindow>, DeviceError>;

    fn display_bounds(&self) -> Rect;

    /// Height of the top system bar, used to keep upward swipes out of it.
    fn status_bar_height(&self) -> i32;

    /// Monotonic device uptime, the timebase of injected gestures.
    fn uptime_millis(&self) -> u64;

    fn capture_screen(&mut self) -> Option<ScreenImage>;

    /// Set a text field directly. `false` means the device refused and the
    /// caller should fall back to per-key synthesis.
    fn inject_text(&mut self, text: &str) -> bool;

    /// Platform key codes for typing `text` one key at a time.
    fn key_codes_for_text(&self, text: &str) -> Vec<KeyCode>;

    fn stop_package(&mut self, package: &str);

    /// Delete persisted data for `package`. Returns whether the clear took.
    fn clear_package_data(&mut self, package: &str) -> bool;

    /// Run a shell command to completion.
    fn execute_shell(&mut self, command: &str) -> bool;

    fn keyboard_visible(&mut self) -> bool;

    /// Whether `class_name` is the device home/launcher screen.
    fn is_launcher(&self, class_name: &str) -> bool;

    /// Whether `class_name` is the main entry screen of `package`.
    fn is_app_main_screen(&self, class_name: &str, package: &str) -> bool;

    /// Whether `package` is a platform overlay surface rather than an app.
    fn is_system_overlay(&self, package: &str) -> bool;
}
