//! Scripted collaborators for exercising the engine without a device.
//!
//! [`MockDevice`] replays scripted foreground/window states and records
//! every side effect; [`ScriptedOracle`] replays canned decisions and
//! answers shield queries from a list of rectangles. Both live in the
//! library (not the test tree) so embedders can drive their own integration
//! tests against the same doubles.

// Mock coordinate and keycode mappings go through plain casts.
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]

use crate::device::{ActiveWindow, Device, DeviceError, ScreenImage};
use crate::model::{ComponentName, KeyCode, PointF, Rect};
use crate::oracle::{
    Oracle, OracleDecision, OracleError, OracleRequest, ShieldQuery, WireActionKind, WireFlags,
};
use std::cell::Cell;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

/// Scripted device double. Scripts are consumed front-to-back; once a script
/// runs dry the last value repeats forever.
pub struct MockDevice {
    pub display: Rect,
    pub status_bar: i32,
    pub keyboard_open: bool,
    pub text_injection_works: bool,
    pub shell_ok: bool,
    pub fail_foreground: bool,
    pub screen_image: Option<Vec<u8>>,
    pub launcher_classes: HashSet<String>,
    pub main_screens: HashSet<String>,
    pub overlay_packages: HashSet<String>,
    pub stopped: Vec<String>,
    pub cleared: Vec<String>,
    pub shell_log: Vec<String>,
    pub injected_text: Vec<String>,
    pub fast_window_reads: u32,
    pub settled_window_reads: u32,
    foreground_script: VecDeque<Option<ComponentName>>,
    foreground_last: Option<ComponentName>,
    window_script: VecDeque<Option<ActiveWindow>>,
    window_last: Option<ActiveWindow>,
    clock_ms: Cell<u64>,
}

impl MockDevice {
    #[must_use]
    pub fn new(display: Rect) -> Self {
        let mut overlay_packages = HashSet::new();
        overlay_packages.insert("com.android.systemui".to_string());
        Self {
            display,
            status_bar: 48,
            keyboard_open: false,
            text_injection_works: true,
            shell_ok: true,
            fail_foreground: false,
            screen_image: Some(vec![0x89, b'P', b'N', b'G']),
            launcher_classes: HashSet::new(),
            main_screens: HashSet::new(),
            overlay_packages,
            stopped: Vec::new(),
            cleared: Vec::new(),
            shell_log: Vec::new(),
            injected_text: Vec::new(),
            fast_window_reads: 0,
            settled_window_reads: 0,
            foreground_script: VecDeque::new(),
            foreground_last: None,
            window_script: VecDeque::new(),
            window_last: None,
            clock_ms: Cell::new(0),
        }
    }

    /// Queue one foreground resolution result.
    pub fn script_foreground(&mut self, component: Option<ComponentName>) {
        self.foreground_script.push_back(component);
    }

    /// Queue one active-window read result.
    pub fn script_window(&mut self, window: Option<ActiveWindow>) {
        self.window_script.push_back(window);
    }

    /// Script a steady state: `component` in front with `tree` on screen.
    pub fn hold_screen(&mut self, component: ComponentName, tree: &str) {
        let window = ActiveWindow {
            owner_package: component.package.clone(),
            tree_text: tree.to_string(),
        };
        self.foreground_last = Some(component);
        self.window_last = Some(window);
    }
}

impl Device for MockDevice {
    fn foreground_component(&mut self) -> Result<Option<ComponentName>, DeviceError> {
        if self.fail_foreground {
            return Err(DeviceError::ChannelLost("scripted failure".to_string()));
        }
        match self.foreground_script.pop_front() {
            Some(entry) => {
                self.foreground_last = entry.clone();
                Ok(entry)
            }
            None => Ok(self.foreground_last.clone()),
        }
    }

    fn active_window(&mut self) -> Result<Option<ActiveWindow>, DeviceError> {
        self.fast_window_reads += 1;
        match self.window_script.pop_front() {
            Some(entry) => {
                self.window_last = entry.clone();
                Ok(entry)
            }
            None => Ok(self.window_last.clone()),
        }
    }

    fn active_window_settled(
        &mut self,
        _timeout: Duration,
    ) -> Result<Option<ActiveWindow>, DeviceError> {
        self.settled_window_reads += 1;
        match self.window_script.pop_front() {
            Some(entry) => {
                self.window_last = entry.clone();
                Ok(entry)
            }
            None => Ok(self.window_last.clone()),
        }
    }

    fn display_bounds(&self) -> Rect {
        self.display
    }

    fn status_bar_height(&self) -> i32 {
        self.status_bar
    }

    fn uptime_millis(&self) -> u64 {
        self.clock_ms.set(self.clock_ms.get() + 5);
        self.clock_ms.get()
    }

    fn capture_screen(&mut self) -> Option<ScreenImage> {
        self.screen_image
            .clone()
            .map(|data| ScreenImage { data })
    }

    fn inject_text(&mut self, text: &str) -> bool {
        self.injected_text.push(text.to_string());
        self.text_injection_works
    }

    fn key_codes_for_text(&self, text: &str) -> Vec<KeyCode> {
        text.chars().map(|c| KeyCode::Raw(c as i32)).collect()
    }

    fn stop_package(&mut self, package: &str) {
        self.stopped.push(package.to_string());
    }

    fn clear_package_data(&mut self, package: &str) -> bool {
        self.cleared.push(package.to_string());
        true
    }

    fn execute_shell(&mut self, command: &str) -> bool {
        self.shell_log.push(command.to_string());
        self.shell_ok
    }

    fn keyboard_visible(&mut self) -> bool {
        self.keyboard_open
    }

    fn is_launcher(&self, class_name: &str) -> bool {
        self.launcher_classes.contains(class_name)
    }

    fn is_app_main_screen(&self, class_name: &str, _package: &str) -> bool {
        self.main_screens.contains(class_name)
    }

    fn is_system_overlay(&self, package: &str) -> bool {
        self.overlay_packages.contains(package)
    }
}

/// Scripted oracle double. Decisions are consumed front-to-back; a drained
/// script answers with a transport failure.
#[derive(Default)]
pub struct ScriptedOracle {
    decisions: VecDeque<Result<OracleDecision, OracleError>>,
    pub shielded: Vec<Rect>,
    /// Every request seen, as (foreground class, tree text).
    pub requests: Vec<(String, String)>,
    pub shield_queries: u32,
}

impl ScriptedOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_decision(&mut self, decision: OracleDecision) {
        self.decisions.push_back(Ok(decision));
    }

    pub fn push_failure(&mut self, failure: OracleError) {
        self.decisions.push_back(Err(failure));
    }
}

impl ShieldQuery for ScriptedOracle {
    fn is_point_shielded(&mut self, _screen: &str, point: PointF) -> bool {
        self.shield_queries += 1;
        self.shielded
            .iter()
            .any(|rect| rect.contains(point.x as i32, point.y as i32))
    }
}

impl Oracle for ScriptedOracle {
    fn request_action(
        &mut self,
        request: &OracleRequest<'_>,
    ) -> Result<OracleDecision, OracleError> {
        self.requests.push((
            request.foreground_class_name.to_string(),
            request.ui_tree_text.to_string(),
        ));
        self.decisions
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Transport("script exhausted".to_string())))
    }
}

/// Minimal wire decision for tests: the given kind, defaults elsewhere.
#[must_use]
pub fn wire_decision(kind: WireActionKind) -> OracleDecision {
    OracleDecision {
        action_kind: kind,
        target_rect: None,
        text: None,
        flags: WireFlags::default(),
        throttle_millis: 0,
        wait_millis: 0,
        session_id: "sid".to_string(),
        action_id: "aid".to_string(),
    }
}
