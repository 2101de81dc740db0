//! Expansion of symbolic actions into exact primitive event sequences.
//!
//! Every action becomes an ordered run of queue entries: touches with shared
//! gesture timestamps, key pairs, waits, launch requests. Geometry rules
//! live here (point picking, swipe interpolation, shielded-region
//! avoidance); pacing is delegated to the throttle scheduler. Each non-fuzz
//! expansion ends with one trailing throttle sized by the action's hint;
//! fuzz actions instead spend the hint between their directives.

// Screen coordinates fit i32 with room to spare.
#![allow(clippy::cast_possible_truncation)]

use crate::config::EngineConfig;
use crate::device::Device;
use crate::engine::EngineContext;
use crate::model::{
    lerp, ActionKind, ComponentName, EventPayload, FuzzDirective, InputChannel, KeyCode, KeyPhase,
    PointF, Pointer, Rect, ScrollDirection, SymbolicAction, TextDirective, ToggleKind, TouchPhase,
};
use crate::oracle::ShieldQuery;
use crate::queue::EventQueue;
use crate::throttle::throttle_duration;
use crate::{fuzz, rng};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

/// Settle delay between touch-down and touch-up of a plain tap.
const CLICK_WAIT_MS: u64 = 0;
/// Interpolated move segments per swipe.
const SCROLL_STEPS: u32 = 10;
/// Settle after the app-switch key before choosing Home or Back.
const APP_SWITCH_SETTLE_MS: u64 = 500;
/// Shielded-point perturbation budget.
const SHIELD_RETRIES: u32 = 10;

/// Expands one symbolic action at a time against the engine's queue and
/// context. Cheap to construct; the engine builds one per translation.
pub struct Translator<'a> {
    queue: &'a mut EventQueue,
    ctx: &'a mut EngineContext,
    config: &'a EngineConfig,
    device: &'a mut dyn Device,
    shield: &'a mut dyn ShieldQuery,
    rng: &'a mut ChaCha8Rng,
}

impl<'a> Translator<'a> {
    pub fn new(
        queue: &'a mut EventQueue,
        ctx: &'a mut EngineContext,
        config: &'a EngineConfig,
        device: &'a mut dyn Device,
        shield: &'a mut dyn ShieldQuery,
        rng: &'a mut ChaCha8Rng,
    ) -> Self {
        Self {
            queue,
            ctx,
            config,
            device,
            shield,
            rng,
        }
    }

    /// Expand `action` into primitive events plus its trailing throttle.
    pub fn translate(&mut self, action: &SymbolicAction) {
        self.apply(action);
        if !matches!(action.kind, ActionKind::Fuzz { .. }) {
            self.emit_throttle(action.throttle_ms);
        }
    }

    fn apply(&mut self, action: &SymbolicAction) {
        match &action.kind {
            ActionKind::Click { target, input } => {
                self.click_at(*target, CLICK_WAIT_MS);
                self.apply_text_input(*target, input);
            }
            ActionKind::LongClick { target, hold_ms } => self.click_at(*target, *hold_ms),
            ActionKind::Scroll { direction, target } => self.scroll_at(*target, *direction),
            ActionKind::ScrollBottomUpN { target } => {
                let passes = 3 + self.rng.gen_range(0..5_u32);
                for _ in 0..passes {
                    self.scroll_at(*target, ScrollDirection::BottomUp);
                }
            }
            ActionKind::Back => self.emit_key_pair(KeyCode::Back),
            ActionKind::Start => self.launch_random_app(false, false),
            ActionKind::Restart => self.restart_random_app(false, "restart action"),
            ActionKind::CleanRestart => self.restart_random_app(true, "clean restart action"),
            ActionKind::Crash => self.restart_random_app(false, "crash recovery"),
            ActionKind::Nop => {}
            ActionKind::Activate => self.app_switch(),
            ActionKind::Shell { command, settle_ms } => {
                self.queue.enqueue(EventPayload::Command {
                    line: command.clone(),
                });
                self.queue.enqueue(EventPayload::Wait {
                    duration_ms: *settle_ms,
                });
            }
            ActionKind::Fuzz { directives } => self.apply_fuzz(directives, action.throttle_ms),
        }
    }

    // =========================================================================
    // Touch synthesis
    // =========================================================================

    /// Touch-down, optional wait, touch-up inside `target`.
    fn click_at(&mut self, target: Option<Rect>, wait_ms: u64) {
        let bounds = target.unwrap_or_else(|| {
            warn!("click target missing, falling back to display bounds");
            self.device.display_bounds()
        });

        let point = if self.config.random_click {
            let dx = if bounds.width() > 0 {
                self.rng.gen_range(0..bounds.width())
            } else {
                0
            };
            let dy = if bounds.height() > 0 {
                self.rng.gen_range(0..bounds.height())
            } else {
                0
            };
            PointF::new((bounds.left + dx) as f32, (bounds.top + dy) as f32)
        } else {
            bounds.center()
        };

        if !bounds.contains(point.x as i32, point.y as i32) {
            warn!(?bounds, "click point escaped target bounds, aborting action");
            return;
        }

        let point = self.avoid_shielded(point);
        let down_at = self.device.uptime_millis();
        self.emit_touch(TouchPhase::Down, point, down_at, false, false);
        if wait_ms > 0 {
            self.queue.enqueue(EventPayload::Wait {
                duration_ms: wait_ms,
            });
        }
        self.emit_touch(TouchPhase::Up, point, down_at, false, false);
    }

    /// Swipe from the target's center to the far display edge.
    pub fn scroll_at(&mut self, target: Option<Rect>, direction: ScrollDirection) {
        let display = self.device.display_bounds();
        let bounds = target.unwrap_or(display);
        let start = bounds.center();
        let end = match direction {
            ScrollDirection::BottomUp => {
                // Stay below the status bar; top edge is inclusive.
                let top = self.status_bar_top(display);
                PointF::new(start.x, top as f32)
            }
            // Bottom edge is exclusive.
            ScrollDirection::TopDown => PointF::new(start.x, (display.bottom - 1) as f32),
            // Right edge is exclusive.
            ScrollDirection::LeftRight => PointF::new((display.right - 1) as f32, start.y),
            // Left edge is inclusive.
            ScrollDirection::RightLeft => PointF::new(display.left as f32, start.y),
        };

        let down_at = self.device.uptime_millis();
        self.emit_touch(TouchPhase::Down, start, down_at, false, true);
        let step_wait = self.config.swipe_duration_ms / u64::from(SCROLL_STEPS);
        for step in 0..SCROLL_STEPS {
            let alpha = step as f32 / SCROLL_STEPS as f32;
            let position = PointF::new(lerp(start.x, end.x, alpha), lerp(start.y, end.y, alpha));
            self.emit_touch(TouchPhase::Move, position, down_at, true, true);
            self.queue.enqueue(EventPayload::Wait {
                duration_ms: step_wait,
            });
        }
        self.emit_touch(TouchPhase::Up, end, down_at, false, true);
    }

    fn status_bar_top(&self, display: Rect) -> i32 {
        let height = self
            .config
            .status_bar_height
            .unwrap_or_else(|| self.device.status_bar_height());
        height.max(display.top)
    }

    /// Nudge a shielded point to an open spot.
    ///
    /// The perturbation is an arithmetic progression keyed by the remaining
    /// retry count, wrapped modulo the display size; after the budget is
    /// spent the last candidate is accepted unconditionally.
    fn avoid_shielded(&mut self, point: PointF) -> PointF {
        let display = self.device.display_bounds();
        let display_w = display.width().max(1) as f32;
        let display_h = display.height().max(1) as f32;
        let unit_x = display_h / 20.0;
        let unit_y = display_w / 10.0;

        let mut candidate = point;
        let mut retries = SHIELD_RETRIES;
        while self
            .shield
            .is_point_shielded(&self.ctx.current_activity, candidate)
        {
            if retries == 0 {
                break;
            }
            let jitter_x = self.rng.gen_range(0..8_u32) as f32;
            let jitter_y = self.rng.gen_range(0..17_u32) as f32;
            candidate.x = (point.x + retries as f32 * unit_x * jitter_x) % display_w;
            candidate.y = (point.y + retries as f32 * unit_y * jitter_y) % display_h;
            retries -= 1;
        }
        candidate
    }

    // =========================================================================
    // Text input
    // =========================================================================

    fn apply_text_input(&mut self, target: Option<Rect>, input: &TextDirective) {
        match input.text.as_deref().filter(|text| !text.is_empty()) {
            Some(text) => {
                info!(text, "typing oracle-supplied text");
                if input.clear_first {
                    self.clear_field(target);
                }
                match input.channel {
                    InputChannel::RawInject => {
                        if !self.device.inject_text(text) {
                            self.type_text_by_keys(text);
                        }
                    }
                    InputChannel::ShellInput => {
                        self.queue.enqueue(EventPayload::Command {
                            line: format!("input text {text}"),
                        });
                    }
                    InputChannel::Ime => {
                        self.queue.enqueue(EventPayload::ImeText {
                            text: text.to_string(),
                        });
                    }
                }
            }
            None => self.dismiss_keyboard(input.editable),
        }
    }

    /// Long-press the field, delete, click it again.
    fn clear_field(&mut self, target: Option<Rect>) {
        let hold_ms = self.config.long_press_ms;
        self.click_at(target, hold_ms);
        self.emit_key_pair(KeyCode::Delete);
        self.click_at(target, CLICK_WAIT_MS);
    }

    fn type_text_by_keys(&mut self, text: &str) {
        for code in self.device.key_codes_for_text(text) {
            self.emit_key_pair(code);
        }
        self.emit_key_pair(KeyCode::Enter);
    }

    /// At most one dismiss per distinct foreground cycle marker.
    fn dismiss_keyboard(&mut self, editable: bool) {
        if self.ctx.last_input_marker == Some(self.ctx.cycle_marker) {
            debug!("keyboard already handled for this screen");
            return;
        }
        self.ctx.last_input_marker = Some(self.ctx.cycle_marker);
        if editable || self.device.keyboard_visible() {
            self.emit_key_pair(KeyCode::Escape);
        }
    }

    // =========================================================================
    // App lifecycle
    // =========================================================================

    fn restart_random_app(&mut self, clear_data: bool, reason: &str) {
        let Some(app) = self.pick_app() else { return };
        let homing_rate = self.config.homing_rate;
        if self.config.homing_enabled && rng::toss(self.rng, homing_rate) {
            debug!("pressing home before app kill");
            self.emit_key_pair(KeyCode::Home);
            let settle = self.config.home_settle_ms;
            self.emit_throttle(settle);
        }
        info!(package = %app.package, reason, "restarting package");
        self.device.stop_package(&app.package);
        self.launch_app(&app, clear_data, true);
    }

    /// Launch a randomly chosen permitted app.
    pub fn launch_random_app(&mut self, clear_data: bool, from_history: bool) {
        if let Some(app) = self.pick_app() {
            self.launch_app(&app, clear_data, from_history);
        }
    }

    fn pick_app(&mut self) -> Option<ComponentName> {
        let app = rng::pick(self.rng, &self.config.apps).cloned();
        if app.is_none() {
            warn!("no permitted apps configured");
        }
        app
    }

    /// The full launch run: optional data clear, pre-launch shell, launch
    /// request, settle, pre-launch schema, warm-up scrolls.
    fn launch_app(&mut self, app: &ComponentName, clear_data: bool, from_history: bool) {
        if clear_data {
            if self.device.clear_package_data(&app.package) {
                info!(package = %app.package, "package data cleared");
            } else {
                warn!(package = %app.package, "failed to clear package data");
            }
        }

        self.run_pre_shell();

        let history_rate = self.config.history_restart_rate;
        let resume = from_history
            && self.config.history_restart_enabled
            && rng::toss(self.rng, history_rate);
        if resume {
            debug!("resuming from task history");
        }
        self.queue.enqueue(EventPayload::Launch {
            component: app.clone(),
            resume_from_history: resume,
            intent: self.config.launch_intent.clone(),
        });
        let settle = self.config.launch_settle_ms;
        self.emit_throttle(settle);

        self.run_pre_schema();
        self.warmup_scrolls();
    }

    fn run_pre_shell(&mut self) {
        if !self.config.pre_shell_enabled {
            return;
        }
        if !(self.ctx.first_shell || self.config.pre_shell_every_startup) {
            return;
        }
        let Some(command) = rng::pick(self.rng, &self.config.pre_shell_commands).cloned() else {
            return;
        };
        if command.is_empty() {
            return;
        }
        info!(command, "running pre-launch shell command");
        if self.device.execute_shell(&command) {
            self.queue.enqueue(EventPayload::Wait {
                duration_ms: self.config.pre_shell_settle_ms,
            });
            self.ctx.first_shell = false;
        } else {
            warn!(command, "pre-launch shell command failed");
        }
    }

    fn run_pre_schema(&mut self) {
        if !self.config.pre_schema_enabled {
            return;
        }
        if !(self.ctx.first_schema || self.config.pre_schema_every_startup) {
            return;
        }
        let schema = if self.config.pre_schema_traversal {
            // Strict round-robin: pop a stack refilled from the full list.
            if self.ctx.schema_stack.is_empty() {
                self.ctx.schema_stack = self.config.pre_schema_commands.clone();
            }
            match self.ctx.schema_stack.pop() {
                Some(schema) => schema,
                None => return,
            }
        } else {
            match rng::pick(self.rng, &self.config.pre_schema_commands).cloned() {
                Some(schema) => schema,
                None => return,
            }
        };
        if schema.is_empty() {
            return;
        }
        info!(schema, "executing pre-launch schema");
        self.queue.enqueue(EventPayload::Schema { uri: schema });
        let settle = self.config.pre_schema_settle_ms;
        self.emit_throttle(settle);
        self.ctx.first_schema = false;
    }

    fn warmup_scrolls(&mut self) {
        let settle = self.config.warmup_scroll_settle_ms;
        for _ in 0..self.config.warmup_scroll_top_down {
            let display = self.device.display_bounds();
            self.scroll_at(Some(display), ScrollDirection::TopDown);
            self.emit_throttle(settle);
        }
        for _ in 0..self.config.warmup_scroll_bottom_up {
            let display = self.device.display_bounds();
            self.scroll_at(Some(display), ScrollDirection::BottomUp);
            self.emit_throttle(settle);
        }
    }

    /// App-switch key, settle, then randomly Home or Back.
    fn app_switch(&mut self) {
        info!("generating app switch events");
        self.emit_key_pair(KeyCode::AppSwitch);
        self.emit_throttle(APP_SWITCH_SETTLE_MS);
        if self.rng.gen::<bool>() {
            debug!("pressing home after app switch");
            self.emit_key_pair(KeyCode::Home);
        } else {
            debug!("pressing back after app switch");
            self.emit_key_pair(KeyCode::Back);
        }
        let base = self.config.throttle_ms;
        self.emit_throttle(base);
    }

    // =========================================================================
    // Fuzzing
    // =========================================================================

    /// Expand directives with the action's throttle between them; no
    /// trailing throttle is appended on top.
    fn apply_fuzz(&mut self, directives: &[FuzzDirective], throttle_ms: u64) {
        for directive in directives {
            match directive {
                FuzzDirective::Tap { point } => {
                    let point = self.avoid_shielded(*point);
                    let down_at = self.device.uptime_millis();
                    self.emit_touch(TouchPhase::Down, point, down_at, false, false);
                    self.emit_touch(TouchPhase::Up, point, down_at, false, false);
                }
                FuzzDirective::Key { code } => self.emit_key_pair(*code),
                FuzzDirective::Toggle { kind } => self.emit_toggle(*kind),
            }
            self.emit_throttle(throttle_ms);
        }
    }

    fn emit_toggle(&mut self, kind: ToggleKind) {
        match kind {
            ToggleKind::Rotation => {
                let degrees = match self.rng.gen_range(0..4_u32) {
                    0 => 0,
                    1 => 90,
                    2 => 180,
                    _ => 270,
                };
                self.queue.enqueue(EventPayload::Rotation {
                    degrees,
                    persist: false,
                });
            }
            ToggleKind::Wifi => {
                let state = if self.rng.gen::<bool>() {
                    "enable"
                } else {
                    "disable"
                };
                self.queue.enqueue(EventPayload::Command {
                    line: format!("svc wifi {state}"),
                });
            }
            ToggleKind::Airplane => {
                let state = if self.rng.gen::<bool>() {
                    "enable"
                } else {
                    "disable"
                };
                self.queue.enqueue(EventPayload::Command {
                    line: format!("cmd connectivity airplane-mode {state}"),
                });
            }
        }
    }

    // =========================================================================
    // Primitive emitters
    // =========================================================================

    /// Key events always come as a down/up pair.
    pub fn emit_key_pair(&mut self, code: KeyCode) {
        self.queue.enqueue(EventPayload::Key {
            code,
            phase: KeyPhase::Down,
        });
        self.queue.enqueue(EventPayload::Key {
            code,
            phase: KeyPhase::Up,
        });
    }

    fn emit_touch(
        &mut self,
        phase: TouchPhase,
        position: PointF,
        down_at_ms: u64,
        intermediate: bool,
        swipe_segment: bool,
    ) {
        self.queue.enqueue(EventPayload::Touch {
            phase,
            pointers: vec![Pointer { slot: 0, position }],
            down_at_ms,
            intermediate,
            swipe_segment,
        });
    }

    /// Queue one throttle delay sized from `base_ms`.
    pub fn emit_throttle(&mut self, base_ms: u64) {
        let duration_ms = throttle_duration(base_ms, self.config.randomize_throttle, self.rng);
        self.queue.enqueue(EventPayload::Wait { duration_ms });
    }

    /// Sample a fresh fuzz action from the requested surface.
    pub fn fuzz_action(&mut self, full_surface: bool) -> SymbolicAction {
        let display = self.device.display_bounds();
        let directives = if full_surface && !self.config.force_simplified_fuzzing {
            fuzz::full_directives(self.rng, display)
        } else {
            fuzz::simplified_directives(self.rng, display)
        };
        SymbolicAction::new(
            ActionKind::Fuzz { directives },
            self.config.throttle_ms,
        )
    }
}
