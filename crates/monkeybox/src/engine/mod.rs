//! The decision loop: one cycle per empty queue, one event per pull.
//!
//! This module provides [`Engine`], the single consumer-facing type. A pull
//! first re-resolves the foreground component (recovering from unresolved or
//! out-of-scope states), then, if the queue ran dry, runs one full decision
//! cycle: acquire a UI snapshot, intercept system overlays, consult the
//! oracle, translate the decision, and optionally append an extra fuzz
//! action. Failures inside a cycle degrade to fuzz or throttle events; only
//! hard device failures surface to the caller.
//!
//! # Key Operations
//!
//! - [`Engine::new`] - Validate configuration and assemble the engine
//! - [`Engine::next_event`] - Pull the next primitive event
//! - [`Engine::teardown`] - Flush capture workers and hand back the context

use crate::capture::CaptureService;
use crate::config::EngineConfig;
use crate::device::{Device, DeviceError};
use crate::diagnostics::StepDumpWriter;
use crate::model::{
    ActionKind, ComponentName, EventPayload, KeyCode, PrimitiveEvent, ScrollDirection,
    SymbolicAction,
};
use crate::oracle::{Oracle, OracleRequest};
use crate::queue::EventQueue;
use crate::snapshot::{self, UiSnapshot};
use crate::throttle::throttle_duration;
use crate::translate::Translator;
use crate::{rng, rng::engine_rng};
use miette::Diagnostic;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Post-recovery settle after a system overlay interception.
const OVERLAY_SETTLE_MS: u64 = 1000;

pub type EngineResult<T> = Result<T, EngineError>;

/// Structured engine failure: stable code, human message, optional context.
#[derive(Debug)]
pub struct EngineError {
    pub code: String,
    pub message: String,
    pub context: Option<Value>,
}

impl EngineError {
    pub fn config(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: None,
        }
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: None,
        }
    }

    pub fn io(
        code: impl Into<String>,
        message: impl Into<String>,
        err: impl fmt::Display,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: Some(serde_json::json!({ "source": err.to_string() })),
        }
    }

    pub fn ui_read(message: impl Into<String>, err: &DeviceError, activity: &str) -> Self {
        Self {
            code: "E_UI_READ".to_string(),
            message: message.into(),
            context: Some(serde_json::json!({
                "source": err.to_string(),
                "activity": activity,
            })),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl Diagnostic for EngineError {}

/// Mutable state owned by the decision loop. Single writer, no locking.
#[derive(Debug)]
pub struct EngineContext {
    /// Stable identifier embedded in diagnostics.
    pub device_id: Uuid,
    /// Class name of the last permitted foreground screen.
    pub current_activity: String,
    /// Screens seen in the foreground so far. Fast jumps can be missed.
    pub visited_activities: HashSet<String>,
    /// Bumped whenever the permitted foreground changes.
    pub cycle_marker: u64,
    /// Marker value at the last keyboard-dismiss, so it runs once per screen.
    pub last_input_marker: Option<u64>,
    /// Whether fuzzing may sample from the full interaction surface.
    pub full_fuzzing: bool,
    /// Pre-launch shell has not run yet.
    pub first_shell: bool,
    /// Pre-launch schema has not run yet.
    pub first_schema: bool,
    /// Round-robin schema stack, refilled from the configured list.
    pub schema_stack: Vec<String>,
    /// Blocked-activity alternation: a restart was already injected and the
    /// next blocked cycle should fuzz instead.
    pub restarted_for_blocked: bool,
    /// Oracle steps taken, used to number diagnostics.
    pub step: u64,
    /// Events handed to the consumer.
    pub event_count: u64,
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(Uuid::new_v4())
    }
}

impl EngineContext {
    #[must_use]
    pub fn new(device_id: Uuid) -> Self {
        Self {
            device_id,
            current_activity: String::new(),
            visited_activities: HashSet::new(),
            cycle_marker: 0,
            last_input_marker: None,
            full_fuzzing: true,
            first_shell: true,
            first_schema: true,
            schema_stack: Vec::new(),
            restarted_for_blocked: false,
            step: 0,
            event_count: 0,
        }
    }
}

/// The action generation and event scheduling engine.
pub struct Engine<D: Device, O: Oracle> {
    config: EngineConfig,
    device: D,
    oracle: O,
    queue: EventQueue,
    ctx: EngineContext,
    rng: ChaCha8Rng,
    capture: CaptureService,
    dumps: StepDumpWriter,
}

// Manual impl: `capture` holds worker `JoinHandle`s, which are not `Debug`,
// so `#[derive(Debug)]` cannot apply regardless of `D`/`O`.
impl<D: Device, O: Oracle> std::fmt::Debug for Engine<D, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl<D: Device, O: Oracle> Engine<D, O> {
    /// Assemble an engine over the given collaborators.
    ///
    /// # Errors
    /// Returns `E_CONFIG` when no permitted apps are configured.
    pub fn new(config: EngineConfig, device: D, oracle: O) -> EngineResult<Self> {
        if config.apps.is_empty() {
            return Err(EngineError::config(
                "E_CONFIG",
                "at least one permitted app is required",
            ));
        }
        let device_id = config.device_id.unwrap_or_else(Uuid::new_v4);
        info!(%device_id, "engine starting");
        let rng = engine_rng(config.rng_seed);
        let capture = CaptureService::new(config.capture_workers);
        let dumps = StepDumpWriter::new(config.output_dir.clone());
        Ok(Self {
            config,
            device,
            oracle,
            queue: EventQueue::new(),
            ctx: EngineContext::new(device_id),
            rng,
            capture,
            dumps,
        })
    }

    /// Pull the next primitive event, generating a fresh decision cycle when
    /// the queue has run dry.
    ///
    /// # Errors
    /// Returns an error only for hard device failures; everything else
    /// degrades inside the cycle.
    pub fn next_event(&mut self) -> EngineResult<PrimitiveEvent> {
        self.check_foreground()?;
        if !self.queue.has_event() {
            self.run_decision_cycle()?;
        }
        self.ctx.event_count += 1;
        self.queue.dequeue().ok_or_else(|| {
            EngineError::internal("E_INTERNAL", "decision cycle produced no events")
        })
    }

    /// Events handed out so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.ctx.event_count
    }

    /// Whether events are already queued for delivery.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.queue.has_event()
    }

    /// Engine-owned mutable state, for inspection.
    #[must_use]
    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// The device collaborator, for inspection.
    #[must_use]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The oracle collaborator, for inspection.
    #[must_use]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Flush pending screenshot writes and dismantle the engine, handing the
    /// final context back for reporting.
    #[must_use]
    pub fn teardown(self) -> EngineContext {
        info!(
            visited = self.ctx.visited_activities.len(),
            events = self.ctx.event_count,
            "engine teardown"
        );
        self.capture.teardown();
        self.ctx
    }

    // =========================================================================
    // Foreground policy
    // =========================================================================

    /// Re-resolve the foreground on every pull: recover from unresolved
    /// state, apply the blocked-activity policy, track screen changes.
    fn check_foreground(&mut self) -> EngineResult<()> {
        let component = self
            .device
            .foreground_component()
            .map_err(|err| {
                EngineError::ui_read(
                    "failed to resolve foreground component",
                    &err,
                    &self.ctx.current_activity,
                )
            })?;
        let Some(component) = component else {
            warn!("foreground component unresolved, forcing app launch");
            self.queue.clear();
            let throttle_ms = self.config.throttle_ms;
            self.translate_action(&SymbolicAction::new(ActionKind::Start, throttle_ms));
            return Ok(());
        };

        if self.is_permitted(&component.package) {
            if self.ctx.current_activity != component.class_name {
                self.ctx.current_activity = component.class_name.clone();
                self.ctx
                    .visited_activities
                    .insert(component.class_name.clone());
                self.ctx.cycle_marker += 1;
                info!(activity = %component, "foreground changed");
            }
        } else {
            self.handle_blocked(&component);
        }
        Ok(())
    }

    fn is_permitted(&self, package: &str) -> bool {
        self.config.apps.iter().any(|app| app.package == package)
    }

    /// Blocked-activity policy: alternate between relaunching a permitted
    /// app and injecting one fuzz action, unless already at the launcher.
    fn handle_blocked(&mut self, component: &ComponentName) {
        if self.queue.has_event() {
            return;
        }
        if self.ctx.restarted_for_blocked {
            if self.device.is_launcher(&component.class_name) {
                debug!("at launcher, entering reduced fuzzing");
                self.ctx.full_fuzzing = false;
            } else {
                info!(activity = %component, "foreground outside scope, injecting fuzz");
                let action = {
                    let mut translator = self.translator();
                    translator.fuzz_action(true)
                };
                self.translate_action(&action);
            }
            self.ctx.restarted_for_blocked = false;
        } else {
            info!(activity = %component, "foreground outside scope, relaunching");
            let throttle_ms = self.config.throttle_ms;
            self.translate_action(&SymbolicAction::new(ActionKind::Start, throttle_ms));
            self.ctx.restarted_for_blocked = true;
        }
    }

    // =========================================================================
    // Decision cycle
    // =========================================================================

    /// One full decision cycle; the queue is non-empty afterwards.
    fn run_decision_cycle(&mut self) -> EngineResult<()> {
        self.queue.enqueue(EventPayload::Rotation {
            degrees: 0,
            persist: false,
        });

        let policy = self.config.retry_policy();
        let acquired = snapshot::acquire(&mut self.device, &policy).map_err(|err| {
            EngineError::ui_read("ui snapshot read failed", &err, &self.ctx.current_activity)
        })?;

        let snapshot = match acquired {
            Ok(snapshot) => snapshot,
            Err(failure) => {
                warn!(
                    ?failure,
                    activity = %self.ctx.current_activity,
                    "ui snapshot unavailable, degrading to fuzz"
                );
                let full = self.ctx.full_fuzzing;
                let action = {
                    let mut translator = self.translator();
                    translator.fuzz_action(full)
                };
                self.translate_action(&action);
                return Ok(());
            }
        };

        if self.device.is_system_overlay(&snapshot.window_owner) {
            self.handle_overlay(&snapshot.window_owner);
            return Ok(());
        }

        self.consult_oracle(&snapshot);
        Ok(())
    }

    /// A platform surface covers the app: press Home, swipe it away,
    /// relaunch. The oracle is not consulted this cycle.
    fn handle_overlay(&mut self, owner: &str) {
        info!(owner, "system overlay window active, recovering");
        let display = self.device.display_bounds();
        let mut translator = self.translator();
        translator.emit_key_pair(KeyCode::Home);
        translator.scroll_at(Some(display), ScrollDirection::BottomUp);
        translator.launch_random_app(false, false);
        translator.emit_throttle(OVERLAY_SETTLE_MS);
    }

    /// Ask the oracle for the next action and expand it; on failure degrade
    /// to a throttle-only cycle.
    fn consult_oracle(&mut self, snapshot: &UiSnapshot) {
        let request = OracleRequest {
            foreground_class_name: &snapshot.foreground.class_name,
            ui_tree_text: &snapshot.ui_tree,
        };
        let decision = match self.oracle.request_action(&request) {
            Ok(decision) => decision,
            Err(err) => {
                warn!(
                    activity = %snapshot.foreground,
                    %err,
                    "oracle failure, degrading to throttle"
                );
                let duration_ms = throttle_duration(
                    self.config.throttle_ms,
                    self.config.randomize_throttle,
                    &mut self.rng,
                );
                self.queue.enqueue(EventPayload::Wait { duration_ms });
                return;
            }
        };

        let allow_fuzzing = decision.flags.allow_fuzzing;
        let session_id = decision.session_id.clone();
        let action_id = decision.action_id.clone();
        let action = decision.into_action(self.config.throttle_ms, self.config.long_press_ms);

        self.ctx.step += 1;
        self.dump_step_artifacts(snapshot, &session_id, &action_id);

        debug!(kind = ?action.kind, throttle = action.throttle_ms, "translating oracle action");
        self.translate_action(&action);
        self.update_fuzz_mode(&action.kind, &snapshot.foreground);

        let fuzz_probability = self.config.fuzz_probability;
        if allow_fuzzing && rng::toss(&mut self.rng, fuzz_probability) {
            debug!("appending extra fuzz action");
            let full = self.ctx.full_fuzzing;
            let action = {
                let mut translator = self.translator();
                translator.fuzz_action(full)
            };
            self.translate_action(&action);
        }
    }

    /// Full-surface fuzzing is only safe where a stray toggle cannot strand
    /// the run; restarts reset it, Back and plain actions re-evaluate it
    /// against the screen the action ran on.
    fn update_fuzz_mode(&mut self, kind: &ActionKind, foreground: &ComponentName) {
        self.ctx.full_fuzzing = match kind {
            ActionKind::Restart | ActionKind::CleanRestart | ActionKind::Crash => true,
            ActionKind::Back => self
                .device
                .is_app_main_screen(&foreground.class_name, &foreground.package),
            _ => self.device.is_launcher(&foreground.class_name),
        };
    }

    /// Per-step diagnostics: UI-tree text to the dump writer, screenshot to
    /// the capture pool. Failures are logged and dropped.
    fn dump_step_artifacts(&mut self, snapshot: &UiSnapshot, session_id: &str, action_id: &str) {
        if !self.config.dump_ui_tree_every_step && !self.config.screenshot_every_step {
            return;
        }
        let stem = StepDumpWriter::step_stem(
            self.ctx.step,
            session_id,
            action_id,
            snapshot.captured_at_ms,
        );
        if self.config.dump_ui_tree_every_step {
            match self.dumps.write_ui_tree(&stem, &snapshot.ui_tree) {
                Ok(path) => debug!(path = %path.display(), "ui tree dumped"),
                Err(err) => warn!(%err, "failed to dump ui tree"),
            }
        }
        if self.config.screenshot_every_step {
            match self.device.capture_screen() {
                Some(image) => {
                    let destination = self.dumps.screenshot_path(&stem);
                    self.capture.submit(image, destination, &mut self.rng);
                }
                None => warn!("screen capture unavailable for this step"),
            }
        }
    }

    // =========================================================================
    // Translation plumbing
    // =========================================================================

    fn translator(&mut self) -> Translator<'_> {
        Translator::new(
            &mut self.queue,
            &mut self.ctx,
            &self.config,
            &mut self.device,
            &mut self.oracle,
            &mut self.rng,
        )
    }

    fn translate_action(&mut self, action: &SymbolicAction) {
        self.translator().translate(action);
    }
}
