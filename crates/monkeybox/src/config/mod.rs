//! Engine behavior knobs.
//!
//! Loading these from disk or flags is the embedder's concern; the engine
//! only consumes the resolved values.

use crate::model::{ComponentName, LaunchIntent};
use crate::snapshot::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Apps the engine is allowed to drive. Must be non-empty.
    pub apps: Vec<ComponentName>,
    /// Stable engine identifier for diagnostics; generated when absent.
    pub device_id: Option<Uuid>,
    /// Seed for the decision RNG; absent means OS entropy.
    pub rng_seed: Option<u64>,

    /// Base delay appended after every translated action.
    pub throttle_ms: u64,
    /// Randomize each positive throttle into `[1, base]`.
    pub randomize_throttle: bool,

    /// Probability of appending an extra fuzz action after an oracle action.
    pub fuzz_probability: f64,
    /// Always sample fuzz directives from the reduced surface.
    pub force_simplified_fuzzing: bool,

    /// Press Home (probabilistically) before killing a package.
    pub homing_enabled: bool,
    pub homing_rate: f64,
    pub home_settle_ms: u64,

    /// Resume from the task history instead of a cold start (probabilistic).
    pub history_restart_enabled: bool,
    pub history_restart_rate: f64,

    /// Optional intent override carried on cold launches.
    pub launch_intent: Option<LaunchIntent>,
    /// Settle delay after a launch is issued.
    pub launch_settle_ms: u64,

    /// Pre-launch shell commands, sampled randomly.
    pub pre_shell_enabled: bool,
    pub pre_shell_commands: Vec<String>,
    /// Run the shell command on every launch, not only the first.
    pub pre_shell_every_startup: bool,
    pub pre_shell_settle_ms: u64,

    /// Pre-launch schema commands: random pick, or strict round-robin when
    /// traversal is on.
    pub pre_schema_enabled: bool,
    pub pre_schema_commands: Vec<String>,
    pub pre_schema_every_startup: bool,
    pub pre_schema_traversal: bool,
    pub pre_schema_settle_ms: u64,

    /// Warm-up scroll passes after a launch settles. Zero disables.
    pub warmup_scroll_top_down: u32,
    pub warmup_scroll_bottom_up: u32,
    pub warmup_scroll_settle_ms: u64,

    /// Full swipe duration, split evenly across the interpolated moves.
    pub swipe_duration_ms: u64,
    /// Click anywhere inside the target instead of its center.
    pub random_click: bool,
    /// Hold duration for long presses when the oracle gives none.
    pub long_press_ms: u64,
    /// Status-bar height override; absent means ask the device.
    pub status_bar_height: Option<i32>,

    /// Fast snapshot attempts before the settled fallback.
    pub snapshot_retries: u32,
    pub snapshot_retry_interval_ms: u64,
    /// Idle wait of the single settled fallback read.
    pub snapshot_idle_timeout_ms: u64,

    /// Dump the UI tree for every oracle step.
    pub dump_ui_tree_every_step: bool,
    /// Capture a screenshot for every oracle step.
    pub screenshot_every_step: bool,
    pub output_dir: PathBuf,
    /// Size of the screenshot writer pool.
    pub capture_workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            apps: Vec::new(),
            device_id: None,
            rng_seed: None,
            throttle_ms: 300,
            randomize_throttle: false,
            fuzz_probability: 0.02,
            force_simplified_fuzzing: false,
            homing_enabled: true,
            homing_rate: 0.25,
            home_settle_ms: 500,
            history_restart_enabled: false,
            history_restart_rate: 0.2,
            launch_intent: None,
            launch_settle_ms: 2000,
            pre_shell_enabled: false,
            pre_shell_commands: Vec::new(),
            pre_shell_every_startup: false,
            pre_shell_settle_ms: 1000,
            pre_schema_enabled: false,
            pre_schema_commands: Vec::new(),
            pre_schema_every_startup: false,
            pre_schema_traversal: false,
            pre_schema_settle_ms: 1000,
            warmup_scroll_top_down: 0,
            warmup_scroll_bottom_up: 0,
            warmup_scroll_settle_ms: 1000,
            swipe_duration_ms: 500,
            random_click: false,
            long_press_ms: 1000,
            status_bar_height: None,
            snapshot_retries: 3,
            snapshot_retry_interval_ms: 200,
            snapshot_idle_timeout_ms: 10_000,
            dump_ui_tree_every_step: false,
            screenshot_every_step: false,
            output_dir: PathBuf::from("monkeybox-out"),
            capture_workers: 3,
        }
    }
}

impl EngineConfig {
    /// Snapshot acquisition budget derived from the retry knobs.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.snapshot_retries,
            interval: Duration::from_millis(self.snapshot_retry_interval_ms),
            idle_timeout: Duration::from_millis(self.snapshot_idle_timeout_ms),
        }
    }
}
