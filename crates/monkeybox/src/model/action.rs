use crate::model::event::KeyCode;
use crate::model::geometry::{PointF, Rect};
use serde::{Deserialize, Serialize};

/// Swipe directions the oracle can request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    TopDown,
    BottomUp,
    LeftRight,
    RightLeft,
}

/// Channel used to deliver oracle-supplied text.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputChannel {
    /// Queue the text as an input-method event.
    Ime,
    /// Set the field directly on the device, falling back to key synthesis.
    RawInject,
    /// Queue a shell-level `input text` command.
    ShellInput,
}

/// Text payload attached to a click decision. An absent text with an
/// editable target triggers the keyboard-dismiss path instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextDirective {
    pub text: Option<String>,
    pub clear_first: bool,
    pub editable: bool,
    pub channel: InputChannel,
}

impl Default for TextDirective {
    fn default() -> Self {
        Self {
            text: None,
            clear_first: false,
            editable: false,
            channel: InputChannel::Ime,
        }
    }
}

/// System state a fuzz toggle flips.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleKind {
    Wifi,
    Airplane,
    Rotation,
}

/// One randomized interaction inside a fuzz action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FuzzDirective {
    Tap { point: PointF },
    Key { code: KeyCode },
    Toggle { kind: ToggleKind },
}

/// What a symbolic action does. The translator owns the expansion rules;
/// each variant carries exactly the data its rule needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    Click {
        target: Option<Rect>,
        input: TextDirective,
    },
    LongClick {
        target: Option<Rect>,
        hold_ms: u64,
    },
    Scroll {
        direction: ScrollDirection,
        target: Option<Rect>,
    },
    /// Repeated bottom-up scrolls over the same target.
    ScrollBottomUpN {
        target: Option<Rect>,
    },
    Back,
    Start,
    Restart,
    CleanRestart,
    /// Recovery restart after a detected app crash.
    Crash,
    Nop,
    Activate,
    Shell {
        command: String,
        settle_ms: u64,
    },
    Fuzz {
        directives: Vec<FuzzDirective>,
    },
}

/// A decision ready for translation into primitive events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymbolicAction {
    pub kind: ActionKind,
    /// Trailing throttle hint; fuzz actions spend it between directives.
    pub throttle_ms: u64,
}

impl SymbolicAction {
    #[must_use]
    pub fn new(kind: ActionKind, throttle_ms: u64) -> Self {
        Self { kind, throttle_ms }
    }

    #[must_use]
    pub fn nop(throttle_ms: u64) -> Self {
        Self::new(ActionKind::Nop, throttle_ms)
    }
}
