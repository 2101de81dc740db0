use crate::model::component::{ComponentName, LaunchIntent};
use crate::model::geometry::PointF;
use serde::{Deserialize, Serialize};

/// Key codes the engine synthesizes. `Raw` carries a platform keycode as-is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCode {
    Home,
    Back,
    AppSwitch,
    Escape,
    Delete,
    Enter,
    Menu,
    VolumeUp,
    VolumeDown,
    Raw(i32),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPhase {
    Down,
    Up,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Down,
    Move,
    Up,
}

/// One pointer of a touch event. Single-pointer gestures use slot 0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub slot: u8,
    pub position: PointF,
}

/// A single injectable device input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Key {
        code: KeyCode,
        phase: KeyPhase,
    },
    Touch {
        phase: TouchPhase,
        pointers: Vec<Pointer>,
        /// Uptime at which the owning gesture went down; shared by every
        /// event of one gesture.
        down_at_ms: u64,
        intermediate: bool,
        /// Marks the touch as part of a swipe rather than a tap.
        swipe_segment: bool,
    },
    Wait {
        duration_ms: u64,
    },
    /// Text delivered through the input-method channel.
    ImeText {
        text: String,
    },
    /// Shell-level command line for the consumer to execute.
    Command {
        line: String,
    },
    /// Deep-link schema to open.
    Schema {
        uri: String,
    },
    Rotation {
        degrees: i32,
        persist: bool,
    },
    /// Request to bring `component` to the foreground.
    Launch {
        component: ComponentName,
        resume_from_history: bool,
        intent: Option<LaunchIntent>,
    },
}

/// A queued input event. Ids are assigned by the queue and strictly increase
/// for the lifetime of the engine, even across queue clears.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveEvent {
    pub id: u64,
    pub payload: EventPayload,
}
