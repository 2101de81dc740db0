//! Decision oracle client: the wire contract and the RPC seam.
//!
//! The oracle is an out-of-process action predictor. It receives the
//! foreground class name and the serialized UI tree, and answers with one
//! symbolic action plus scheduling hints. The call is blocking and carries
//! no partial results: any transport or codec problem surfaces as an opaque
//! [`OracleError`] and the engine degrades for that cycle.

use crate::model::{
    ActionKind, InputChannel, Rect, ScrollDirection, SymbolicAction, TextDirective,
};
use crate::model::PointF;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Request sent for every decision.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleRequest<'a> {
    pub foreground_class_name: &'a str,
    pub ui_tree_text: &'a str,
}

/// Action kinds the oracle can return on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireActionKind {
    Click,
    LongClick,
    ScrollTopDown,
    ScrollBottomUp,
    ScrollLeftRight,
    ScrollRightLeft,
    ScrollBottomUpN,
    Back,
    Start,
    Restart,
    CleanRestart,
    Crash,
    Nop,
    Activate,
    ShellEvent,
}

impl WireActionKind {
    /// Kinds that are meaningless without a target rectangle.
    #[must_use]
    pub fn requires_target(self) -> bool {
        matches!(
            self,
            Self::Click
                | Self::LongClick
                | Self::ScrollTopDown
                | Self::ScrollBottomUp
                | Self::ScrollLeftRight
                | Self::ScrollRightLeft
                | Self::ScrollBottomUpN
        )
    }
}

/// Flags attached to a wire decision.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireFlags {
    pub clear: bool,
    pub editable: bool,
    pub raw_input: bool,
    pub use_alternate_input_channel: bool,
    pub allow_fuzzing: bool,
}

impl Default for WireFlags {
    fn default() -> Self {
        Self {
            clear: false,
            editable: false,
            raw_input: false,
            use_alternate_input_channel: false,
            allow_fuzzing: true,
        }
    }
}

/// One decision from the oracle, as received on the wire.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleDecision {
    pub action_kind: WireActionKind,
    /// Left, top, right, bottom.
    #[serde(default)]
    pub target_rect: Option<[i16; 4]>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub flags: WireFlags,
    #[serde(default)]
    pub throttle_millis: u64,
    /// Long-click hold or shell settle duration; 0 means "use the default".
    #[serde(default)]
    pub wait_millis: u64,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub action_id: String,
}

impl OracleDecision {
    /// Resolve the wire decision into a translatable action.
    ///
    /// Adds the engine's base throttle to the decision's own, and downgrades
    /// a required-target decision with a missing rectangle to `Nop`.
    #[must_use]
    pub fn into_action(self, base_throttle_ms: u64, default_hold_ms: u64) -> SymbolicAction {
        let throttle_ms = self.throttle_millis.saturating_add(base_throttle_ms);
        let target = self
            .target_rect
            .map(|[left, top, right, bottom]| {
                Rect::new(left.into(), top.into(), right.into(), bottom.into())
            });

        if self.action_kind.requires_target() && target.is_none() {
            return SymbolicAction::nop(throttle_ms);
        }

        let kind = match self.action_kind {
            WireActionKind::Click => ActionKind::Click {
                target,
                input: TextDirective {
                    text: self.text.filter(|text| !text.is_empty()),
                    clear_first: self.flags.clear,
                    editable: self.flags.editable,
                    channel: if self.flags.raw_input {
                        InputChannel::RawInject
                    } else if self.flags.use_alternate_input_channel {
                        InputChannel::ShellInput
                    } else {
                        InputChannel::Ime
                    },
                },
            },
            WireActionKind::LongClick => ActionKind::LongClick {
                target,
                hold_ms: if self.wait_millis == 0 {
                    default_hold_ms
                } else {
                    self.wait_millis
                },
            },
            WireActionKind::ScrollTopDown => ActionKind::Scroll {
                direction: ScrollDirection::TopDown,
                target,
            },
            WireActionKind::ScrollBottomUp => ActionKind::Scroll {
                direction: ScrollDirection::BottomUp,
                target,
            },
            WireActionKind::ScrollLeftRight => ActionKind::Scroll {
                direction: ScrollDirection::LeftRight,
                target,
            },
            WireActionKind::ScrollRightLeft => ActionKind::Scroll {
                direction: ScrollDirection::RightLeft,
                target,
            },
            WireActionKind::ScrollBottomUpN => ActionKind::ScrollBottomUpN { target },
            WireActionKind::Back => ActionKind::Back,
            WireActionKind::Start => ActionKind::Start,
            WireActionKind::Restart => ActionKind::Restart,
            WireActionKind::CleanRestart => ActionKind::CleanRestart,
            WireActionKind::Crash => ActionKind::Crash,
            WireActionKind::Nop => ActionKind::Nop,
            WireActionKind::Activate => ActionKind::Activate,
            WireActionKind::ShellEvent => ActionKind::Shell {
                command: self.text.unwrap_or_default(),
                settle_ms: self.wait_millis,
            },
        };

        SymbolicAction::new(kind, throttle_ms)
    }
}

/// Transport and codec failures of the oracle round trip.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("failed to encode oracle request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("oracle transport failed: {0}")]
    Transport(String),
    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

/// Queries answered against shielded-region metadata.
pub trait ShieldQuery {
    /// Whether `point` lies inside a region flagged off-limits on `screen`.
    fn is_point_shielded(&mut self, screen: &str, point: PointF) -> bool;
}

/// Blocking RPC to the external action predictor.
pub trait Oracle: ShieldQuery {
    fn request_action(
        &mut self,
        request: &OracleRequest<'_>,
    ) -> Result<OracleDecision, OracleError>;
}
