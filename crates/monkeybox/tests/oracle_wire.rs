// Test module - relaxed lint rules
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(missing_docs)]

//! Oracle wire contract tests
//!
//! Request/response serialization and the resolution of wire decisions into
//! translatable actions.

use monkeybox::model::{ActionKind, InputChannel, Rect, ScrollDirection};
use monkeybox::oracle::{OracleDecision, OracleRequest, WireActionKind};
use monkeybox::testing::wire_decision;
use serde_json::json;

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn request_uses_camel_case_field_names() {
    let request = OracleRequest {
        foreground_class_name: "com.example.app.MainActivity",
        ui_tree_text: "<node/>",
    };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(
        value,
        json!({
            "foregroundClassName": "com.example.app.MainActivity",
            "uiTreeText": "<node/>"
        })
    );
}

#[test]
fn minimal_response_fills_defaults() {
    let decision: OracleDecision =
        serde_json::from_value(json!({ "actionKind": "BACK" })).unwrap();

    assert_eq!(decision.action_kind, WireActionKind::Back);
    assert_eq!(decision.target_rect, None);
    assert_eq!(decision.text, None);
    assert_eq!(decision.throttle_millis, 0);
    assert_eq!(decision.wait_millis, 0);
    assert!(decision.flags.allow_fuzzing, "fuzzing is allowed by default");
    assert!(!decision.flags.clear);
}

#[test]
fn full_response_deserializes_every_field() {
    let decision: OracleDecision = serde_json::from_value(json!({
        "actionKind": "CLICK",
        "targetRect": [10, 20, 50, 60],
        "text": "hello",
        "flags": {
            "clear": true,
            "editable": true,
            "rawInput": false,
            "useAlternateInputChannel": false,
            "allowFuzzing": false
        },
        "throttleMillis": 200,
        "waitMillis": 0,
        "sessionId": "s-1",
        "actionId": "a-9"
    }))
    .unwrap();

    assert_eq!(decision.target_rect, Some([10, 20, 50, 60]));
    assert_eq!(decision.text.as_deref(), Some("hello"));
    assert!(decision.flags.clear && decision.flags.editable);
    assert!(!decision.flags.allow_fuzzing);
    assert_eq!(decision.session_id, "s-1");
    assert_eq!(decision.action_id, "a-9");
}

#[test]
fn action_kinds_use_screaming_snake_case() {
    for (name, kind) in [
        ("CLICK", WireActionKind::Click),
        ("LONG_CLICK", WireActionKind::LongClick),
        ("SCROLL_BOTTOM_UP", WireActionKind::ScrollBottomUp),
        ("SCROLL_BOTTOM_UP_N", WireActionKind::ScrollBottomUpN),
        ("CLEAN_RESTART", WireActionKind::CleanRestart),
        ("SHELL_EVENT", WireActionKind::ShellEvent),
    ] {
        let decision: OracleDecision =
            serde_json::from_value(json!({ "actionKind": name })).unwrap();
        assert_eq!(decision.action_kind, kind, "kind name {name}");
    }
}

#[test]
fn unknown_action_kind_is_rejected() {
    let result: Result<OracleDecision, _> =
        serde_json::from_value(json!({ "actionKind": "TELEPORT" }));
    assert!(result.is_err());
}

// =============================================================================
// Decision Resolution
// =============================================================================

#[test]
fn decision_throttle_adds_the_engine_base() {
    let mut decision = wire_decision(WireActionKind::Back);
    decision.throttle_millis = 200;

    let action = decision.into_action(300, 1000);
    assert_eq!(action.throttle_ms, 500);
}

#[test]
fn click_without_rect_downgrades_to_nop() {
    let decision = wire_decision(WireActionKind::Click);
    let action = decision.into_action(300, 1000);
    assert_eq!(action.kind, ActionKind::Nop);
    assert_eq!(action.throttle_ms, 300, "the throttle hint survives the downgrade");
}

#[test]
fn scroll_without_rect_downgrades_to_nop() {
    let decision = wire_decision(WireActionKind::ScrollTopDown);
    assert_eq!(decision.into_action(0, 1000).kind, ActionKind::Nop);
}

#[test]
fn untargeted_kinds_survive_without_a_rect() {
    for kind in [
        WireActionKind::Back,
        WireActionKind::Start,
        WireActionKind::Restart,
        WireActionKind::Activate,
    ] {
        let action = wire_decision(kind).into_action(0, 1000);
        assert_ne!(action.kind, ActionKind::Nop, "{kind:?} must map through");
    }
    assert_eq!(
        wire_decision(WireActionKind::Nop).into_action(0, 1000).kind,
        ActionKind::Nop
    );
}

#[test]
fn click_rect_resolves_to_target_geometry() {
    let mut decision = wire_decision(WireActionKind::Click);
    decision.target_rect = Some([10, 20, 50, 60]);

    match decision.into_action(0, 1000).kind {
        ActionKind::Click { target, .. } => {
            assert_eq!(target, Some(Rect::new(10, 20, 50, 60)));
        }
        other => panic!("expected a click, got {other:?}"),
    }
}

#[test]
fn input_channel_resolution_prefers_raw_over_alternate() {
    let mut decision = wire_decision(WireActionKind::Click);
    decision.target_rect = Some([0, 0, 10, 10]);
    decision.text = Some("x".to_string());
    decision.flags.raw_input = true;
    decision.flags.use_alternate_input_channel = true;

    match decision.into_action(0, 1000).kind {
        ActionKind::Click { input, .. } => assert_eq!(input.channel, InputChannel::RawInject),
        other => panic!("expected a click, got {other:?}"),
    }
}

#[test]
fn alternate_channel_maps_to_shell_input() {
    let mut decision = wire_decision(WireActionKind::Click);
    decision.target_rect = Some([0, 0, 10, 10]);
    decision.text = Some("x".to_string());
    decision.flags.use_alternate_input_channel = true;

    match decision.into_action(0, 1000).kind {
        ActionKind::Click { input, .. } => assert_eq!(input.channel, InputChannel::ShellInput),
        other => panic!("expected a click, got {other:?}"),
    }
}

#[test]
fn default_channel_is_ime() {
    let mut decision = wire_decision(WireActionKind::Click);
    decision.target_rect = Some([0, 0, 10, 10]);
    decision.text = Some("x".to_string());

    match decision.into_action(0, 1000).kind {
        ActionKind::Click { input, .. } => assert_eq!(input.channel, InputChannel::Ime),
        other => panic!("expected a click, got {other:?}"),
    }
}

#[test]
fn empty_click_text_is_normalized_to_none() {
    let mut decision = wire_decision(WireActionKind::Click);
    decision.target_rect = Some([0, 0, 10, 10]);
    decision.text = Some(String::new());

    match decision.into_action(0, 1000).kind {
        ActionKind::Click { input, .. } => assert_eq!(input.text, None),
        other => panic!("expected a click, got {other:?}"),
    }
}

#[test]
fn long_click_zero_wait_takes_the_configured_default() {
    let mut decision = wire_decision(WireActionKind::LongClick);
    decision.target_rect = Some([0, 0, 10, 10]);

    match decision.into_action(0, 1000).kind {
        ActionKind::LongClick { hold_ms, .. } => assert_eq!(hold_ms, 1000),
        other => panic!("expected a long click, got {other:?}"),
    }

    let mut decision = wire_decision(WireActionKind::LongClick);
    decision.target_rect = Some([0, 0, 10, 10]);
    decision.wait_millis = 250;
    match decision.into_action(0, 1000).kind {
        ActionKind::LongClick { hold_ms, .. } => assert_eq!(hold_ms, 250),
        other => panic!("expected a long click, got {other:?}"),
    }
}

#[test]
fn scroll_kinds_map_to_directions() {
    for (kind, direction) in [
        (WireActionKind::ScrollTopDown, ScrollDirection::TopDown),
        (WireActionKind::ScrollBottomUp, ScrollDirection::BottomUp),
        (WireActionKind::ScrollLeftRight, ScrollDirection::LeftRight),
        (WireActionKind::ScrollRightLeft, ScrollDirection::RightLeft),
    ] {
        let mut decision = wire_decision(kind);
        decision.target_rect = Some([0, 0, 100, 100]);
        match decision.into_action(0, 1000).kind {
            ActionKind::Scroll { direction: got, .. } => assert_eq!(got, direction),
            other => panic!("expected a scroll, got {other:?}"),
        }
    }
}

#[test]
fn shell_event_carries_command_and_settle() {
    let mut decision = wire_decision(WireActionKind::ShellEvent);
    decision.text = Some("pm list packages".to_string());
    decision.wait_millis = 400;

    match decision.into_action(0, 1000).kind {
        ActionKind::Shell { command, settle_ms } => {
            assert_eq!(command, "pm list packages");
            assert_eq!(settle_ms, 400);
        }
        other => panic!("expected a shell action, got {other:?}"),
    }
}

#[test]
fn crash_maps_to_recovery_restart() {
    assert_eq!(
        wire_decision(WireActionKind::Crash).into_action(0, 1000).kind,
        ActionKind::Crash
    );
}
