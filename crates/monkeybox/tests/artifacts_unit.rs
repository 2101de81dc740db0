// Test module - relaxed lint rules
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(missing_docs)]

//! Diagnostic artifact tests
//!
//! Step dump naming and the asynchronous screenshot pool.

use monkeybox::capture::CaptureService;
use monkeybox::config::EngineConfig;
use monkeybox::device::ScreenImage;
use monkeybox::diagnostics::StepDumpWriter;
use monkeybox::engine::Engine;
use monkeybox::model::{ComponentName, Rect};
use monkeybox::oracle::WireActionKind;
use monkeybox::rng::engine_rng;
use monkeybox::testing::{wire_decision, MockDevice, ScriptedOracle};
use std::fs;

const DISPLAY: Rect = Rect {
    left: 0,
    top: 0,
    right: 1080,
    bottom: 1920,
};

// =============================================================================
// Step Dump Writer
// =============================================================================

#[test]
fn step_stem_embeds_step_session_action_and_time() {
    let stem = StepDumpWriter::step_stem(7, "sid-1", "aid-2", 123_456);
    assert_eq!(stem, "step-7-sid-1-aid-2-123456");
}

#[test]
fn artifact_paths_pair_by_stem() {
    let writer = StepDumpWriter::new("/tmp/monkeybox-out");
    assert_eq!(
        writer.ui_tree_path("step-1-s-a-0"),
        std::path::PathBuf::from("/tmp/monkeybox-out/step-1-s-a-0.xml")
    );
    assert_eq!(
        writer.screenshot_path("step-1-s-a-0"),
        std::path::PathBuf::from("/tmp/monkeybox-out/step-1-s-a-0.png")
    );
}

#[test]
fn write_ui_tree_creates_the_directory_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let writer = StepDumpWriter::new(dir.path().join("dumps"));

    let path = writer.write_ui_tree("step-1-s-a-0", "<node/>").unwrap();
    assert_eq!(fs::read_to_string(path).unwrap(), "<node/>");
}

// =============================================================================
// Capture Pool
// =============================================================================

#[test]
fn submitted_images_are_written_before_teardown_returns() {
    let dir = tempfile::tempdir().unwrap();
    let service = CaptureService::new(2);
    let mut rng = engine_rng(Some(31));

    for index in 0..5_u8 {
        let destination = dir.path().join(format!("shot-{index}.png"));
        service.submit(
            ScreenImage {
                data: vec![index; 16],
            },
            destination,
            &mut rng,
        );
    }
    service.teardown();

    for index in 0..5_u8 {
        let data = fs::read(dir.path().join(format!("shot-{index}.png"))).unwrap();
        assert_eq!(data, vec![index; 16]);
    }
}

#[test]
fn zero_worker_requests_still_get_one_worker() {
    let dir = tempfile::tempdir().unwrap();
    let service = CaptureService::new(0);
    let mut rng = engine_rng(Some(32));

    let destination = dir.path().join("only.png");
    service.submit(
        ScreenImage { data: vec![1, 2, 3] },
        destination.clone(),
        &mut rng,
    );
    service.teardown();

    assert_eq!(fs::read(destination).unwrap(), vec![1, 2, 3]);
}

// =============================================================================
// Per-Step Diagnostics In The Cycle
// =============================================================================

#[test]
fn per_step_dumps_and_screenshots_land_in_the_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        apps: vec![ComponentName::new("com.example.app", "com.example.app.Main")],
        fuzz_probability: 0.0,
        dump_ui_tree_every_step: true,
        screenshot_every_step: true,
        output_dir: dir.path().to_path_buf(),
        rng_seed: Some(33),
        ..EngineConfig::default()
    };
    let mut device = MockDevice::new(DISPLAY);
    device.hold_screen(
        ComponentName::new("com.example.app", "com.example.app.Main"),
        "<node text='dump me'/>",
    );
    let mut oracle = ScriptedOracle::new();
    oracle.push_decision(wire_decision(WireActionKind::Back));

    let mut engine = Engine::new(config, device, oracle).unwrap();
    engine.next_event().unwrap();
    while engine.has_pending() {
        engine.next_event().unwrap();
    }
    engine.teardown();

    let mut xml = Vec::new();
    let mut png = Vec::new();
    for entry in fs::read_dir(dir.path()).unwrap() {
        let name = entry.unwrap().file_name().to_string_lossy().into_owned();
        assert!(
            name.starts_with("step-1-sid-aid-"),
            "unexpected artifact name {name}"
        );
        if name.ends_with(".xml") {
            xml.push(name);
        } else if name.ends_with(".png") {
            png.push(name);
        }
    }
    assert_eq!(xml.len(), 1, "one ui tree dump per oracle step");
    assert_eq!(png.len(), 1, "one screenshot per oracle step");

    let tree = fs::read_to_string(dir.path().join(&xml[0])).unwrap();
    assert_eq!(tree, "<node text='dump me'/>");
}
