//! End-to-end behaviour of the detection event pipeline with a manual clock.

use std::sync::Arc;
use std::time::Duration;

use visual_assist::{
    AssistConfig, Clock, Detection, Direction, Dispatcher, ManualClock, Pipeline, RecordingSink,
    SinkRecord, SpeechSettings, Timestamp,
};

fn detection(label: &str, confidence: f32, observed_x: f32) -> Detection {
    Detection {
        raw_label: label.to_string(),
        confidence,
        observed_x,
        frame_width: 640.0,
    }
}

#[test]
fn guitar_is_announced_as_laptop() {
    let pipeline = Pipeline::default();
    let out = pipeline.process(&detection("guitar", 0.95, 100.0), Timestamp::from_millis(0));

    let alert = out.alert.expect("first sighting is announced");
    assert_eq!(alert.spoken_text, "There is a laptop on your left");
    assert_eq!(alert.haptic_duration_ms, 140);
    assert_eq!(
        out.status.expect("status").display_text,
        "laptop detected on your left (95%)"
    );
}

#[test]
fn ignored_scene_label_changes_nothing() {
    let pipeline = Pipeline::default();
    let out = pipeline.process(&detection("indoor", 0.99, 320.0), Timestamp::from_millis(0));
    assert!(out.status.is_none());
    assert!(out.alert.is_none());
}

#[test]
fn corrected_aliases_share_one_cooldown() {
    let clock = ManualClock::new(Timestamp::from_millis(0));
    let pipeline = Pipeline::default();

    assert!(pipeline
        .process(&detection("keyboard", 0.9, 320.0), clock.now())
        .alert
        .is_some());
    let later = clock.advance(Duration::from_millis(2_000));
    let out = pipeline.process(&detection("Guitar", 0.9, 320.0), later);
    assert!(out.alert.is_none(), "guitar -> laptop is still cooling");
    assert!(out.status.is_some());
}

#[test]
fn label_cooldown_then_reannounce() {
    let pipeline = Pipeline::default();
    let at = Timestamp::from_millis;

    assert!(pipeline.process(&detection("chair", 0.8, 320.0), at(0)).alert.is_some());
    assert!(pipeline.process(&detection("chair", 0.8, 320.0), at(3_999)).alert.is_none());
    assert!(pipeline.process(&detection("chair", 0.8, 320.0), at(4_000)).alert.is_none());
    assert!(pipeline.process(&detection("chair", 0.8, 320.0), at(4_001)).alert.is_some());
}

#[test]
fn global_spacing_holds_back_a_different_label() {
    let pipeline = Pipeline::default();
    let at = Timestamp::from_millis;

    assert!(pipeline.process(&detection("laptop", 0.9, 320.0), at(0)).alert.is_some());
    let out = pipeline.process(&detection("monitor", 0.9, 320.0), at(500));
    assert!(out.alert.is_none());
    assert_eq!(
        out.status.expect("status").display_text,
        "monitor detected on your center (90%)"
    );
    // The rejected monitor did not start its own cooldown.
    assert!(pipeline.process(&detection("monitor", 0.9, 320.0), at(801)).alert.is_some());
}

#[test]
fn direction_bands_for_a_640_frame() {
    // center 320, band 80: [240, 400] is in front.
    let cases = [
        (239.0, Direction::Left),
        (240.0, Direction::Center),
        (400.0, Direction::Center),
        (401.0, Direction::Right),
    ];
    for (i, (x, expected)) in cases.into_iter().enumerate() {
        let pipeline = Pipeline::default();
        let out = pipeline.process(
            &detection("bottle", 0.75, x),
            Timestamp::from_millis(i as u64),
        );
        let text = out.status.expect("status").display_text;
        assert!(
            text.contains(&format!("on your {}", expected)),
            "x={x}: {text}"
        );
    }
}

#[test]
fn custom_threshold_and_cooldowns_from_config() {
    let mut cfg = AssistConfig::default();
    cfg.confidence_threshold = 0.5;
    cfg.gate.per_label_cooldown = Duration::from_millis(1_000);
    cfg.gate.global_min_spacing = Duration::from_millis(100);
    let pipeline = Pipeline::from_config(&cfg);
    let at = Timestamp::from_millis;

    let out = pipeline.process(&detection("cup", 0.55, 320.0), at(0));
    let alert = out.alert.expect("passes the lowered threshold");
    assert_eq!(alert.haptic_duration_ms, 240);
    assert!(pipeline.process(&detection("cup", 0.55, 320.0), at(1_001)).alert.is_some());
}

#[test]
fn dispatched_stream_matches_expected_alerts() {
    let sink = Arc::new(RecordingSink::new(true));
    let dispatcher = Dispatcher::new(
        sink.clone(),
        sink.clone(),
        sink.clone(),
        SpeechSettings::default(),
    );
    let pipeline = Pipeline::default();
    let clock = ManualClock::new(Timestamp::from_millis(10_000));

    let frames = [
        detection("Person", 0.80, 50.0),
        detection("Person", 0.82, 60.0),
        detection("Wall", 0.99, 320.0),
        detection("Cup", 0.90, 600.0),
    ];
    for frame in &frames {
        dispatcher.dispatch(&pipeline.process(frame, clock.now()));
        clock.advance(Duration::from_millis(1_000));
    }

    assert_eq!(
        sink.records(),
        vec![
            SinkRecord::Display("person detected on your left (80%)".to_string()),
            SinkRecord::Speech {
                text: "There is a person on your left".to_string(),
                interrupted: None,
            },
            SinkRecord::Pulse(Duration::from_millis(240)),
            SinkRecord::Display("person detected on your left (82%)".to_string()),
            SinkRecord::Display("cup detected on your right (90%)".to_string()),
            SinkRecord::Speech {
                text: "There is a cup on your right".to_string(),
                interrupted: Some("There is a person on your left".to_string()),
            },
            SinkRecord::Pulse(Duration::from_millis(140)),
        ]
    );
}
