//! End-to-end scenarios through the public API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pad_bridge::aim::{AimAssistBlender, AimTarget};
use pad_bridge::config::KernelConfig;
use pad_bridge::controller::{Axis, Button, RawSample, SampleProvider};
use pad_bridge::error::Result;
use pad_bridge::kernel::spawn_kernel;
use pad_bridge::output::{spawn_dispatcher, EmitFailures, OutputEvent, OutputSink};
use pad_bridge::poller::{InputPoller, SessionContext};
use pad_bridge::profile::{
    profile_channel, AimAssistSettings, AxisConfig, ButtonMapping, Profile, ProfileHandle, ResponseCurve,
};
use pad_bridge::shaping::shape;

/// Provider whose sample the test changes while the kernel runs.
#[derive(Clone, Default)]
struct ScriptedPad(Arc<Mutex<RawSample>>);

impl ScriptedPad {
    fn set(&self, sample: RawSample) {
        *self.0.lock().unwrap() = sample;
    }
}

impl SampleProvider for ScriptedPad {
    fn sample(&mut self) -> RawSample {
        self.0.lock().unwrap().clone()
    }
}

/// Sink that keeps everything it is given.
#[derive(Clone, Default)]
struct CollectingSink(Arc<Mutex<Vec<OutputEvent>>>);

#[async_trait]
impl OutputSink for CollectingSink {
    async fn emit(&mut self, event: &OutputEvent) -> Result<()> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }
}

fn key(code: &str, down: bool) -> OutputEvent {
    OutputEvent::Key {
        code: Arc::from(code),
        down,
    }
}

fn held(button: Button) -> RawSample {
    RawSample::neutral().with_button(button, true)
}

fn buttons_only(mappings: Vec<ButtonMapping>) -> Profile {
    let mut profile = Profile {
        buttons: mappings.into_iter().collect(),
        ..Profile::default()
    };
    profile.mouse.enabled = false;
    profile
}

fn session(profile: Profile) -> (ProfileHandle, SessionContext, InputPoller) {
    let rate = profile.polling_rate;
    let (handle, source) = profile_channel(profile);
    (handle, SessionContext::new(source, EmitFailures::default()), InputPoller::new(rate))
}

fn turbo_circle() -> ButtonMapping {
    ButtonMapping {
        turbo: true,
        turbo_rate_hz: 10.0,
        ..ButtonMapping::key(Button::Circle, "KeyC")
    }
}

// ==================== Shaping Scenarios ====================

#[test]
fn test_deadzone_scenario() {
    let stick = AxisConfig {
        deadzone_inner: 0.1,
        ..AxisConfig::identity()
    };
    let mut profile = Profile::default();
    profile.axes.left_stick_x = stick;
    profile.axes.left_stick_y = stick;
    let (_handle, mut ctx, mut poller) = session(profile);

    let inside = RawSample::neutral().with_axis(Axis::LeftStickX, 0.05);
    assert_eq!(poller.process(&mut ctx, &inside, None).snapshot.left_stick, (0.0, 0.0));

    let outside = RawSample::neutral().with_axis(Axis::LeftStickX, 0.5);
    let (x, y) = poller.process(&mut ctx, &outside, None).snapshot.left_stick;
    assert!((x - 0.444).abs() < 0.001, "x = {}", x);
    assert_eq!(y, 0.0);
}

#[test]
fn test_deadzone_is_monotonic() {
    let cfg = AxisConfig {
        deadzone_inner: 0.15,
        deadzone_outer: 0.95,
        ..AxisConfig::identity()
    };
    let mut last = 0.0;
    for step in 0..=100 {
        let (x, _) = shape(step as f32 / 100.0, 0.0, &cfg, &cfg);
        assert!(x >= last, "output fell at input {}", step);
        last = x;
    }
    assert_eq!(last, 1.0);
}

#[test]
fn test_curves_preserve_sign() {
    let curves = [
        ResponseCurve::Linear,
        ResponseCurve::Exponential { exponent: 2.5 },
        ResponseCurve::SCurve,
        ResponseCurve::Instant,
    ];
    for curve in curves {
        let cfg = AxisConfig {
            deadzone_inner: 0.05,
            curve,
            ..AxisConfig::identity()
        };
        for raw in [0.2_f32, 0.5, 0.9] {
            let (pos, _) = shape(raw, 0.0, &cfg, &cfg);
            let (neg, _) = shape(-raw, 0.0, &cfg, &cfg);
            assert!(pos > 0.0, "{:?} at {}", curve, raw);
            assert_eq!(neg, -pos, "{:?} at {}", curve, raw);
        }
    }
}

// ==================== Latch Scenarios ====================

#[test]
fn test_sticky_round_trip_scenario() {
    let (_handle, mut ctx, mut poller) = session(buttons_only(vec![ButtonMapping {
        sticky: true,
        ..ButtonMapping::key(Button::Triangle, "KeyF")
    }]));

    let pressed: Vec<bool> = [held(Button::Triangle), RawSample::neutral(), held(Button::Triangle)]
        .iter()
        .map(|sample| poller.process(&mut ctx, sample, None).snapshot.is_pressed(Button::Triangle))
        .collect();
    assert_eq!(pressed, vec![true, true, false]);
}

#[test]
fn test_turbo_scenario_ungated() {
    let (_handle, mut ctx, mut poller) = session(buttons_only(vec![turbo_circle()]));

    let presses = (0..500)
        .flat_map(|_| poller.process(&mut ctx, &held(Button::Circle), None).batch.events)
        .filter(|e| *e == key("KeyC", true))
        .count();
    assert!((4..=6).contains(&presses), "{} pulses", presses);
}

#[tokio::test(start_paused = true)]
async fn test_turbo_scenario_through_kernel() {
    let pad = ScriptedPad::default();
    pad.set(RawSample::neutral());
    let sink = CollectingSink::default();
    let failures = EmitFailures::default();
    let (kernel, batches) = spawn_kernel(
        pad.clone(),
        buttons_only(vec![turbo_circle()]),
        &KernelConfig::default(),
        failures.clone(),
    );
    let dispatcher = spawn_dispatcher(batches, sink.clone(), failures.clone());

    tokio::time::sleep(Duration::from_millis(10)).await;
    pad.set(held(Button::Circle));
    tokio::time::sleep(Duration::from_millis(500)).await;

    kernel.shutdown().await;
    dispatcher.await.unwrap();

    let events = sink.0.lock().unwrap().clone();
    let presses = events.iter().filter(|e| **e == key("KeyC", true)).count();
    assert!((4..=6).contains(&presses), "{} pulses", presses);
    assert_eq!(failures.count(), 0);
}

#[test]
fn test_burst_retap_scenario() {
    // 500 Hz pulses at the default 1000 Hz poll give one tick per half cycle
    let (_handle, mut ctx, mut poller) = session(buttons_only(vec![ButtonMapping {
        burst: true,
        burst_count: 1,
        turbo_rate_hz: 500.0,
        ..ButtonMapping::key(Button::R1, "KeyE")
    }]));

    let taps = [held(Button::R1), RawSample::neutral(), held(Button::R1), RawSample::neutral(), RawSample::neutral()];
    let events: Vec<OutputEvent> = taps
        .iter()
        .flat_map(|sample| poller.process(&mut ctx, sample, None).batch.events)
        .collect();
    assert_eq!(
        events,
        vec![key("KeyE", true), key("KeyE", false), key("KeyE", true), key("KeyE", false)]
    );
}

// ==================== Shared Output Scenarios ====================

#[test]
fn test_two_buttons_one_key_scenario() {
    let (_handle, mut ctx, mut poller) = session(buttons_only(vec![
        ButtonMapping::key(Button::Cross, "Space"),
        ButtonMapping::key(Button::L1, "Space"),
    ]));

    let steps = [
        held(Button::Cross),
        held(Button::Cross).with_button(Button::L1, true),
        held(Button::L1),
        RawSample::neutral(),
    ];
    let batches: Vec<Vec<OutputEvent>> = steps
        .iter()
        .map(|sample| poller.process(&mut ctx, sample, None).batch.events)
        .collect();
    assert_eq!(batches, vec![vec![key("Space", true)], vec![], vec![], vec![key("Space", false)]]);
}

// ==================== Profile Swap Scenarios ====================

#[test]
fn test_profile_swap_scenario() {
    let (handle, mut ctx, mut poller) = session(buttons_only(vec![
        ButtonMapping {
            sticky: true,
            ..ButtonMapping::key(Button::Cross, "Space")
        },
        ButtonMapping::key(Button::Square, "KeyR"),
    ]));

    let engage = held(Button::Cross).with_button(Button::Square, true);
    poller.process(&mut ctx, &engage, None);
    assert!(ctx.outputs().is_held(Button::Square));

    handle.replace(buttons_only(vec![ButtonMapping {
        sticky: true,
        ..ButtonMapping::key(Button::Cross, "Space")
    }]));
    assert!(ctx.refresh_profile());

    // Square is gone from the new profile; Cross keeps its sticky latch
    let report = poller.process(&mut ctx, &held(Button::Square), None);
    assert_eq!(report.batch.events, vec![key("KeyR", false)]);
    assert!(report.snapshot.is_pressed(Button::Cross));
    assert!(report.snapshot.latched.contains(Button::Cross));
    assert!(!ctx.outputs().is_held(Button::Square));
}

// ==================== Aim Assist Scenarios ====================

#[test]
fn test_blend_without_target_is_noop() {
    let blender = AimAssistBlender::new();
    let settings = AimAssistSettings {
        snap_to_target: true,
        pull_strength: 1.0,
        ..AimAssistSettings::default()
    };
    for (x, y) in [(0.0, 0.0), (0.7, -0.2), (-1.0, 1.0), (0.05, 0.9)] {
        assert_eq!(blender.blend(x, y, None, &settings), (x, y));
    }
}

#[test]
fn test_aim_assist_leaves_left_stick_alone() {
    let (_handle, mut ctx, mut poller) = session(Profile::default());
    let sample = RawSample::neutral()
        .with_axis(Axis::LeftStickX, 0.6)
        .with_axis(Axis::RightStickX, 0.6);

    let without = poller.process(&mut ctx, &sample, None).snapshot;
    let with = poller.process(&mut ctx, &sample, AimTarget::new(0.9, 0.5)).snapshot;
    assert_eq!(without.left_stick, with.left_stick);
    assert!(with.right_stick.0 < without.right_stick.0);
}

// ==================== Disconnect Scenarios ====================

#[test]
fn test_disconnect_and_recover_scenario() {
    let (_handle, mut ctx, mut poller) = session(buttons_only(vec![ButtonMapping::key(Button::L1, "KeyQ")]));

    assert_eq!(poller.process(&mut ctx, &held(Button::L1), None).batch.events, vec![key("KeyQ", true)]);

    let gone = poller.process(&mut ctx, &RawSample::disconnected(), None);
    assert_eq!(gone.batch.events, vec![key("KeyQ", false)]);
    assert!(poller.process(&mut ctx, &RawSample::disconnected(), None).batch.is_empty());

    let back = poller.process(&mut ctx, &RawSample::neutral(), None);
    assert!(back.batch.is_empty());
    assert!(back.snapshot.connected);
    assert_eq!(back.snapshot.telemetry.disconnects, 1);
}
