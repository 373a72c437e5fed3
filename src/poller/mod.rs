//! # Input Poller
//!
//! One pass of the pipeline per admitted tick.
//!
//! ## Stage Order
//!
//! | # | Stage | Component |
//! |---|-------|-----------|
//! | 1 | Gate on the profile polling rate | [`PollingClock`] |
//! | 2 | Pull one raw sample | [`SampleProvider`] |
//! | 3 | Deadzone, curve and smoothing for both sticks | [`ResponseShaper`] |
//! | 4 | Tremor filter on the right stick | [`Stabilizer`] |
//! | 5 | Friction and magnetism on the right stick | [`AimAssistBlender`] |
//! | 6 | Virtual button state | [`crate::latch::LatchController`] |
//! | 7 | Diff against the previous tick, mouse movement | [`SessionContext`] |
//! | 8 | Telemetry and snapshot | [`StateSnapshot`] |
//!
//! A disconnected sample stops after stage 2: held outputs are released once
//! on the transition and nothing else is emitted until the device returns.

mod clock;
mod session;

pub use clock::PollingClock;
pub use session::{OutputState, ResolvedButton, ResolvedProfile, SessionContext};

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::aim::{AimAssistBlender, AimTarget, TargetSource};
use crate::controller::{Axis, Button, ButtonSet, RawSample, SampleProvider};
use crate::latch::LatchPhase;
use crate::output::EventBatch;
use crate::profile::PollingRate;
use crate::shaping::{ResponseShaper, Stabilizer};
use crate::telemetry::TelemetrySnapshot;

/// Read-only view of the pipeline after a tick, for UI and logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub tick: u64,
    pub profile: Arc<str>,
    pub polling_rate_hz: u32,
    pub connected: bool,
    pub device_id: Option<Arc<str>>,
    pub left_stick: (f32, f32),
    /// After stabilization and aim assist, before clamping.
    pub right_stick: (f32, f32),
    pub target: Option<AimTarget>,
    pub virtual_buttons: ButtonSet,
    /// Buttons with a sticky, toggle, turbo or burst latch running.
    pub latched: ButtonSet,
    pub telemetry: TelemetrySnapshot,
}

impl StateSnapshot {
    /// Snapshot of a session that has not ticked yet.
    #[must_use]
    pub fn initial(ctx: &SessionContext) -> Self {
        Self::capture(ctx, None, (0.0, 0.0), (0.0, 0.0), None)
    }

    fn capture(
        ctx: &SessionContext,
        device_id: Option<Arc<str>>,
        left_stick: (f32, f32),
        right_stick: (f32, f32),
        target: Option<AimTarget>,
    ) -> Self {
        let latched = ctx
            .latches()
            .phases()
            .filter(|(_, phase)| !matches!(phase, LatchPhase::Idle | LatchPhase::Held))
            .map(|(button, _)| button)
            .collect();
        let profile = ctx.profile();
        Self {
            tick: ctx.telemetry().total_ticks(),
            profile: Arc::from(profile.name.as_str()),
            polling_rate_hz: profile.polling_rate.hz(),
            connected: ctx.is_connected(),
            device_id,
            left_stick,
            right_stick,
            target,
            virtual_buttons: ctx.virtual_buttons(),
            latched,
            telemetry: ctx.telemetry().snapshot(),
        }
    }

    #[must_use]
    pub fn is_pressed(&self, button: Button) -> bool {
        self.virtual_buttons.contains(button)
    }
}

/// Result of one processed tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub batch: EventBatch,
    pub snapshot: StateSnapshot,
}

/// The per-tick scheduler.
#[derive(Debug, Clone)]
pub struct InputPoller {
    clock: PollingClock,
    left: ResponseShaper,
    right: ResponseShaper,
    stabilizer: Stabilizer,
    blender: AimAssistBlender,
}

impl InputPoller {
    #[must_use]
    pub fn new(rate: PollingRate) -> Self {
        Self {
            clock: PollingClock::new(rate),
            left: ResponseShaper::new(),
            right: ResponseShaper::new(),
            stabilizer: Stabilizer::default(),
            blender: AimAssistBlender::new(),
        }
    }

    #[must_use]
    pub fn clock(&self) -> &PollingClock {
        &self.clock
    }

    /// Drops filter history and lets the next tick through immediately.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.left.reset();
        self.right.reset();
        self.stabilizer.reset();
    }

    /// Runs one gated tick at `now`.
    ///
    /// Picks up a newly published profile first, so the gate uses the
    /// current polling rate. Returns `None` when the gate skips the tick.
    pub fn poll(
        &mut self,
        ctx: &mut SessionContext,
        provider: &mut dyn SampleProvider,
        targets: &TargetSource,
        now: Instant,
    ) -> Option<TickReport> {
        ctx.refresh_profile();
        self.clock.set_rate(ctx.profile().polling_rate);
        if !self.clock.should_tick(now) {
            return None;
        }

        let sample = provider.sample();
        let target = targets.latest(now, ctx.resolved().aim_assist().target_ttl());
        Some(self.process(ctx, &sample, target))
    }

    /// Runs the pipeline stages on one sample, ungated.
    pub fn process(
        &mut self,
        ctx: &mut SessionContext,
        sample: &RawSample,
        target: Option<AimTarget>,
    ) -> TickReport {
        let tick = ctx.telemetry_mut().record_tick();
        let mut events = Vec::new();

        if !ctx.update_connection(sample.connected, &mut events) {
            self.left.reset();
            self.right.reset();
            self.stabilizer.reset();
            return TickReport {
                batch: EventBatch { tick, events },
                snapshot: StateSnapshot::capture(ctx, None, (0.0, 0.0), (0.0, 0.0), None),
            };
        }

        let resolved = ctx.resolved();
        let left = self.left.shape(
            sample.axis(Axis::LeftStickX),
            sample.axis(Axis::LeftStickY),
            resolved.axis(Axis::LeftStickX),
            resolved.axis(Axis::LeftStickY),
        );
        let (rx, ry) = self.right.shape(
            sample.axis(Axis::RightStickX),
            sample.axis(Axis::RightStickY),
            resolved.axis(Axis::RightStickX),
            resolved.axis(Axis::RightStickY),
        );

        let assist = *resolved.aim_assist();
        let (sx, sy) = self.stabilizer.apply(rx, ry, assist.stabilization_strength);
        let right = self.blender.blend(sx, sy, target, &assist);

        let physical = ctx.physical_buttons(sample);
        ctx.resolve_latches(physical);
        ctx.diff_buttons(&mut events);
        ctx.emit_mouse(right.0, right.1, &mut events);

        TickReport {
            batch: EventBatch { tick, events },
            snapshot: StateSnapshot::capture(ctx, sample.device_id.clone(), left, right, target),
        }
    }
}
